//! Market data provider implementations

pub mod coingecko;
pub mod coinranking;

pub use coingecko::CoinGeckoProvider;
pub use coinranking::CoinrankingProvider;

use crate::{
    constants::{REQUEST_TIMEOUT_SECS, USER_AGENT},
    error::ApiError,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Deserializer};
use std::time::Duration;

/// Builds the HTTP client shared by all requests of one provider
pub(crate) fn build_client() -> Result<Client, ApiError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(ApiError::NetworkError)
}

/// Maps error statuses and returns the response body
///
/// `resource` names what was requested, for `NotFound` errors.
pub(crate) async fn read_body(response: Response, resource: &str) -> Result<String, ApiError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimitExceeded);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::not_found(resource));
    }

    if !status.is_success() {
        return Err(ApiError::Status(format!(
            "HTTP {}: {}",
            status,
            response.text().await.unwrap_or_default()
        )));
    }

    response.text().await.map_err(ApiError::NetworkError)
}

/// Parses a JSON body, keeping the body in the error for diagnosis
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    body: &str,
    provider: &str,
) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| {
        ApiError::invalid_response(format!(
            "Failed to parse {} response: {}. Response: {}",
            provider, e, body
        ))
    })
}

/// Accepts a JSON string, number or null as an optional string
///
/// Upstream APIs are inconsistent about quoting numeric fields.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
