//! Coinranking market data provider implementation

use super::{build_client, parse_json, read_body, string_or_number};
use crate::{
    constants::{COINRANKING_API_KEY_HEADER, COINRANKING_API_URL, COIN_LIST_LIMIT},
    error::ApiError,
    money::{Currency, Percentage, Price},
    provider::MarketDataProvider,
    types::{
        ChartPeriod, ChartPoint, Coin, CoinChart, CoinDetail, CoinSort, FavouriteCoinId,
        GlobalMarketOverview, SearchCoin,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Coinranking response envelope: `{"status": "success", "data": {...}}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: String,
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinsData {
    coins: Vec<CoinDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinDto {
    uuid: String,
    symbol: String,
    name: String,
    icon_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    price: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    change: Option<String>,
    #[serde(default)]
    sparkline: Vec<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct CoinDetailData {
    coin: CoinDetailDto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CoinDetailDto {
    uuid: String,
    symbol: String,
    name: String,
    icon_url: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    price: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    change: Option<String>,
    rank: Option<u32>,
    #[serde(default, deserialize_with = "string_or_number")]
    market_cap: Option<String>,
    #[serde(rename = "24hVolume", default, deserialize_with = "string_or_number")]
    volume_24h: Option<String>,
    supply: Option<SupplyDto>,
    all_time_high: Option<AllTimeHighDto>,
    listed_at: Option<i64>,
    description: Option<String>,
    website_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SupplyDto {
    #[serde(default, deserialize_with = "string_or_number")]
    circulating: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AllTimeHighDto {
    #[serde(default, deserialize_with = "string_or_number")]
    price: Option<String>,
    timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HistoryData {
    history: Vec<HistoryPointDto>,
}

#[derive(Debug, Deserialize)]
struct HistoryPointDto {
    #[serde(default, deserialize_with = "string_or_number")]
    price: Option<String>,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsData {
    #[serde(default)]
    total_coins: u64,
    #[serde(default)]
    total_markets: u64,
    #[serde(default)]
    total_exchanges: u64,
    #[serde(default, deserialize_with = "string_or_number")]
    total_market_cap: Option<String>,
    #[serde(rename = "total24hVolume", default, deserialize_with = "string_or_number")]
    total_volume_24h: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    btc_dominance: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    coins: Vec<SearchCoinDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchCoinDto {
    uuid: String,
    name: String,
    symbol: String,
    icon_url: Option<String>,
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

fn map_coin(dto: CoinDto, currency: Currency) -> Coin {
    Coin {
        id: dto.uuid,
        name: dto.name,
        symbol: dto.symbol,
        image_url: dto.icon_url.unwrap_or_default(),
        current_price: Price::parse(dto.price.as_deref(), currency),
        price_change_percentage_24h: Percentage::parse(dto.change.as_deref()),
        sparkline: dto
            .sparkline
            .iter()
            .flatten()
            .map(|p| Price::parse(Some(p.as_str()), currency))
            .collect(),
    }
}

fn map_coin_detail(dto: CoinDetailDto, currency: Currency) -> CoinDetail {
    let (ath_price, ath_timestamp) = match dto.all_time_high {
        Some(ath) => (ath.price, ath.timestamp),
        None => (None, None),
    };

    CoinDetail {
        id: dto.uuid,
        name: dto.name,
        symbol: dto.symbol,
        image_url: dto.icon_url.unwrap_or_default(),
        current_price: Price::parse(dto.price.as_deref(), currency),
        price_change_percentage_24h: Percentage::parse(dto.change.as_deref()),
        market_cap_rank: dto.rank,
        market_cap: Price::parse(dto.market_cap.as_deref(), currency),
        volume_24h: Price::parse(dto.volume_24h.as_deref(), currency),
        circulating_supply: crate::money::parse_amount(
            dto.supply.and_then(|s| s.circulating).as_deref(),
        ),
        all_time_high: Price::parse(ath_price.as_deref(), currency),
        all_time_high_date: ath_timestamp.and_then(timestamp),
        listed_date: dto.listed_at.and_then(timestamp).map(|t| t.date_naive()),
        description: dto.description.filter(|d| !d.trim().is_empty()),
        website_url: dto.website_url.filter(|u| !u.trim().is_empty()),
    }
}

/// History arrives newest first; samples without a price are dropped
fn map_history(dto: HistoryData, currency: Currency) -> CoinChart {
    let points = dto
        .history
        .into_iter()
        .rev()
        .filter_map(|point| {
            let price = point.price?;
            Some(ChartPoint {
                timestamp: timestamp(point.timestamp)?,
                price: Price::parse(Some(price.as_str()), currency),
            })
        })
        .collect();

    CoinChart::from_points(points, currency)
}

fn map_stats(dto: StatsData, currency: Currency) -> GlobalMarketOverview {
    GlobalMarketOverview {
        total_market_cap: Price::parse(dto.total_market_cap.as_deref(), currency),
        total_volume_24h: Price::parse(dto.total_volume_24h.as_deref(), currency),
        btc_dominance: Percentage::parse(dto.btc_dominance.as_deref()),
        number_of_coins: dto.total_coins,
        number_of_markets: dto.total_markets,
        number_of_exchanges: Some(dto.total_exchanges),
    }
}

fn map_search_coin(dto: SearchCoinDto) -> SearchCoin {
    SearchCoin {
        id: dto.uuid,
        name: dto.name,
        symbol: dto.symbol,
        image_url: dto.icon_url.unwrap_or_default(),
    }
}

/// Query string for a market list request
fn coins_query(currency: Currency, sort: CoinSort) -> Vec<(&'static str, String)> {
    let (order_by, order_direction) = sort.coinranking_order();
    vec![
        ("referenceCurrencyUuid", currency.coinranking_uuid().to_string()),
        ("orderBy", order_by.to_string()),
        ("orderDirection", order_direction.to_string()),
        ("timePeriod", ChartPeriod::Day.coinranking_value().to_string()),
        ("limit", COIN_LIST_LIMIT.to_string()),
    ]
}

/// Query for one page of coins looked up by uuid
///
/// `limit` matches the number of uuids so none fall off the default page.
fn coins_by_ids_query(ids: &[FavouriteCoinId], currency: Currency) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("referenceCurrencyUuid", currency.coinranking_uuid().to_string()),
        ("timePeriod", ChartPeriod::Day.coinranking_value().to_string()),
        ("limit", ids.len().to_string()),
    ];
    query.extend(ids.iter().map(|id| ("uuids[]", id.as_str().to_string())));
    query
}

/// Coinranking market data provider
pub struct CoinrankingProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinrankingProvider {
    /// Creates a new Coinranking provider
    pub fn new(api_key: Option<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_client()?,
            base_url: COINRANKING_API_URL.to_string(),
            api_key,
        })
    }

    /// Points the provider at another host, e.g. a proxy
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Issues a GET and unwraps the response envelope
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Requesting Coinranking");

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.api_key {
            request = request.header(COINRANKING_API_KEY_HEADER, key);
        }

        let response = request.send().await.map_err(ApiError::NetworkError)?;
        let body = read_body(response, path).await?;
        unwrap_envelope(parse_json(&body, self.provider_name())?)
    }
}

fn unwrap_envelope<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    if envelope.status != "success" {
        return Err(ApiError::Status(
            envelope
                .message
                .unwrap_or_else(|| format!("Coinranking returned status {}", envelope.status)),
        ));
    }

    envelope
        .data
        .ok_or_else(|| ApiError::invalid_response("Coinranking response has no data"))
}

#[async_trait]
impl MarketDataProvider for CoinrankingProvider {
    async fn fetch_coins(
        &self,
        currency: Currency,
        sort: CoinSort,
    ) -> Result<Vec<Coin>, ApiError> {
        let data: CoinsData = self.get("/coins", &coins_query(currency, sort)).await?;

        tracing::debug!(
            count = data.coins.len(),
            sort = ?sort,
            "Fetched coins from Coinranking"
        );

        Ok(data
            .coins
            .into_iter()
            .map(|dto| map_coin(dto, currency))
            .collect())
    }

    async fn fetch_coins_by_ids(
        &self,
        ids: &[FavouriteCoinId],
        currency: Currency,
    ) -> Result<Vec<Coin>, ApiError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut coins = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(COIN_LIST_LIMIT as usize) {
            let data: CoinsData = self
                .get("/coins", &coins_by_ids_query(chunk, currency))
                .await?;
            coins.extend(data.coins.into_iter().map(|dto| map_coin(dto, currency)));
        }

        Ok(coins)
    }

    async fn fetch_coin_detail(
        &self,
        id: &str,
        currency: Currency,
    ) -> Result<CoinDetail, ApiError> {
        let query = [
            ("referenceCurrencyUuid", currency.coinranking_uuid().to_string()),
            ("timePeriod", ChartPeriod::Day.coinranking_value().to_string()),
        ];
        let data: CoinDetailData = self.get(&format!("/coin/{}", id), &query).await?;

        Ok(map_coin_detail(data.coin, currency))
    }

    async fn fetch_coin_chart(
        &self,
        id: &str,
        period: ChartPeriod,
        currency: Currency,
    ) -> Result<CoinChart, ApiError> {
        let query = [
            ("referenceCurrencyUuid", currency.coinranking_uuid().to_string()),
            ("timePeriod", period.coinranking_value().to_string()),
        ];
        let data: HistoryData = self.get(&format!("/coin/{}/history", id), &query).await?;

        Ok(map_history(data, currency))
    }

    async fn fetch_market_overview(
        &self,
        currency: Currency,
    ) -> Result<GlobalMarketOverview, ApiError> {
        let query = [("referenceCurrencyUuid", currency.coinranking_uuid().to_string())];
        let data: StatsData = self.get("/stats", &query).await?;

        Ok(map_stats(data, currency))
    }

    async fn search_coins(&self, query: &str) -> Result<Vec<SearchCoin>, ApiError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let data: SearchData = self
            .get("/search-suggestions", &[("query", query.to_string())])
            .await?;

        Ok(data.coins.into_iter().map(map_search_coin).collect())
    }

    fn provider_name(&self) -> &'static str {
        "coinranking"
    }
}
