//! Runtime configuration for the CoinWatch SDK
//!
//! Only three knobs are exposed, all through environment variables:
//! which provider to use, its API key, and where local state lives.

use crate::{
    constants::{
        API_KEY_ENV, DATABASE_FILE_NAME, DATA_DIR_ENV, DATA_DIR_NAME, PREFERENCES_FILE_NAME,
        PROVIDER_ENV,
    },
    error::ApiError,
    provider::MarketDataProvider,
    providers::{CoinGeckoProvider, CoinrankingProvider},
};
use std::path::PathBuf;
use std::sync::Arc;

/// Market data backends the SDK can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Coinranking,
    CoinGecko,
}

impl ProviderKind {
    /// Parses a provider name, case-insensitively
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "coinranking" => Some(ProviderKind::Coinranking),
            "coingecko" => Some(ProviderKind::CoinGecko),
            _ => None,
        }
    }
}

/// SDK configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            data_dir: default_data_dir(),
        }
    }
}

impl Config {
    /// Reads configuration from the process environment
    ///
    /// `COINWATCH_PROVIDER` selects "coinranking" (default) or "coingecko",
    /// `COINWATCH_API_KEY` is sent with every request when set, and
    /// `COINWATCH_DATA_DIR` overrides the platform data directory.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match lookup(PROVIDER_ENV) {
            Some(name) => ProviderKind::parse(&name).unwrap_or_else(|| {
                tracing::warn!(provider = %name, "Unknown market data provider, using Coinranking");
                ProviderKind::default()
            }),
            None => ProviderKind::default(),
        };

        let api_key = lookup(API_KEY_ENV).filter(|key| !key.trim().is_empty());

        let data_dir = lookup(DATA_DIR_ENV)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        Self {
            provider,
            api_key,
            data_dir,
        }
    }

    /// Location of the coin cache and favourites database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE_NAME)
    }

    /// Location of the preferences file
    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir.join(PREFERENCES_FILE_NAME)
    }

    /// Creates the configured provider
    pub fn build_provider(&self) -> Result<Arc<dyn MarketDataProvider>, ApiError> {
        let provider: Arc<dyn MarketDataProvider> = match self.provider {
            ProviderKind::Coinranking => Arc::new(CoinrankingProvider::new(self.api_key.clone())?),
            ProviderKind::CoinGecko => Arc::new(CoinGeckoProvider::new(self.api_key.clone())?),
        };
        Ok(provider)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}
