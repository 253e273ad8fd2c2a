//! Domain records for the CoinWatch SDK

use crate::money::{Percentage, Price};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A coin in a market list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coin {
    /// Provider-specific coin id (Coinranking uuid or CoinGecko id)
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image_url: String,
    pub current_price: Price,
    pub price_change_percentage_24h: Percentage,
    /// Recent prices in chronological order, for sparklines
    pub sparkline: Vec<Price>,
}

/// Full market data for a single coin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinDetail {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image_url: String,
    pub current_price: Price,
    pub price_change_percentage_24h: Percentage,
    pub market_cap_rank: Option<u32>,
    pub market_cap: Price,
    pub volume_24h: Price,
    pub circulating_supply: Decimal,
    pub all_time_high: Price,
    pub all_time_high_date: Option<DateTime<Utc>>,
    pub listed_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub website_url: Option<String>,
}

/// A single sample in a price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub price: Price,
}

/// Price history for a coin over a [`ChartPeriod`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinChart {
    /// Samples ordered oldest to newest
    pub prices: Vec<ChartPoint>,
    pub min_price: Price,
    pub max_price: Price,
    pub period_price_change_percentage: Percentage,
}

/// Time window for historical price queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartPeriod {
    #[default]
    Day,
    Week,
    Month,
    ThreeMonths,
    Year,
    FiveYears,
}

impl ChartPeriod {
    /// Coinranking `timePeriod` value
    pub fn coinranking_value(&self) -> &'static str {
        match self {
            ChartPeriod::Day => "24h",
            ChartPeriod::Week => "7d",
            ChartPeriod::Month => "30d",
            ChartPeriod::ThreeMonths => "3m",
            ChartPeriod::Year => "1y",
            ChartPeriod::FiveYears => "5y",
        }
    }

    /// CoinGecko `days` value
    pub fn days(&self) -> u32 {
        match self {
            ChartPeriod::Day => 1,
            ChartPeriod::Week => 7,
            ChartPeriod::Month => 30,
            ChartPeriod::ThreeMonths => 90,
            ChartPeriod::Year => 365,
            ChartPeriod::FiveYears => 1825,
        }
    }

    /// Short label shown on period selectors
    pub fn label(&self) -> &'static str {
        match self {
            ChartPeriod::Day => "1D",
            ChartPeriod::Week => "1W",
            ChartPeriod::Month => "1M",
            ChartPeriod::ThreeMonths => "3M",
            ChartPeriod::Year => "1Y",
            ChartPeriod::FiveYears => "5Y",
        }
    }

    /// Get all chart periods
    pub fn all() -> &'static [ChartPeriod] {
        &[
            ChartPeriod::Day,
            ChartPeriod::Week,
            ChartPeriod::Month,
            ChartPeriod::ThreeMonths,
            ChartPeriod::Year,
            ChartPeriod::FiveYears,
        ]
    }
}

/// A coin returned by a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCoin {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub image_url: String,
}

/// Market-wide statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalMarketOverview {
    pub total_market_cap: Price,
    pub total_volume_24h: Price,
    pub btc_dominance: Percentage,
    pub number_of_coins: u64,
    pub number_of_markets: u64,
    /// Not every provider reports exchange counts
    pub number_of_exchanges: Option<u64>,
}

/// Id of a coin the user marked as favourite
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavouriteCoinId(pub String);

impl FavouriteCoinId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FavouriteCoinId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A favourite coin with its live market data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavouriteCoin {
    pub id: FavouriteCoinId,
    pub coin: Coin,
}

impl From<Coin> for FavouriteCoin {
    fn from(coin: Coin) -> Self {
        Self {
            id: FavouriteCoinId::new(coin.id.clone()),
            coin,
        }
    }
}

/// Ordering applied to market lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoinSort {
    #[default]
    MarketCap,
    /// Highest 24h trading volume first
    Popular,
    Gainers,
    Losers,
    Newest,
}

impl CoinSort {
    /// Coinranking `orderBy` and `orderDirection` values
    pub fn coinranking_order(&self) -> (&'static str, &'static str) {
        match self {
            CoinSort::MarketCap => ("marketCap", "desc"),
            CoinSort::Popular => ("24hVolume", "desc"),
            CoinSort::Gainers => ("change", "desc"),
            CoinSort::Losers => ("change", "asc"),
            CoinSort::Newest => ("listedAt", "desc"),
        }
    }

    /// Get all sort modes
    pub fn all() -> &'static [CoinSort] {
        &[
            CoinSort::MarketCap,
            CoinSort::Popular,
            CoinSort::Gainers,
            CoinSort::Losers,
            CoinSort::Newest,
        ]
    }
}
