//! Provider abstraction for fetching coin market data from external APIs

use crate::{
    error::ApiError,
    money::Currency,
    types::{
        ChartPeriod, Coin, CoinChart, CoinDetail, CoinSort, FavouriteCoinId,
        GlobalMarketOverview, SearchCoin,
    },
};
use async_trait::async_trait;

/// Trait for market data providers
///
/// Implementations call a REST API (Coinranking, CoinGecko, ...) and map its
/// wire format into domain records. They never touch local state.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetches a page of coins ordered by `sort`, priced in `currency`
    async fn fetch_coins(&self, currency: Currency, sort: CoinSort)
        -> Result<Vec<Coin>, ApiError>;

    /// Fetches the listed coins by id, priced in `currency`
    ///
    /// Ids unknown to the provider are silently skipped.
    async fn fetch_coins_by_ids(
        &self,
        ids: &[FavouriteCoinId],
        currency: Currency,
    ) -> Result<Vec<Coin>, ApiError>;

    /// Fetches full market data for one coin
    async fn fetch_coin_detail(&self, id: &str, currency: Currency)
        -> Result<CoinDetail, ApiError>;

    /// Fetches price history for one coin over `period`
    ///
    /// The returned chart is ordered oldest to newest.
    async fn fetch_coin_chart(
        &self,
        id: &str,
        period: ChartPeriod,
        currency: Currency,
    ) -> Result<CoinChart, ApiError>;

    /// Fetches market-wide statistics
    async fn fetch_market_overview(
        &self,
        currency: Currency,
    ) -> Result<GlobalMarketOverview, ApiError>;

    /// Searches coins by name or symbol
    async fn search_coins(&self, query: &str) -> Result<Vec<SearchCoin>, ApiError>;

    /// Returns the name of this provider
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::money::{Percentage, Price};
    use crate::types::ChartPoint;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Builds a coin with a fixed price and change
    pub fn sample_coin(id: &str, price: &str, change: &str) -> Coin {
        Coin {
            id: id.to_string(),
            name: format!("{} coin", id),
            symbol: id.to_uppercase(),
            image_url: format!("https://cdn.example.com/{}.svg", id),
            current_price: Price::parse(Some(price), Currency::USD),
            price_change_percentage_24h: Percentage::parse(Some(change)),
            sparkline: vec![Price::parse(Some(price), Currency::USD)],
        }
    }

    /// Mock provider for testing
    pub struct MockProvider {
        coins: Mutex<Result<Vec<Coin>, String>>,
        details: Mutex<HashMap<String, CoinDetail>>,
        chart: Mutex<Result<Vec<ChartPoint>, String>>,
        overview: Mutex<Option<GlobalMarketOverview>>,
        search_results: Mutex<Vec<SearchCoin>>,
        requests: Mutex<Vec<(Currency, Option<CoinSort>)>>,
        call_count: Mutex<usize>,
    }

    impl Default for MockProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockProvider {
        pub fn new() -> Self {
            Self {
                coins: Mutex::new(Ok(Vec::new())),
                details: Mutex::new(HashMap::new()),
                chart: Mutex::new(Ok(Vec::new())),
                overview: Mutex::new(None),
                search_results: Mutex::new(Vec::new()),
                requests: Mutex::new(Vec::new()),
                call_count: Mutex::new(0),
            }
        }

        pub fn set_coins(&self, coins: Vec<Coin>) {
            *self.coins.lock().unwrap() = Ok(coins);
        }

        pub fn set_coins_error(&self, message: &str) {
            *self.coins.lock().unwrap() = Err(message.to_string());
        }

        pub fn set_detail(&self, detail: CoinDetail) {
            self.details
                .lock()
                .unwrap()
                .insert(detail.id.clone(), detail);
        }

        pub fn set_chart(&self, points: Vec<ChartPoint>) {
            *self.chart.lock().unwrap() = Ok(points);
        }

        pub fn set_chart_error(&self, message: &str) {
            *self.chart.lock().unwrap() = Err(message.to_string());
        }

        pub fn set_overview(&self, overview: GlobalMarketOverview) {
            *self.overview.lock().unwrap() = Some(overview);
        }

        pub fn set_search_results(&self, results: Vec<SearchCoin>) {
            *self.search_results.lock().unwrap() = results;
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        /// Currency and sort of every list request, in call order
        pub fn requests(&self) -> Vec<(Currency, Option<CoinSort>)> {
            self.requests.lock().unwrap().clone()
        }

        fn record(&self, currency: Currency, sort: Option<CoinSort>) {
            *self.call_count.lock().unwrap() += 1;
            self.requests.lock().unwrap().push((currency, sort));
        }
    }

    #[async_trait]
    impl MarketDataProvider for MockProvider {
        async fn fetch_coins(
            &self,
            currency: Currency,
            sort: CoinSort,
        ) -> Result<Vec<Coin>, ApiError> {
            self.record(currency, Some(sort));
            self.coins.lock().unwrap().clone().map_err(ApiError::Status)
        }

        async fn fetch_coins_by_ids(
            &self,
            ids: &[FavouriteCoinId],
            currency: Currency,
        ) -> Result<Vec<Coin>, ApiError> {
            self.record(currency, None);
            let coins = self.coins.lock().unwrap().clone().map_err(ApiError::Status)?;
            Ok(coins
                .into_iter()
                .filter(|c| ids.iter().any(|id| id.as_str() == c.id))
                .collect())
        }

        async fn fetch_coin_detail(
            &self,
            id: &str,
            currency: Currency,
        ) -> Result<CoinDetail, ApiError> {
            self.record(currency, None);
            self.details
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .ok_or_else(|| ApiError::not_found(id))
        }

        async fn fetch_coin_chart(
            &self,
            _id: &str,
            _period: ChartPeriod,
            currency: Currency,
        ) -> Result<CoinChart, ApiError> {
            self.record(currency, None);
            let points = self.chart.lock().unwrap().clone().map_err(ApiError::Status)?;
            Ok(CoinChart::from_points(points, currency))
        }

        async fn fetch_market_overview(
            &self,
            currency: Currency,
        ) -> Result<GlobalMarketOverview, ApiError> {
            self.record(currency, None);
            self.overview
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ApiError::invalid_response("No market stats available"))
        }

        async fn search_coins(&self, _query: &str) -> Result<Vec<SearchCoin>, ApiError> {
            *self.call_count.lock().unwrap() += 1;
            Ok(self.search_results.lock().unwrap().clone())
        }

        fn provider_name(&self) -> &'static str {
            "mock"
        }
    }
}
