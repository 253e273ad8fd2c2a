//! Repository layer: remote fetches and local state behind [`Resource`]

use crate::{
    money::Currency,
    provider::MarketDataProvider,
    resource::Resource,
    store::CoinStore,
    types::{
        ChartPeriod, Coin, CoinChart, CoinDetail, CoinSort, FavouriteCoin, FavouriteCoinId,
        GlobalMarketOverview, SearchCoin,
    },
};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::watch;

pub const ERROR_COINS: &str = "Unable to fetch coins";
pub const ERROR_CACHED_COINS: &str = "Unable to load cached coins";
pub const ERROR_UPDATE_CACHE: &str = "Unable to update cached coins";
pub const ERROR_COIN_DETAIL: &str = "Unable to fetch coin details";
pub const ERROR_COIN_CHART: &str = "Unable to fetch coin chart";
pub const ERROR_MARKET_STATS: &str = "Unable to fetch market stats";
pub const ERROR_SEARCH: &str = "Unable to search coins";
pub const ERROR_FAVOURITES: &str = "Unable to fetch favourite coins";
pub const ERROR_UPDATE_FAVOURITE: &str = "Unable to update favourite coin";

/// Logs the failure and replaces it with a generic message
fn catch<T, E: Display>(result: Result<T, E>, operation: &'static str, message: &str) -> Resource<T> {
    match result {
        Ok(data) => Resource::Success(data),
        Err(e) => {
            tracing::warn!(operation, error = %e, "{}", message);
            Resource::error(message)
        }
    }
}

/// Coin data from a provider, combined with the local store
pub struct CoinRepository {
    provider: Arc<dyn MarketDataProvider>,
    store: Arc<dyn CoinStore>,
}

impl CoinRepository {
    /// Creates a repository over a provider and a local store
    pub fn new(provider: Arc<dyn MarketDataProvider>, store: Arc<dyn CoinStore>) -> Self {
        Self { provider, store }
    }

    /// Returns the name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Fetches the market list in `currency`, ordered by `sort`
    pub async fn get_coins(&self, currency: Currency, sort: CoinSort) -> Resource<Vec<Coin>> {
        catch(
            self.provider.fetch_coins(currency, sort).await,
            "get_coins",
            ERROR_COINS,
        )
    }

    /// Fetches coins and, on success, overwrites the whole local cache
    ///
    /// A failed fetch leaves the cache untouched.
    pub async fn update_cached_coins(
        &self,
        currency: Currency,
        sort: CoinSort,
    ) -> Resource<Vec<Coin>> {
        let coins = match self.get_coins(currency, sort).await {
            Resource::Success(coins) => coins,
            Resource::Error(message) => return Resource::Error(message),
        };

        let written = self.store.replace_cached_coins(coins.clone()).await;
        catch(written, "update_cached_coins", ERROR_UPDATE_CACHE).map(|_| coins)
    }

    /// Reads the locally cached market list
    pub async fn cached_coins(&self) -> Resource<Vec<Coin>> {
        catch(
            self.store.cached_coins().await,
            "cached_coins",
            ERROR_CACHED_COINS,
        )
    }

    /// Subscribes to cached market list snapshots
    pub fn subscribe_cached_coins(&self) -> watch::Receiver<Vec<Coin>> {
        self.store.subscribe_cached_coins()
    }

    /// Fetches detail for one coin
    pub async fn get_coin_detail(&self, id: &str, currency: Currency) -> Resource<CoinDetail> {
        catch(
            self.provider.fetch_coin_detail(id, currency).await,
            "get_coin_detail",
            ERROR_COIN_DETAIL,
        )
    }

    /// Fetches price history for `period` with derived min, max and change
    pub async fn get_coin_chart(
        &self,
        id: &str,
        period: ChartPeriod,
        currency: Currency,
    ) -> Resource<CoinChart> {
        catch(
            self.provider.fetch_coin_chart(id, period, currency).await,
            "get_coin_chart",
            ERROR_COIN_CHART,
        )
    }

    /// Fetches global market statistics
    pub async fn get_market_overview(&self, currency: Currency) -> Resource<GlobalMarketOverview> {
        catch(
            self.provider.fetch_market_overview(currency).await,
            "get_market_overview",
            ERROR_MARKET_STATS,
        )
    }

    /// Searches coins by name or symbol
    pub async fn search_coins(&self, query: &str) -> Resource<Vec<SearchCoin>> {
        catch(
            self.provider.search_coins(query).await,
            "search_coins",
            ERROR_SEARCH,
        )
    }

    /// Fetches live data for every favourite; no favourites means no request
    pub async fn get_favourite_coins(&self, currency: Currency) -> Resource<Vec<FavouriteCoin>> {
        let ids = match catch(
            self.store.favourite_ids().await,
            "get_favourite_coins",
            ERROR_FAVOURITES,
        ) {
            Resource::Success(ids) => ids,
            Resource::Error(message) => return Resource::Error(message),
        };

        if ids.is_empty() {
            return Resource::Success(Vec::new());
        }

        catch(
            self.provider.fetch_coins_by_ids(&ids, currency).await,
            "get_favourite_coins",
            ERROR_FAVOURITES,
        )
        .map(|coins| coins.into_iter().map(FavouriteCoin::from).collect())
    }

    /// Adds or removes `id` from favourites; yields the new membership
    pub async fn toggle_favourite(&self, id: FavouriteCoinId) -> Resource<bool> {
        catch(
            self.store.toggle_favourite(id).await,
            "toggle_favourite",
            ERROR_UPDATE_FAVOURITE,
        )
    }

    /// Whether `id` is a favourite
    pub async fn is_favourite(&self, id: &FavouriteCoinId) -> Resource<bool> {
        catch(
            self.store.is_favourite(id).await,
            "is_favourite",
            ERROR_FAVOURITES,
        )
    }

    /// Subscribes to favourite id snapshots
    pub fn subscribe_favourite_ids(&self) -> watch::Receiver<Vec<FavouriteCoinId>> {
        self.store.subscribe_favourite_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{sample_coin, MockProvider};
    use crate::error::StoreError;
    use crate::store::MemoryCoinStore;
    use async_trait::async_trait;

    /// Store whose writes always fail, reads come from an inner memory store
    struct ReadOnlyStore(MemoryCoinStore);

    #[async_trait]
    impl CoinStore for ReadOnlyStore {
        async fn cached_coins(&self) -> Result<Vec<Coin>, StoreError> {
            self.0.cached_coins().await
        }

        async fn replace_cached_coins(&self, _coins: Vec<Coin>) -> Result<(), StoreError> {
            Err(StoreError::Task("database is read-only".to_string()))
        }

        fn subscribe_cached_coins(&self) -> watch::Receiver<Vec<Coin>> {
            self.0.subscribe_cached_coins()
        }

        async fn favourite_ids(&self) -> Result<Vec<FavouriteCoinId>, StoreError> {
            self.0.favourite_ids().await
        }

        async fn is_favourite(&self, id: &FavouriteCoinId) -> Result<bool, StoreError> {
            self.0.is_favourite(id).await
        }

        async fn insert_favourite(&self, _id: FavouriteCoinId) -> Result<(), StoreError> {
            Err(StoreError::Task("database is read-only".to_string()))
        }

        async fn delete_favourite(&self, _id: &FavouriteCoinId) -> Result<(), StoreError> {
            Err(StoreError::Task("database is read-only".to_string()))
        }

        fn subscribe_favourite_ids(&self) -> watch::Receiver<Vec<FavouriteCoinId>> {
            self.0.subscribe_favourite_ids()
        }
    }

    fn repository() -> (Arc<MockProvider>, Arc<MemoryCoinStore>, CoinRepository) {
        let provider = Arc::new(MockProvider::new());
        let store = Arc::new(MemoryCoinStore::new());
        let repository = CoinRepository::new(provider.clone(), store.clone());
        (provider, store, repository)
    }

    #[tokio::test]
    async fn test_update_cached_coins_overwrites_cache() {
        let (provider, store, repository) = repository();
        store
            .replace_cached_coins(vec![sample_coin("old", "1", "0")])
            .await
            .unwrap();
        provider.set_coins(vec![
            sample_coin("btc", "27000", "1"),
            sample_coin("eth", "1800", "2"),
        ]);

        let result = repository
            .update_cached_coins(Currency::USD, CoinSort::MarketCap)
            .await;

        assert_eq!(result.data().map(Vec::len), Some(2));
        let cached: Vec<String> = store
            .cached_coins()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(cached, vec!["btc", "eth"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_leaves_cache_untouched() {
        let (provider, store, repository) = repository();
        store
            .replace_cached_coins(vec![sample_coin("btc", "27000", "1")])
            .await
            .unwrap();
        provider.set_coins_error("HTTP 500");

        let result = repository
            .update_cached_coins(Currency::USD, CoinSort::MarketCap)
            .await;

        assert_eq!(result, Resource::error(ERROR_COINS));
        assert_eq!(store.cached_coins().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_cache_write_is_an_error() {
        let provider = Arc::new(MockProvider::new());
        provider.set_coins(vec![sample_coin("btc", "27000", "1")]);
        let repository =
            CoinRepository::new(provider.clone(), Arc::new(ReadOnlyStore(MemoryCoinStore::new())));

        let result = repository
            .update_cached_coins(Currency::USD, CoinSort::MarketCap)
            .await;

        assert_eq!(result, Resource::error(ERROR_UPDATE_CACHE));
        assert_eq!(repository.cached_coins().await, Resource::Success(Vec::new()));
        assert_eq!(provider.call_count(), 1);

        let toggled = repository.toggle_favourite(FavouriteCoinId::new("btc")).await;
        assert_eq!(toggled, Resource::error(ERROR_UPDATE_FAVOURITE));
    }

    #[tokio::test]
    async fn test_errors_become_generic_messages() {
        let (provider, _store, repository) = repository();
        provider.set_chart_error("HTTP 502: bad gateway");

        let detail = repository.get_coin_detail("missing", Currency::USD).await;
        assert_eq!(detail.error_message(), Some(ERROR_COIN_DETAIL));

        let chart = repository
            .get_coin_chart("btc", ChartPeriod::Week, Currency::USD)
            .await;
        assert_eq!(chart.error_message(), Some(ERROR_COIN_CHART));

        let overview = repository.get_market_overview(Currency::USD).await;
        assert_eq!(overview.error_message(), Some(ERROR_MARKET_STATS));
    }

    #[tokio::test]
    async fn test_no_favourites_skips_network() {
        let (provider, _store, repository) = repository();

        let result = repository.get_favourite_coins(Currency::USD).await;

        assert_eq!(result, Resource::Success(Vec::new()));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_favourite_coins_are_fetched_by_id() {
        let (provider, _store, repository) = repository();
        provider.set_coins(vec![
            sample_coin("btc", "27000", "1"),
            sample_coin("eth", "1800", "2"),
        ]);

        let toggled = repository.toggle_favourite(FavouriteCoinId::new("eth")).await;
        assert_eq!(toggled, Resource::Success(true));

        let favourites = repository
            .get_favourite_coins(Currency::USD)
            .await
            .into_data()
            .unwrap();
        assert_eq!(favourites.len(), 1);
        assert_eq!(favourites[0].id, FavouriteCoinId::new("eth"));
        assert_eq!(favourites[0].coin.symbol, "ETH");
    }
}
