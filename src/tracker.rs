//! Coin tracker service
//!
//! The entry point front ends talk to. Each operation reads the current
//! preferences (currency, sort order) and delegates to the repository.

use crate::{
    config::Config,
    error::{CoinWatchError, StoreError},
    money::Currency,
    preferences::{Preferences, PreferencesStore, StartScreen},
    provider::MarketDataProvider,
    repository::CoinRepository,
    resource::Resource,
    store::{CoinStore, SqliteCoinStore},
    types::{
        ChartPeriod, Coin, CoinChart, CoinDetail, CoinSort, FavouriteCoin, FavouriteCoinId,
        GlobalMarketOverview, SearchCoin,
    },
};
use std::sync::Arc;
use tokio::sync::watch;

/// Coin tracker
///
/// Owns the repository and the preferences store and exposes one method per
/// user-facing operation.
///
/// # Example
/// ```no_run
/// use coinwatch::{CoinTracker, Config, Resource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let tracker = CoinTracker::open(&Config::from_env()).await?;
///
/// if let Resource::Success(coins) = tracker.update_cached_coins().await {
///     for coin in coins.iter().take(5) {
///         println!("{}: {}", coin.symbol, coin.current_price);
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct CoinTracker {
    repository: CoinRepository,
    preferences: Arc<PreferencesStore>,
}

impl CoinTracker {
    /// Creates a tracker from configuration
    ///
    /// Builds the configured provider, opens the SQLite store and loads
    /// preferences from the data directory.
    pub async fn open(config: &Config) -> Result<Self, CoinWatchError> {
        let provider = config.build_provider()?;
        let database_path = config.database_path();
        let store = tokio::task::spawn_blocking(move || SqliteCoinStore::open(&database_path))
            .await
            .map_err(StoreError::from)??;
        let preferences = PreferencesStore::open(config.preferences_path()).await;

        tracing::info!(
            provider = provider.provider_name(),
            data_dir = %config.data_dir.display(),
            "Coin tracker ready"
        );

        Ok(Self::with_parts(
            provider,
            Arc::new(store),
            Arc::new(preferences),
        ))
    }

    /// Creates a tracker from explicit parts
    ///
    /// This is primarily for testing with mock providers and in-memory stores.
    pub fn with_parts(
        provider: Arc<dyn MarketDataProvider>,
        store: Arc<dyn CoinStore>,
        preferences: Arc<PreferencesStore>,
    ) -> Self {
        Self {
            repository: CoinRepository::new(provider, store),
            preferences,
        }
    }

    /// Returns the name of the current provider
    pub fn provider_name(&self) -> &'static str {
        self.repository.provider_name()
    }

    /// Returns the current preferences
    pub fn preferences(&self) -> Preferences {
        self.preferences.get()
    }

    /// Subscribes to preference changes
    pub fn subscribe_preferences(&self) -> watch::Receiver<Preferences> {
        self.preferences.subscribe()
    }

    /// Saves the preferred currency used by every subsequent request
    pub async fn set_currency(&self, currency: Currency) -> Result<Preferences, StoreError> {
        self.preferences.update_currency(currency).await
    }

    /// Saves the market list sort order
    pub async fn set_coin_sort(&self, coin_sort: CoinSort) -> Result<Preferences, StoreError> {
        self.preferences.update_coin_sort(coin_sort).await
    }

    /// Saves the screen a front end opens on
    pub async fn set_start_screen(
        &self,
        start_screen: StartScreen,
    ) -> Result<Preferences, StoreError> {
        self.preferences.update_start_screen(start_screen).await
    }

    /// Saves whether favourites render in the condensed layout
    pub async fn set_favourites_condensed(
        &self,
        is_condensed: bool,
    ) -> Result<Preferences, StoreError> {
        self.preferences.update_is_condensed(is_condensed).await
    }

    fn currency(&self) -> Currency {
        self.preferences.get().user.currency
    }

    /// Fetches the market list with the preferred currency and sort
    pub async fn get_coins(&self) -> Resource<Vec<Coin>> {
        let prefs = self.preferences.get();
        self.repository
            .get_coins(prefs.user.currency, prefs.market.coin_sort)
            .await
    }

    /// Fetches the market list and replaces the local cache with it
    pub async fn update_cached_coins(&self) -> Resource<Vec<Coin>> {
        let prefs = self.preferences.get();
        self.repository
            .update_cached_coins(prefs.user.currency, prefs.market.coin_sort)
            .await
    }

    /// Reads the cached market list without touching the network
    pub async fn cached_coins(&self) -> Resource<Vec<Coin>> {
        self.repository.cached_coins().await
    }

    /// Subscribes to cached market list snapshots
    pub fn subscribe_cached_coins(&self) -> watch::Receiver<Vec<Coin>> {
        self.repository.subscribe_cached_coins()
    }

    /// Fetches coin detail in the preferred currency
    pub async fn get_coin_detail(&self, id: &str) -> Resource<CoinDetail> {
        self.repository.get_coin_detail(id, self.currency()).await
    }

    /// Fetches a price chart for `period` in the preferred currency
    pub async fn get_coin_chart(&self, id: &str, period: ChartPeriod) -> Resource<CoinChart> {
        self.repository
            .get_coin_chart(id, period, self.currency())
            .await
    }

    /// Fetches global market statistics in the preferred currency
    pub async fn get_market_overview(&self) -> Resource<GlobalMarketOverview> {
        self.repository.get_market_overview(self.currency()).await
    }

    /// Searches coins by name or symbol
    pub async fn search_coins(&self, query: &str) -> Resource<Vec<SearchCoin>> {
        self.repository.search_coins(query).await
    }

    /// Fetches live market data for every favourite
    pub async fn get_favourite_coins(&self) -> Resource<Vec<FavouriteCoin>> {
        self.repository.get_favourite_coins(self.currency()).await
    }

    /// Adds or removes a favourite and returns whether it is now a favourite
    pub async fn toggle_favourite(&self, id: &str) -> Resource<bool> {
        self.repository
            .toggle_favourite(FavouriteCoinId::new(id))
            .await
    }

    /// Whether the coin with `id` is a favourite
    pub async fn is_favourite(&self, id: &str) -> Resource<bool> {
        self.repository
            .is_favourite(&FavouriteCoinId::new(id))
            .await
    }

    /// Subscribes to favourite id snapshots
    pub fn subscribe_favourite_ids(&self) -> watch::Receiver<Vec<FavouriteCoinId>> {
        self.repository.subscribe_favourite_ids()
    }
}
