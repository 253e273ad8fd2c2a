//! # CoinWatch SDK
//!
//! Coin market data, favourites and preferences for cryptocurrency tracking
//! front ends. Market data comes from Coinranking (default) or CoinGecko;
//! favourites and a cached market list live in SQLite; preferences live in
//! a small JSON file.
//!
//! ## Usage
//!
//! ```no_run
//! use coinwatch::{ChartPeriod, CoinTracker, Config, Resource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let tracker = CoinTracker::open(&Config::from_env()).await?;
//!
//! // Refresh the cached market list using the saved currency and sort order
//! match tracker.update_cached_coins().await {
//!     Resource::Success(coins) => println!("{} coins cached", coins.len()),
//!     Resource::Error(message) => eprintln!("{}", message),
//! }
//!
//! // Chart statistics for a week
//! if let Resource::Success(chart) = tracker.get_coin_chart("Qwsogvtv82FCd", ChartPeriod::Week).await {
//!     println!(
//!         "low {} high {} change {}",
//!         chart.min_price, chart.max_price, chart.period_price_change_percentage
//!     );
//! }
//!
//! // Favourites
//! tracker.toggle_favourite("Qwsogvtv82FCd").await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! CoinTracker (reads Preferences)
//!     ↓
//! CoinRepository (errors → Resource::Error)
//!     ↓                     ↓
//! MarketDataProvider    CoinStore
//! (Coinranking/CoinGecko) (SQLite / memory)
//! ```

pub mod chart;
pub mod config;
pub mod constants;
pub mod error;
pub mod money;
pub mod preferences;
pub mod provider;
pub mod providers;
pub mod repository;
pub mod resource;
pub mod store;
pub mod tracker;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ProviderKind};
pub use error::{ApiError, CoinWatchError, StoreError};
pub use money::{Currency, Percentage, Price, Sign};
pub use preferences::{
    FavouritesPreferences, MarketPreferences, Preferences, PreferencesStore, StartScreen,
    UserPreferences,
};
pub use resource::Resource;
pub use tracker::CoinTracker;
pub use types::{
    ChartPeriod, ChartPoint, Coin, CoinChart, CoinDetail, CoinSort, FavouriteCoin,
    FavouriteCoinId, GlobalMarketOverview, SearchCoin,
};
