//! Constants for the CoinWatch SDK
//!
//! Endpoint locations, request tuning and on-disk file names are centralized
//! here. The only runtime configuration is the small set of environment
//! variables read by [`crate::config::Config::from_env`].

/// HTTP request timeout when calling a market data API (in seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent for HTTP requests
pub const USER_AGENT: &str = "coinwatch-sdk/0.1.0";

/// Number of coins requested for market lists
pub const COIN_LIST_LIMIT: u32 = 100;

/// Coinranking API base URL
pub const COINRANKING_API_URL: &str = "https://api.coinranking.com/v2";

/// Header carrying the Coinranking access token
pub const COINRANKING_API_KEY_HEADER: &str = "x-access-token";

/// CoinGecko API base URL
pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

/// Header carrying the CoinGecko demo API key
pub const COINGECKO_API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Environment variable selecting the market data provider
pub const PROVIDER_ENV: &str = "COINWATCH_PROVIDER";

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "COINWATCH_API_KEY";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "COINWATCH_DATA_DIR";

/// Directory name created under the platform data dir
pub const DATA_DIR_NAME: &str = "coinwatch";

/// SQLite database file holding the coin cache and favourites
pub const DATABASE_FILE_NAME: &str = "coinwatch.db";

/// JSON file holding user preferences
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";
