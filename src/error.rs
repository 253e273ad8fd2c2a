//! Error types for the CoinWatch SDK

use thiserror::Error;

/// Errors that can occur when calling a market data API
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Requested coin does not exist upstream
    #[error("Coin not found: {0}")]
    NotFound(String),

    /// API returned a non-success status
    #[error("API error: {0}")]
    Status(String),
}

impl ApiError {
    /// Creates an InvalidResponse error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Creates a NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }
}

/// Errors that can occur when reading or writing local state
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite statement failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored record could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(String),

    /// A stored value could not be decoded
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Creates a Corrupt error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Errors that can occur when assembling a [`crate::CoinTracker`]
#[derive(Debug, Error)]
pub enum CoinWatchError {
    /// Provider could not be created
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Local state could not be opened
    #[error(transparent)]
    Store(#[from] StoreError),
}
