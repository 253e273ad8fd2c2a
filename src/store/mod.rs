//! Local persistence for the coin cache and favourites
//!
//! Both collections are observable: every successful write publishes the new
//! contents on a tokio `watch` channel, so subscribers always see the latest
//! snapshot without polling.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryCoinStore;
pub use sqlite::SqliteCoinStore;

use crate::{
    error::StoreError,
    types::{Coin, FavouriteCoinId},
};
use async_trait::async_trait;
use tokio::sync::watch;

/// Storage backend for cached coins and favourite ids
#[async_trait]
pub trait CoinStore: Send + Sync {
    /// Returns the cached coin list in the order it was stored
    async fn cached_coins(&self) -> Result<Vec<Coin>, StoreError>;

    /// Replaces the whole coin cache with `coins`
    async fn replace_cached_coins(&self, coins: Vec<Coin>) -> Result<(), StoreError>;

    /// Subscribes to coin cache snapshots
    fn subscribe_cached_coins(&self) -> watch::Receiver<Vec<Coin>>;

    /// Returns favourite ids in the order they were added
    async fn favourite_ids(&self) -> Result<Vec<FavouriteCoinId>, StoreError>;

    async fn is_favourite(&self, id: &FavouriteCoinId) -> Result<bool, StoreError>;

    /// Adds a favourite; adding an existing id is a no-op
    async fn insert_favourite(&self, id: FavouriteCoinId) -> Result<(), StoreError>;

    /// Removes a favourite; removing a missing id is a no-op
    async fn delete_favourite(&self, id: &FavouriteCoinId) -> Result<(), StoreError>;

    /// Subscribes to favourite id snapshots
    fn subscribe_favourite_ids(&self) -> watch::Receiver<Vec<FavouriteCoinId>>;

    /// Flips favourite membership of `id` and returns the new state
    async fn toggle_favourite(&self, id: FavouriteCoinId) -> Result<bool, StoreError> {
        if self.is_favourite(&id).await? {
            self.delete_favourite(&id).await?;
            Ok(false)
        } else {
            self.insert_favourite(id).await?;
            Ok(true)
        }
    }
}
