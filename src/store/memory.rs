//! In-memory coin store

use super::CoinStore;
use crate::{
    error::StoreError,
    types::{Coin, FavouriteCoinId},
};
use async_trait::async_trait;
use tokio::sync::watch;

/// Volatile [`CoinStore`] backed by watch channels
///
/// Each channel holds the current snapshot, so reads never wait on writers.
/// Useful for tests and for front ends that do not need persistence.
pub struct MemoryCoinStore {
    coins: watch::Sender<Vec<Coin>>,
    favourites: watch::Sender<Vec<FavouriteCoinId>>,
}

impl MemoryCoinStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self {
            coins: watch::Sender::new(Vec::new()),
            favourites: watch::Sender::new(Vec::new()),
        }
    }
}

impl Default for MemoryCoinStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CoinStore for MemoryCoinStore {
    async fn cached_coins(&self) -> Result<Vec<Coin>, StoreError> {
        Ok(self.coins.borrow().clone())
    }

    async fn replace_cached_coins(&self, coins: Vec<Coin>) -> Result<(), StoreError> {
        tracing::debug!(count = coins.len(), "Replacing in-memory coin cache");
        self.coins.send_replace(coins);
        Ok(())
    }

    fn subscribe_cached_coins(&self) -> watch::Receiver<Vec<Coin>> {
        self.coins.subscribe()
    }

    async fn favourite_ids(&self) -> Result<Vec<FavouriteCoinId>, StoreError> {
        Ok(self.favourites.borrow().clone())
    }

    async fn is_favourite(&self, id: &FavouriteCoinId) -> Result<bool, StoreError> {
        Ok(self.favourites.borrow().contains(id))
    }

    async fn insert_favourite(&self, id: FavouriteCoinId) -> Result<(), StoreError> {
        self.favourites.send_if_modified(|ids| {
            if ids.contains(&id) {
                false
            } else {
                ids.push(id);
                true
            }
        });
        Ok(())
    }

    async fn delete_favourite(&self, id: &FavouriteCoinId) -> Result<(), StoreError> {
        self.favourites.send_if_modified(|ids| {
            let before = ids.len();
            ids.retain(|existing| existing != id);
            ids.len() != before
        });
        Ok(())
    }

    fn subscribe_favourite_ids(&self) -> watch::Receiver<Vec<FavouriteCoinId>> {
        self.favourites.subscribe()
    }
}
