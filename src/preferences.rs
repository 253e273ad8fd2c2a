//! Persisted user preferences
//!
//! All preferences live in one small JSON record on disk. Reads never fail:
//! a missing or unreadable file yields defaults, and fields added in later
//! versions fall back to their defaults when absent.

use crate::{error::StoreError, money::Currency, types::CoinSort};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::{watch, Mutex};

/// Screen shown when the app starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartScreen {
    #[default]
    Market,
    Favourites,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub currency: Currency,
    pub start_screen: StartScreen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketPreferences {
    pub coin_sort: CoinSort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FavouritesPreferences {
    /// Show favourites as a dense list instead of cards
    pub is_condensed: bool,
}

/// Everything persisted in the preferences file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub user: UserPreferences,
    pub market: MarketPreferences,
    pub favourites: FavouritesPreferences,
}

/// JSON-file preferences store with change notification
pub struct PreferencesStore {
    path: PathBuf,
    current: watch::Sender<Preferences>,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl PreferencesStore {
    /// Opens the store at `path`, loading whatever is there
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let preferences = load(&path).await;

        Self {
            path,
            current: watch::Sender::new(preferences),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the current preferences
    pub fn get(&self) -> Preferences {
        *self.current.borrow()
    }

    /// Subscribes to preference changes
    pub fn subscribe(&self) -> watch::Receiver<Preferences> {
        self.current.subscribe()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change`, persists the result and notifies subscribers
    ///
    /// Nothing is published if writing the file fails.
    pub async fn update<F>(&self, change: F) -> Result<Preferences, StoreError>
    where
        F: FnOnce(&mut Preferences),
    {
        let _guard = self.write_lock.lock().await;

        let mut preferences = self.get();
        change(&mut preferences);
        save(&self.path, &preferences).await?;

        self.current.send_replace(preferences);
        tracing::debug!(path = %self.path.display(), "Saved preferences");
        Ok(preferences)
    }

    pub async fn update_currency(&self, currency: Currency) -> Result<Preferences, StoreError> {
        self.update(|p| p.user.currency = currency).await
    }

    pub async fn update_start_screen(
        &self,
        start_screen: StartScreen,
    ) -> Result<Preferences, StoreError> {
        self.update(|p| p.user.start_screen = start_screen).await
    }

    pub async fn update_coin_sort(&self, coin_sort: CoinSort) -> Result<Preferences, StoreError> {
        self.update(|p| p.market.coin_sort = coin_sort).await
    }

    pub async fn update_is_condensed(&self, is_condensed: bool) -> Result<Preferences, StoreError> {
        self.update(|p| p.favourites.is_condensed = is_condensed).await
    }
}

async fn load(path: &Path) -> Preferences {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Preferences::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read preferences, using defaults");
            return Preferences::default();
        }
    };

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "Corrupt preferences file, using defaults");
        Preferences::default()
    })
}

async fn save(path: &Path, preferences: &Preferences) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let json = serde_json::to_string_pretty(preferences)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = PreferencesStore::open(dir.path().join("preferences.json")).await;

        let prefs = store.get();
        assert_eq!(prefs.user.currency, Currency::USD);
        assert_eq!(prefs.user.start_screen, StartScreen::Market);
        assert_eq!(prefs.market.coin_sort, CoinSort::MarketCap);
        assert!(!prefs.favourites.is_condensed);
    }

    #[tokio::test]
    async fn test_updates_persist_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings").join("preferences.json");

        let store = PreferencesStore::open(&path).await;
        store.update_currency(Currency::GBP).await.unwrap();
        store.update_coin_sort(CoinSort::Gainers).await.unwrap();
        store.update_start_screen(StartScreen::Favourites).await.unwrap();
        store.update_is_condensed(true).await.unwrap();

        let reopened = PreferencesStore::open(&path).await;
        let prefs = reopened.get();
        assert_eq!(prefs.user.currency, Currency::GBP);
        assert_eq!(prefs.user.start_screen, StartScreen::Favourites);
        assert_eq!(prefs.market.coin_sort, CoinSort::Gainers);
        assert!(prefs.favourites.is_condensed);
    }

    #[tokio::test]
    async fn test_corrupt_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = PreferencesStore::open(&path).await;
        assert_eq!(store.get(), Preferences::default());
    }

    #[tokio::test]
    async fn test_partial_record_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        tokio::fs::write(&path, r#"{"user": {"currency": "EUR"}}"#)
            .await
            .unwrap();

        let store = PreferencesStore::open(&path).await;
        let prefs = store.get();
        assert_eq!(prefs.user.currency, Currency::EUR);
        assert_eq!(prefs.user.start_screen, StartScreen::Market);
        assert_eq!(prefs.market.coin_sort, CoinSort::MarketCap);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let dir = TempDir::new().unwrap();
        let store = PreferencesStore::open(dir.path().join("preferences.json")).await;
        let mut rx = store.subscribe();

        store.update_currency(Currency::EUR).await.unwrap();

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().user.currency, Currency::EUR);
    }
}
