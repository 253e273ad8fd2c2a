//! SQLite-backed coin store

use super::CoinStore;
use crate::{
    error::StoreError,
    money::{Currency, Percentage, Price},
    types::{Coin, FavouriteCoinId},
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Durable [`CoinStore`] in a single SQLite file
///
/// Statements run on the blocking pool against one mutex-guarded connection.
/// Writes publish their snapshot before releasing the connection, so
/// subscribers see snapshots in commit order.
pub struct SqliteCoinStore {
    conn: Arc<Mutex<Connection>>,
    coins: Arc<watch::Sender<Vec<Coin>>>,
    favourites: Arc<watch::Sender<Vec<FavouriteCoinId>>>,
}

impl SqliteCoinStore {
    /// Opens (or creates) the database at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_millis(5_000))?;

        tracing::info!(path = %path.display(), "Opened coin database");
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        initialize_schema(&conn)?;
        let coins = load_coins(&conn)?;
        let favourites = load_favourite_ids(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            coins: Arc::new(watch::Sender::new(coins)),
            favourites: Arc::new(watch::Sender::new(favourites)),
        })
    }

    /// Runs `f` against the connection on the blocking pool
    async fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| StoreError::Task("database connection mutex poisoned".to_string()))?;
            f(&mut conn)
        })
        .await?
    }
}

/// Creates tables if they do not exist
fn initialize_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cached_coin (
            id TEXT PRIMARY KEY NOT NULL,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            symbol TEXT NOT NULL,
            image_url TEXT NOT NULL,
            currency TEXT NOT NULL,
            current_price TEXT NOT NULL,
            price_change_percentage_24h TEXT NOT NULL,
            sparkline TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS favourite_coin_id (
            id TEXT PRIMARY KEY NOT NULL
        );",
    )?;
    Ok(())
}

/// Raw column values of one `cached_coin` row
struct CoinRow {
    id: String,
    name: String,
    symbol: String,
    image_url: String,
    currency: String,
    current_price: String,
    change: String,
    sparkline: String,
}

impl CoinRow {
    fn into_coin(self) -> Result<Coin, StoreError> {
        let currency = Currency::from_str(&self.currency).map_err(StoreError::corrupt)?;
        let sparkline: Vec<Decimal> = serde_json::from_str(&self.sparkline)?;

        Ok(Coin {
            current_price: Price::new(decode_decimal(&self.current_price)?, currency),
            price_change_percentage_24h: Percentage::new(decode_decimal(&self.change)?),
            sparkline: sparkline
                .into_iter()
                .map(|amount| Price::new(amount, currency))
                .collect(),
            id: self.id,
            name: self.name,
            symbol: self.symbol,
            image_url: self.image_url,
        })
    }
}

fn decode_decimal(raw: &str) -> Result<Decimal, StoreError> {
    Decimal::from_str(raw).map_err(|e| StoreError::corrupt(format!("{}: {}", raw, e)))
}

fn load_coins(conn: &Connection) -> Result<Vec<Coin>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, symbol, image_url, currency, current_price,
                price_change_percentage_24h, sparkline
         FROM cached_coin ORDER BY position",
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok(CoinRow {
                id: row.get(0)?,
                name: row.get(1)?,
                symbol: row.get(2)?,
                image_url: row.get(3)?,
                currency: row.get(4)?,
                current_price: row.get(5)?,
                change: row.get(6)?,
                sparkline: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter().map(CoinRow::into_coin).collect()
}

fn load_favourite_ids(conn: &Connection) -> Result<Vec<FavouriteCoinId>, StoreError> {
    let mut stmt = conn.prepare("SELECT id FROM favourite_coin_id ORDER BY rowid")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids.into_iter().map(FavouriteCoinId).collect())
}

/// Deletes every cached coin and inserts `coins` in one transaction
fn write_coins(conn: &mut Connection, coins: &[Coin]) -> Result<(), StoreError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM cached_coin", [])?;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO cached_coin (
                id, position, name, symbol, image_url, currency, current_price,
                price_change_percentage_24h, sparkline
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;

        for (position, coin) in coins.iter().enumerate() {
            let sparkline: Vec<Decimal> = coin.sparkline.iter().map(Price::amount).collect();
            stmt.execute(params![
                coin.id,
                position as i64,
                coin.name,
                coin.symbol,
                coin.image_url,
                coin.current_price.currency().code(),
                coin.current_price.amount().to_string(),
                coin.price_change_percentage_24h.amount().to_string(),
                serde_json::to_string(&sparkline)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

#[async_trait]
impl CoinStore for SqliteCoinStore {
    async fn cached_coins(&self) -> Result<Vec<Coin>, StoreError> {
        self.with_conn(|conn| load_coins(conn)).await
    }

    async fn replace_cached_coins(&self, coins: Vec<Coin>) -> Result<(), StoreError> {
        let sender = self.coins.clone();
        let count = coins.len();
        self.with_conn(move |conn| {
            write_coins(conn, &coins)?;
            sender.send_replace(coins);
            Ok(())
        })
        .await?;

        tracing::debug!(count, "Replaced cached coins");
        Ok(())
    }

    fn subscribe_cached_coins(&self) -> watch::Receiver<Vec<Coin>> {
        self.coins.subscribe()
    }

    async fn favourite_ids(&self) -> Result<Vec<FavouriteCoinId>, StoreError> {
        self.with_conn(|conn| load_favourite_ids(conn)).await
    }

    async fn is_favourite(&self, id: &FavouriteCoinId) -> Result<bool, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM favourite_coin_id WHERE id = ?1",
                    params![id],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn insert_favourite(&self, id: FavouriteCoinId) -> Result<(), StoreError> {
        let sender = self.favourites.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR IGNORE INTO favourite_coin_id (id) VALUES (?1)",
                params![id.as_str()],
            )?;
            sender.send_replace(load_favourite_ids(conn)?);
            Ok(())
        })
        .await
    }

    async fn delete_favourite(&self, id: &FavouriteCoinId) -> Result<(), StoreError> {
        let id = id.as_str().to_string();
        let sender = self.favourites.clone();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM favourite_coin_id WHERE id = ?1", params![id])?;
            sender.send_replace(load_favourite_ids(conn)?);
            Ok(())
        })
        .await
    }

    fn subscribe_favourite_ids(&self) -> watch::Receiver<Vec<FavouriteCoinId>> {
        self.favourites.subscribe()
    }
}
