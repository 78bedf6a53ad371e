//! # StockPulse Store
//!
//! Device-local persistent storage for StockPulse.
//!
//! The app keeps several unrelated kinds of state on the device (favorites,
//! watchlists, the API response cache). All of them go through the same
//! string-to-string [`KvStore`], backed by a single `DuckDB` file. Callers are
//! expected to namespace their keys.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stockpulse_store::{KvStore, StoreConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = KvStore::open(StoreConfig::default())?;
//!
//!     store.set("favorites", r#"["AAPL","MSFT"]"#)?;
//!     assert_eq!(store.get("favorites")?.as_deref(), Some(r#"["AAPL","MSFT"]"#));
//!
//!     store.remove("favorites")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `kv_items` | One row per key: `key`, `value`, `updated_at_ms` |

pub mod duckdb;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use ::duckdb::{params, OptionalExt};
use thiserror::Error;

pub use self::duckdb::{ConnectionPool, PooledConnection};

/// Errors raised by the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error while preparing the storage directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Location and pooling settings for the device store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory for StockPulse data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept for reuse.
    pub max_idle_connections: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::in_home(resolve_stockpulse_home())
    }
}

impl StoreConfig {
    /// Place the database under `<home>/storage/device.duckdb`.
    pub fn in_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let db_path = home.join("storage").join("device.duckdb");
        Self {
            home,
            db_path,
            max_idle_connections: 4,
        }
    }
}

/// Persistent string key/value store.
#[derive(Clone)]
pub struct KvStore {
    pool: ConnectionPool,
}

impl KvStore {
    /// Open (creating if needed) the store described by `config`.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::open(config.db_path, config.max_idle_connections)?;
        let store = Self { pool };
        store.initialize()?;
        Ok(store)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let connection = self.pool.acquire()?;
        connection.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_items (
                key VARCHAR PRIMARY KEY,
                value VARCHAR NOT NULL,
                updated_at_ms BIGINT NOT NULL
            );",
        )?;
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        self.pool.db_path()
    }

    /// Read the value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let connection = self.pool.acquire()?;
        let value = connection
            .query_row(
                "SELECT value FROM kv_items WHERE key = ?",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Write `value` under `key`, replacing any previous value.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let connection = self.pool.acquire()?;
        connection.execute(
            "INSERT INTO kv_items (key, value, updated_at_ms) VALUES (?, ?, ?)
             ON CONFLICT (key) DO UPDATE SET
                value = excluded.value,
                updated_at_ms = excluded.updated_at_ms",
            params![key, value, now_epoch_millis()],
        )?;
        Ok(())
    }

    /// Delete `key`. Returns whether a row was removed.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let connection = self.pool.acquire()?;
        let removed = connection.execute("DELETE FROM kv_items WHERE key = ?", params![key])?;
        Ok(removed > 0)
    }

    /// List keys starting with `prefix`, sorted.
    pub fn keys_with_prefix(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let connection = self.pool.acquire()?;
        let mut statement =
            connection.prepare("SELECT key FROM kv_items WHERE starts_with(key, ?) ORDER BY key")?;
        let keys = statement
            .query_map(params![prefix], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

fn resolve_stockpulse_home() -> PathBuf {
    if let Some(path) = env::var_os("STOCKPULSE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".stockpulse");
    }

    PathBuf::from(".stockpulse")
}

fn now_epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn open_temp_store() -> (tempfile::TempDir, KvStore) {
        let temp = tempdir().expect("tempdir");
        let store = KvStore::open(StoreConfig::in_home(temp.path().join("home")))
            .expect("store open");
        (temp, store)
    }

    #[test]
    fn creates_database_under_storage_directory() {
        let (temp, store) = open_temp_store();
        assert_eq!(
            store.db_path(),
            temp.path().join("home").join("storage").join("device.duckdb")
        );
        assert!(store.db_path().exists());
    }

    #[test]
    fn set_overwrites_previous_value() {
        let (_temp, store) = open_temp_store();

        assert_eq!(store.get("k").expect("get"), None);
        store.set("k", "one").expect("set");
        store.set("k", "two").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("two"));
    }

    #[test]
    fn remove_reports_whether_key_existed() {
        let (_temp, store) = open_temp_store();

        store.set("k", "v").expect("set");
        assert!(store.remove("k").expect("remove"));
        assert!(!store.remove("k").expect("remove again"));
        assert_eq!(store.get("k").expect("get"), None);
    }

    #[test]
    fn keys_with_prefix_only_lists_matching_namespace() {
        let (_temp, store) = open_temp_store();

        store.set("cache:quote_AAPL", "{}").expect("set");
        store.set("cache:overview_AAPL", "{}").expect("set");
        store.set("watchlists", "[]").expect("set");

        let keys = store.keys_with_prefix("cache:").expect("keys");
        assert_eq!(keys, vec!["cache:overview_AAPL", "cache:quote_AAPL"]);
    }

    #[test]
    fn values_survive_reopen() {
        let temp = tempdir().expect("tempdir");
        let config = StoreConfig::in_home(temp.path());

        {
            let store = KvStore::open(config.clone()).expect("store open");
            store.set("favorites", "[\"AAPL\"]").expect("set");
        }

        let reopened = KvStore::open(config).expect("store reopen");
        assert_eq!(
            reopened.get("favorites").expect("get").as_deref(),
            Some("[\"AAPL\"]")
        );
    }

    #[test]
    fn quotes_in_keys_and_values_are_stored_verbatim() {
        let (_temp, store) = open_temp_store();
        let key = "search_o'reilly'; DROP TABLE kv_items; --";

        store.set(key, "it's fine").expect("set");
        assert_eq!(store.get(key).expect("get").as_deref(), Some("it's fine"));
    }
}
