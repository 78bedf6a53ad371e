//! Persistent response cache with TTL semantics.
//!
//! Entries are stored as JSON `{ "value": .., "stored_at_epoch_millis": .. }`
//! under a namespaced key in [`DeviceStorage`]. Freshness is decided at read
//! time; there is no background sweep. An expired entry is deleted the first
//! time a fresh read finds it, but stays readable through
//! [`PersistentCache::get_stale`] until then.
//!
//! The cache never fails a request: storage and serialization errors are
//! logged and reported as a miss.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::storage::DeviceStorage;

/// Default freshness window: five minutes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(300_000);

/// Prefix separating cache keys from other device storage domains.
pub const CACHE_NAMESPACE: &str = "stockpulse:cache:";

/// Source of "now" for freshness checks.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_millis(&self) -> i64 {
        (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_epoch_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_epoch_millis),
        }
    }

    pub fn set(&self, now_epoch_millis: i64) {
        self.now.store(now_epoch_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A cached value and the moment it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    pub stored_at_epoch_millis: i64,
}

impl<T> CacheEntry<T> {
    pub fn age_millis(&self, now_epoch_millis: i64) -> i64 {
        now_epoch_millis - self.stored_at_epoch_millis
    }

    pub fn is_fresh(&self, ttl: Duration, now_epoch_millis: i64) -> bool {
        i128::from(self.age_millis(now_epoch_millis)) < ttl.as_millis() as i128
    }
}

/// TTL cache layered on device storage.
#[derive(Clone)]
pub struct PersistentCache {
    storage: Arc<dyn DeviceStorage>,
    clock: Arc<dyn Clock>,
}

impl PersistentCache {
    pub fn new(storage: Arc<dyn DeviceStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    pub fn with_clock(storage: Arc<dyn DeviceStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Key under which `key` lives in device storage.
    pub fn storage_key(key: &str) -> String {
        format!("{CACHE_NAMESPACE}{key}")
    }

    pub fn now_epoch_millis(&self) -> i64 {
        self.clock.now_epoch_millis()
    }

    /// Raw entry regardless of age.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let storage_key = Self::storage_key(key);
        let raw = match self.storage.get_item(&storage_key).await {
            Ok(raw) => raw?,
            Err(error) => {
                warn!(key, %error, "cache read failed; treating as miss");
                return None;
            }
        };

        match serde_json::from_str::<CacheEntry<T>>(&raw) {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(key, %error, "cache entry is unreadable; treating as miss");
                None
            }
        }
    }

    /// Value if younger than `ttl`. An expired entry is deleted.
    pub async fn get_fresh<T: DeserializeOwned>(&self, key: &str, ttl: Duration) -> Option<T> {
        let entry = self.get::<T>(key).await?;
        let now = self.clock.now_epoch_millis();

        if entry.is_fresh(ttl, now) {
            debug!(key, age_ms = entry.age_millis(now), "cache hit");
            return Some(entry.value);
        }

        debug!(key, age_ms = entry.age_millis(now), "cache entry expired; evicting");
        self.remove(key).await;
        None
    }

    /// Value regardless of age. Does not touch the stored timestamp.
    pub async fn get_stale<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get::<T>(key).await.map(|entry| entry.value)
    }

    /// Store `value` stamped with the current time, replacing any prior entry.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let entry = CacheEntry {
            value,
            stored_at_epoch_millis: self.clock.now_epoch_millis(),
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(key, %error, "cache entry could not be serialized; skipping write");
                return;
            }
        };

        if let Err(error) = self.storage.set_item(&Self::storage_key(key), raw).await {
            warn!(key, %error, "cache write failed");
        }
    }

    /// Whether a row exists under `key`, readable or not.
    pub async fn contains(&self, key: &str) -> bool {
        match self.storage.get_item(&Self::storage_key(key)).await {
            Ok(raw) => raw.is_some(),
            Err(error) => {
                warn!(key, %error, "cache read failed; treating as miss");
                false
            }
        }
    }

    /// Cache keys currently stored, without the namespace, sorted.
    pub async fn keys(&self) -> Vec<String> {
        match self.storage.keys_with_prefix(CACHE_NAMESPACE).await {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(CACHE_NAMESPACE).map(str::to_owned))
                .collect(),
            Err(error) => {
                warn!(%error, "cache listing failed");
                Vec::new()
            }
        }
    }

    pub async fn remove(&self, key: &str) {
        if let Err(error) = self.storage.remove_item(&Self::storage_key(key)).await {
            warn!(key, %error, "cache eviction failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, StorageFuture};
    use crate::StorageError;

    fn cache_at(now: i64) -> (Arc<MemoryStorage>, Arc<ManualClock>, PersistentCache) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(ManualClock::new(now));
        let cache = PersistentCache::with_clock(storage.clone(), clock.clone());
        (storage, clock, cache)
    }

    #[tokio::test]
    async fn put_then_get_fresh_returns_the_stored_value() {
        let (_storage, _clock, cache) = cache_at(1_000);

        cache.put("overview_AAPL", &String::from("Apple Inc.")).await;

        for ttl_ms in [1, 1_000, 300_000] {
            assert_eq!(
                cache
                    .get_fresh::<String>("overview_AAPL", Duration::from_millis(ttl_ms))
                    .await
                    .as_deref(),
                Some("Apple Inc.")
            );
        }
    }

    #[tokio::test]
    async fn expired_entry_is_evicted_on_fresh_read() {
        let (_storage, clock, cache) = cache_at(1_000);

        cache.put("quote_AAPL", &42_u32).await;
        clock.advance(Duration::from_millis(300_000));

        assert_eq!(
            cache
                .get_fresh::<u32>("quote_AAPL", DEFAULT_CACHE_TTL)
                .await,
            None
        );
        assert!(cache.get::<u32>("quote_AAPL").await.is_none());
    }

    #[tokio::test]
    async fn stale_read_ignores_age_and_keeps_timestamp() {
        let (_storage, clock, cache) = cache_at(5_000);

        cache.put("quote_XYZ", &String::from("100.00")).await;
        clock.advance(Duration::from_secs(86_400));

        assert_eq!(
            cache.get_stale::<String>("quote_XYZ").await.as_deref(),
            Some("100.00")
        );
        let entry = cache.get::<String>("quote_XYZ").await.expect("entry retained");
        assert_eq!(entry.stored_at_epoch_millis, 5_000);
    }

    #[tokio::test]
    async fn put_overwrites_and_restamps() {
        let (_storage, clock, cache) = cache_at(0);

        cache.put("k", &1_u8).await;
        clock.set(7_000);
        cache.put("k", &2_u8).await;

        let entry = cache.get::<u8>("k").await.expect("entry");
        assert_eq!(entry.value, 2);
        assert_eq!(entry.stored_at_epoch_millis, 7_000);
    }

    #[tokio::test]
    async fn keys_are_namespaced_in_device_storage() {
        let (storage, _clock, cache) = cache_at(0);

        cache.put("market_status", &true).await;

        assert_eq!(storage.keys().await, vec!["stockpulse:cache:market_status"]);
    }

    #[tokio::test]
    async fn corrupt_entry_reads_as_miss() {
        let (storage, _clock, cache) = cache_at(0);
        storage
            .set_item("stockpulse:cache:quote_AAPL", String::from("{not json"))
            .await
            .expect("seed");

        assert!(cache.get::<u32>("quote_AAPL").await.is_none());
        assert!(cache.get_stale::<u32>("quote_AAPL").await.is_none());
    }

    #[tokio::test]
    async fn entry_of_another_shape_reads_as_miss() {
        let (_storage, _clock, cache) = cache_at(0);

        cache.put("k", &String::from("text")).await;

        assert!(cache.get_fresh::<u64>("k", DEFAULT_CACHE_TTL).await.is_none());
    }

    struct BrokenStorage;

    impl DeviceStorage for BrokenStorage {
        fn get_item<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, Option<String>> {
            Box::pin(async { Err(StorageError::Task(String::from("disk unavailable"))) })
        }

        fn set_item<'a>(&'a self, _key: &'a str, _value: String) -> StorageFuture<'a, ()> {
            Box::pin(async { Err(StorageError::Task(String::from("disk unavailable"))) })
        }

        fn remove_item<'a>(&'a self, _key: &'a str) -> StorageFuture<'a, ()> {
            Box::pin(async { Err(StorageError::Task(String::from("disk unavailable"))) })
        }

        fn keys_with_prefix<'a>(&'a self, _prefix: &'a str) -> StorageFuture<'a, Vec<String>> {
            Box::pin(async { Err(StorageError::Task(String::from("disk unavailable"))) })
        }
    }

    #[tokio::test]
    async fn storage_failures_are_swallowed() {
        let cache = PersistentCache::new(Arc::new(BrokenStorage));

        cache.put("k", &1_u8).await;
        assert!(cache.get_fresh::<u8>("k", DEFAULT_CACHE_TTL).await.is_none());
        assert!(cache.get_stale::<u8>("k").await.is_none());
        assert!(!cache.contains("k").await);
        assert!(cache.keys().await.is_empty());
        cache.remove("k").await;
    }

    #[tokio::test]
    async fn keys_lists_only_namespaced_entries() {
        let (storage, _clock, cache) = cache_at(0);
        storage
            .set_item("favorites", String::from("[]"))
            .await
            .expect("set");
        cache.put("quote_IBM", &1_u8).await;
        cache.put("daily_AAPL", &2_u8).await;

        assert_eq!(cache.keys().await, vec!["daily_AAPL", "quote_IBM"]);
        assert!(cache.contains("quote_IBM").await);
        assert!(!cache.contains("favorites").await);
    }

    #[test]
    fn freshness_boundary_is_exclusive() {
        let entry = CacheEntry {
            value: (),
            stored_at_epoch_millis: 0,
        };
        let ttl = Duration::from_millis(100);

        assert!(entry.is_fresh(ttl, 99));
        assert!(!entry.is_fresh(ttl, 100));
    }
}
