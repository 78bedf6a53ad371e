//! Async key/value device storage.
//!
//! The response cache shares this storage with screen-level state such as
//! favorites and watchlists, so every user of [`DeviceStorage`] must keep its
//! keys in its own namespace.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use stockpulse_store::KvStore;
use tokio::sync::RwLock;

use crate::StorageError;

pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// String key/value storage on the device.
pub trait DeviceStorage: Send + Sync {
    fn get_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>>;

    fn set_item<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()>;

    fn remove_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;

    /// Every stored key starting with `prefix`, sorted.
    fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> StorageFuture<'a, Vec<String>>;
}

/// Process-local storage. Contents are lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys = self.items.read().await.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys
    }
}

impl DeviceStorage for MemoryStorage {
    fn get_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.items.read().await.get(key).cloned()) })
    }

    fn set_item<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.items.write().await.insert(key.to_owned(), value);
            Ok(())
        })
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            self.items.write().await.remove(key);
            Ok(())
        })
    }

    fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> StorageFuture<'a, Vec<String>> {
        Box::pin(async move {
            let mut keys = self
                .items
                .read()
                .await
                .keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect::<Vec<_>>();
            keys.sort();
            Ok(keys)
        })
    }
}

/// Persistent storage on the `DuckDB` key/value store.
///
/// Database calls block, so each one runs on tokio's blocking pool.
#[derive(Clone)]
pub struct DuckDbStorage {
    store: KvStore,
}

impl DuckDbStorage {
    pub fn new(store: KvStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    async fn run_blocking<T, F>(&self, operation: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&KvStore) -> Result<T, stockpulse_store::StoreError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || operation(&store))
            .await
            .map_err(|error| StorageError::Task(error.to_string()))?
            .map_err(StorageError::from)
    }
}

impl DeviceStorage for DuckDbStorage {
    fn get_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        let key = key.to_owned();
        Box::pin(self.run_blocking(move |store| store.get(&key)))
    }

    fn set_item<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        let key = key.to_owned();
        Box::pin(self.run_blocking(move |store| store.set(&key, &value)))
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        let key = key.to_owned();
        Box::pin(self.run_blocking(move |store| store.remove(&key).map(|_| ())))
    }

    fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> StorageFuture<'a, Vec<String>> {
        let prefix = prefix.to_owned();
        Box::pin(self.run_blocking(move |store| store.keys_with_prefix(&prefix)))
    }
}
