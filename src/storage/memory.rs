use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::traits::{CacheStorage, StorageError};
use crate::request::RequestKey;
use crate::response::CacheEntry;

struct NamedStore {
    /// Creation sequence, used to order `keys()` and `match_any()`
    seq: u64,
    entries: DashMap<RequestKey, CacheEntry>,
}

/// Process-local cache storage. Lives as long as the value does.
pub struct InMemoryCacheStorage {
    stores: DashMap<String, Arc<NamedStore>>,
    next_seq: AtomicU64,
}

impl InMemoryCacheStorage {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stores: DashMap::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Number of stores
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Number of entries in a store (0 if it doesn't exist)
    #[must_use]
    pub fn entry_count(&self, store: &str) -> usize {
        self.stores.get(store).map(|s| s.entries.len()).unwrap_or(0)
    }

    /// Drop every store
    pub fn clear(&self) {
        self.stores.clear();
    }

    fn store(&self, name: &str) -> Result<Arc<NamedStore>, StorageError> {
        self.stores
            .get(name)
            .map(|r| Arc::clone(r.value()))
            .ok_or_else(|| StorageError::StoreNotFound(name.to_string()))
    }
}

impl Default for InMemoryCacheStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStorage for InMemoryCacheStorage {
    async fn open(&self, store: &str) -> Result<(), StorageError> {
        self.stores.entry(store.to_string()).or_insert_with(|| {
            Arc::new(NamedStore {
                seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
                entries: DashMap::new(),
            })
        });
        Ok(())
    }

    async fn has(&self, store: &str) -> Result<bool, StorageError> {
        Ok(self.stores.contains_key(store))
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut named: Vec<(u64, String)> = self
            .stores
            .iter()
            .map(|r| (r.value().seq, r.key().clone()))
            .collect();
        named.sort_unstable();
        Ok(named.into_iter().map(|(_, name)| name).collect())
    }

    async fn delete(&self, store: &str) -> Result<bool, StorageError> {
        Ok(self.stores.remove(store).is_some())
    }

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<CacheEntry>, StorageError> {
        let store = self.store(store)?;
        let entry = store.entries.get(key).map(|r| r.value().clone());
        Ok(entry)
    }

    async fn put(&self, store: &str, entry: CacheEntry) -> Result<(), StorageError> {
        let store = self.store(store)?;
        store.entries.insert(entry.key.clone(), entry);
        Ok(())
    }

    async fn entries(&self, store: &str) -> Result<Vec<RequestKey>, StorageError> {
        let store = self.store(store)?;
        let mut keys: Vec<RequestKey> = store.entries.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    /// Swaps in a freshly built store, keeping the old creation position.
    async fn replace(&self, store: &str, entries: Vec<CacheEntry>) -> Result<usize, StorageError> {
        let fresh: DashMap<RequestKey, CacheEntry> =
            entries.into_iter().map(|e| (e.key.clone(), e)).collect();
        let written = fresh.len();
        let seq = self
            .stores
            .get(store)
            .map(|s| s.seq)
            .unwrap_or_else(|| self.next_seq.fetch_add(1, Ordering::Relaxed));

        self.stores
            .insert(store.to_string(), Arc::new(NamedStore { seq, entries: fresh }));
        Ok(written)
    }
}
