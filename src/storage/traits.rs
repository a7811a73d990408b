use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use crate::request::RequestKey;
use crate::response::CacheEntry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Cache store '{0}' does not exist")]
    StoreNotFound(String),
    #[error("Quota exceeded writing to cache store '{store}'")]
    QuotaExceeded { store: String },
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// The host's named cache storage.
///
/// Stores are identified by name and hold [`CacheEntry`] values keyed by
/// [`RequestKey`]. `open` is idempotent: concurrent opens of the same name
/// resolve to the same store.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it if absent.
    async fn open(&self, store: &str) -> Result<(), StorageError>;

    async fn has(&self, store: &str) -> Result<bool, StorageError>;

    /// All store names, in creation order.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Delete a whole store. Returns whether it existed.
    async fn delete(&self, store: &str) -> Result<bool, StorageError>;

    async fn get(&self, store: &str, key: &RequestKey) -> Result<Option<CacheEntry>, StorageError>;

    /// Insert or overwrite an entry. The store must already be open.
    async fn put(&self, store: &str, entry: CacheEntry) -> Result<(), StorageError>;

    /// Request keys held by a store.
    async fn entries(&self, store: &str) -> Result<Vec<RequestKey>, StorageError>;

    /// First match for `key` across all stores, in creation order.
    /// Default implementation walks `keys()` sequentially.
    async fn match_any(&self, key: &RequestKey) -> Result<Option<CacheEntry>, StorageError> {
        for store in self.keys().await? {
            match self.get(&store, key).await {
                Ok(Some(entry)) => return Ok(Some(entry)),
                Ok(None) => {}
                // Deleted between keys() and get()
                Err(StorageError::StoreNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Write several entries into one store.
    /// Default implementation falls back to sequential puts.
    async fn put_all(&self, store: &str, entries: Vec<CacheEntry>) -> Result<usize, StorageError> {
        let count = entries.len();
        for entry in entries {
            self.put(store, entry).await?;
        }
        Ok(count)
    }

    /// Make `store` hold exactly `entries`, nothing more.
    ///
    /// Default implementation snapshots the old contents, recreates the store
    /// and writes the new entries. If a write fails the store is rebuilt from
    /// the snapshot (or removed, if it did not exist). Backends that can swap
    /// a whole store in one step should override this.
    async fn replace(&self, store: &str, entries: Vec<CacheEntry>) -> Result<usize, StorageError> {
        let previous = if self.has(store).await? {
            let mut kept = Vec::new();
            for key in self.entries(store).await? {
                if let Some(entry) = self.get(store, &key).await? {
                    kept.push(entry);
                }
            }
            Some(kept)
        } else {
            None
        };

        self.delete(store).await?;
        self.open(store).await?;

        let err = match self.put_all(store, entries).await {
            Ok(written) => return Ok(written),
            Err(e) => e,
        };

        if let Err(cleanup) = self.delete(store).await {
            warn!(store = %store, error = %cleanup, "Failed to discard partially written store");
        }
        if let Some(kept) = previous {
            let restored = match self.open(store).await {
                Ok(()) => self.put_all(store, kept).await.map(|_| ()),
                Err(e) => Err(e),
            };
            if let Err(restore) = restored {
                warn!(store = %store, error = %restore, "Failed to restore previous store contents");
            }
        }
        Err(err)
    }
}
