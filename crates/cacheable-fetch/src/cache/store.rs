//! # Store Client
//!
//! Best-effort access to an [`EntryStore`]. Caching is an optimization, so
//! store failures are logged here and never reach the caller: a failed read
//! is a miss, a failed write or delete is dropped.
//!
//! Also home to the process-wide store handle, opened on first use and
//! closed explicitly during shutdown.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::key::CacheKey;
use crate::cache::providers::{EntryStore, FileStore};
use crate::cache::types::{CacheEntry, StoreConfig};

static SHARED_STORE: Mutex<Option<Arc<FileStore>>> = parking_lot::const_mutex(None);

/// The process-wide store, opened from `CACHEABLE_STORAGE_PATH` on first use
pub fn shared_store() -> Arc<FileStore> {
    open_shared_store(StoreConfig::from_env())
}

/// The process-wide store, opened with `config` if it is not open yet.
///
/// `config` is ignored when the store is already open.
pub fn open_shared_store(config: StoreConfig) -> Arc<FileStore> {
    let mut shared = SHARED_STORE.lock();
    shared
        .get_or_insert_with(|| {
            let path = config.resolved_path();
            debug!(path = ?path, enabled = config.enabled, "Opening shared cache store");
            Arc::new(FileStore::new(path, config.enabled))
        })
        .clone()
}

/// Release the process-wide store. The next [`shared_store`] call reopens it.
///
/// Clients created earlier keep their handle until they are dropped.
pub fn close_shared_store() {
    if SHARED_STORE.lock().take().is_some() {
        debug!("Closed shared cache store");
    }
}

#[derive(Clone)]
pub struct StoreClient {
    store: Arc<dyn EntryStore>,
}

impl StoreClient {
    pub fn new(store: Arc<dyn EntryStore>) -> Self {
        Self { store }
    }

    /// Look up an entry; any store failure reads as a miss
    pub async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read cached response");
                None
            }
        }
    }

    /// Store an entry; returns whether it was written
    pub async fn put(&self, key: &CacheKey, entry: CacheEntry) -> bool {
        match self.store.put(key, entry).await {
            Ok(()) => {
                debug!(key = %key, "Cached response");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to cache response");
                false
            }
        }
    }

    /// Remove an entry; returns whether the removal succeeded
    pub async fn delete(&self, key: &CacheKey) -> bool {
        match self.store.delete(key).await {
            Ok(()) => {
                debug!(key = %key, "Removed cached response");
                true
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to remove cached response");
                false
            }
        }
    }

    /// The underlying store, for maintenance operations
    pub fn inner(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }
}
