//! # Entry Store
//!
//! This module defines the trait every persistent entry store implements.
//! Keys are used exactly as given; stores perform no normalization.

use async_trait::async_trait;

use crate::cache::key::CacheKey;
use crate::cache::types::CacheEntry;
use crate::error::StoreResult;

/// A key-value store for cache entries.
///
/// Every operation touches a single key and must be atomic for that key.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Get an entry from the store
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>>;

    /// Put an entry into the store, replacing any previous entry
    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()>;

    /// Remove an entry from the store
    async fn delete(&self, key: &CacheKey) -> StoreResult<()>;

    /// Check if the store contains an entry for the given key
    async fn contains(&self, key: &CacheKey) -> StoreResult<bool>;

    /// Number of stored entries
    async fn len(&self) -> StoreResult<usize>;

    async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Clear all entries from the store
    async fn clear(&self) -> StoreResult<()>;
}
