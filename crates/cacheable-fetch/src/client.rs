//! # Client
//!
//! [`CacheableFetch`] bundles a reqwest-backed transport with an entry store
//! behind a [`CacheManager`]. [`cacheable_fetch`] is the one-call form that
//! uses a default client and the process-wide store.

use std::sync::{Arc, OnceLock};

use tracing::info;

use crate::cache::{CacheManager, EntryStore, FileStore, StoreClient, shared_store};
use crate::config::FetchConfig;
use crate::error::{FetchError, TransportError};
use crate::request::RequestDescriptor;
use crate::response::ResponseDescriptor;
use crate::transport::{ReqwestTransport, Transport};

/// HTTP client with transparent response caching
#[derive(Clone)]
pub struct CacheableFetch {
    manager: CacheManager,
}

impl CacheableFetch {
    /// Create a client with its own store at `config.store`'s location
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let path = config.store.resolved_path();
        info!(path = ?path, enabled = config.store.enabled, "Using cache store");
        let store = Arc::new(FileStore::new(path, config.store.enabled));
        Self::with_store(&config, store)
    }

    /// Create a client over the process-wide store.
    ///
    /// `config.store` is ignored; the shared store is configured from the
    /// environment when first opened.
    pub fn with_shared_store(config: FetchConfig) -> Result<Self, FetchError> {
        Self::with_store(&config, shared_store())
    }

    fn with_store(config: &FetchConfig, store: Arc<dyn EntryStore>) -> Result<Self, FetchError> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Ok(Self::from_parts(transport, store))
    }

    /// Assemble a client from an arbitrary transport and store
    pub fn from_parts(transport: Arc<dyn Transport>, store: Arc<dyn EntryStore>) -> Self {
        Self {
            manager: CacheManager::new(transport, store),
        }
    }

    pub async fn fetch(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, FetchError> {
        self.manager.handle(request).await
    }

    /// Shorthand for a plain GET
    pub async fn get(&self, url: &str) -> Result<ResponseDescriptor, FetchError> {
        self.fetch(&RequestDescriptor::get(url)?).await
    }

    pub fn manager(&self) -> &CacheManager {
        &self.manager
    }

    pub fn store(&self) -> &StoreClient {
        self.manager.store()
    }
}

static DEFAULT_TRANSPORT: OnceLock<Arc<ReqwestTransport>> = OnceLock::new();

fn default_transport() -> Result<Arc<ReqwestTransport>, TransportError> {
    if let Some(transport) = DEFAULT_TRANSPORT.get() {
        return Ok(transport.clone());
    }
    let transport = Arc::new(ReqwestTransport::new(&FetchConfig::default())?);
    Ok(DEFAULT_TRANSPORT.get_or_init(|| transport).clone())
}

/// Fetch `request` through the process-wide cache.
///
/// Uses a default-configured client and the shared store, opened from
/// `CACHEABLE_STORAGE_PATH` on first use and reopened after
/// [`close_shared_store`](crate::cache::close_shared_store).
pub async fn cacheable_fetch(request: &RequestDescriptor) -> Result<ResponseDescriptor, FetchError> {
    let manager: CacheManager = CacheManager::new(default_transport()?, shared_store());
    manager.handle(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_new_uses_configured_store_path() {
        let dir = TempDir::new().unwrap();
        let config = FetchConfig::builder()
            .with_storage_path(dir.path())
            .build();

        let client = CacheableFetch::new(config).unwrap();
        assert_eq!(client.store().inner().len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_get_rejects_invalid_url() {
        let dir = TempDir::new().unwrap();
        let client = CacheableFetch::new(FetchConfig::builder().with_storage_path(dir.path()).build())
            .unwrap();

        assert!(matches!(
            client.get("not a url").await,
            Err(FetchError::UrlError(_))
        ));
    }
}
