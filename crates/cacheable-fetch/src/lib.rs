//! # Cacheable Fetch
//!
//! An HTTP fetch layer that transparently caches responses according to
//! RFC 9111 freshness and revalidation rules, backed by a persistent entry
//! store on disk.
//!
//! ## Features
//!
//! - Fresh responses served from the store without touching the network
//! - Conditional revalidation (`If-None-Match`, `If-Modified-Since`) of stale entries
//! - Request-body aware cache keys for POST, PUT and PATCH
//! - Store failures degrade to cache misses instead of failing requests
//!
//! ## Example
//!
//! ```no_run
//! use cacheable_fetch::{CacheableFetch, FetchConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CacheableFetch::new(FetchConfig::default())?;
//! let response = client.get("https://example.com/").await?;
//! println!("{} ({:?})", response.status(), response.cache_status());
//! let _body = response.text().await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod transport;

pub use builder::FetchConfigBuilder;
pub use cache::{CacheKey, CacheManager, CacheStatus, StoreConfig, close_shared_store};
pub use client::{CacheableFetch, cacheable_fetch};
pub use config::FetchConfig;
pub use error::{FetchError, StoreError, TransportError};
pub use request::{RequestBody, RequestDescriptor};
pub use response::{Body, BodyReader, BodyStream, ResponseDescriptor};
pub use transport::{ReqwestTransport, Transport, create_client};
