//! # Cache System
//!
//! HTTP response caching: key derivation, the policy seam, the persistent
//! entry store and the manager that ties them to a transport.

// Module declarations
mod adapter;
mod key;
mod manager;
mod policy;
pub mod providers;
mod store;
mod types;

// Re-export primary types from our various modules
pub use adapter::{PolicyRequest, PolicyResponse, to_header_map, to_policy_request, to_policy_response};
pub use key::CacheKey;
pub use manager::CacheManager;
pub use policy::{CachePolicy, Freshness, HttpCachePolicy, ResponseHead, Revalidation};
pub use store::{StoreClient, close_shared_store, open_shared_store, shared_store};
pub use types::{CacheEntry, CacheStatus, STORAGE_PATH_ENV, StoreConfig};

pub use providers::{EntryStore, FileStore};
