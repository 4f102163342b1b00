//! # Cache Types
//!
//! This module defines common types used across the caching system.

use std::ffi::OsString;
use std::path::PathBuf;

use bytes::Bytes;

/// Environment variable naming the directory of the persistent entry store
pub const STORAGE_PATH_ENV: &str = "CACHEABLE_STORAGE_PATH";

/// How a response was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from the store without contacting the origin
    Hit,
    /// Fetched from the origin and stored
    Miss,
    /// Stale entry confirmed unchanged by the origin
    Revalidated,
    /// Stale entry replaced by a new representation from the origin
    Updated,
    /// Passed through from the origin without storing
    Uncached,
}

/// A persisted response: opaque policy metadata plus the response body.
///
/// Entries are always replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Serialized cache policy, stored verbatim
    pub policy: serde_json::Value,
    /// Response body, absent for empty responses
    pub body: Option<Bytes>,
}

impl CacheEntry {
    pub fn new(policy: serde_json::Value, body: Option<Bytes>) -> Self {
        Self { policy, body }
    }
}

/// Configuration for the persistent entry store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Whether caching is enabled
    pub enabled: bool,
    /// Directory for the store; system temp dir when `None`
    pub path: Option<PathBuf>,
}

impl StoreConfig {
    /// Read the store location from `CACHEABLE_STORAGE_PATH`
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var_os(STORAGE_PATH_ENV))
    }

    fn from_env_value(value: Option<OsString>) -> Self {
        let path = value.filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            enabled: true,
            path,
        }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            path: Some(path.into()),
        }
    }

    /// The directory the store will use
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("cacheable-fetch"))
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
