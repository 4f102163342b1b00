//! # Cache Key
//!
//! Keys have the form `METHOD:URL`, with `:BODYHASH` appended for POST, PUT
//! and PATCH requests that carry a textual body. The URL is used exactly as
//! the caller wrote it.

use std::fmt;

use md5::{Digest, Md5};
use reqwest::Method;

use crate::request::{RequestBody, RequestDescriptor};

const BODY_KEYED_METHODS: [Method; 3] = [Method::POST, Method::PUT, Method::PATCH];

/// Key identifying a stored response
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a request. Header order never participates.
    pub fn derive(request: &RequestDescriptor) -> Self {
        let mut key = format!("{}:{}", request.method(), request.url());

        if BODY_KEYED_METHODS.contains(request.method()) {
            if let Some(RequestBody::Text(text)) = request.body() {
                let digest = Md5::digest(text.as_bytes());
                key.push(':');
                key.push_str(&format!("{digest:x}"));
            }
        }

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to a filename-safe string
    pub fn to_filename(&self) -> String {
        use sha2::Sha256;

        let hash = Sha256::digest(self.0.as_bytes());
        format!("{hash:x}")
    }
}

impl From<String> for CacheKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CacheKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
