//! # File Store
//!
//! File-based persistent entry store. Each entry lives in a single file named
//! after the SHA-256 of its key:
//!
//! ```text
//! [u32 big-endian metadata length][metadata JSON][body bytes]
//! ```
//!
//! Writes go to a temporary file that is renamed into place, so readers see
//! either the old entry or the new one, never a mix.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io;
use tracing::{debug, warn};

use crate::cache::key::CacheKey;
use crate::cache::types::CacheEntry;
use crate::error::{StoreError, StoreResult};

use super::EntryStore;

const ENTRY_EXTENSION: &str = "entry";

/// Distinguishes temp files of concurrent writers to the same key
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
struct StoredMeta {
    /// Full key, checked on read to rule out filename collisions
    key: String,
    policy: serde_json::Value,
    has_body: bool,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    cache_dir: PathBuf,
    initialized: Arc<AtomicBool>,
    enabled: bool,
}

impl FileStore {
    /// Create a new file store in the specified directory.
    ///
    /// Nothing touches the disk until the first operation.
    pub fn new(cache_dir: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            initialized: Arc::new(AtomicBool::new(false)),
            enabled,
        }
    }

    pub fn path(&self) -> &Path {
        &self.cache_dir
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Create the store directory on first use
    pub(crate) async fn ensure_initialized(&self) -> io::Result<()> {
        // Fast path - already initialized
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        // create_dir_all tolerates concurrent callers racing here
        fs::create_dir_all(&self.cache_dir).await?;
        self.initialized.store(true, Ordering::Release);
        debug!(dir = ?self.cache_dir, "Initialized cache store directory");

        Ok(())
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir
            .join(key.to_filename())
            .with_extension(ENTRY_EXTENSION)
    }

    fn encode(key: &CacheKey, entry: CacheEntry) -> StoreResult<Bytes> {
        let meta = StoredMeta {
            key: key.as_str().to_owned(),
            policy: entry.policy,
            has_body: entry.body.is_some(),
        };
        let meta_json = serde_json::to_vec(&meta)?;
        let meta_len = u32::try_from(meta_json.len())
            .map_err(|_| StoreError::Corrupt("metadata exceeds 4 GiB".to_owned()))?;

        let body = entry.body.unwrap_or_default();
        let mut buf = BytesMut::with_capacity(4 + meta_json.len() + body.len());
        buf.put_u32(meta_len);
        buf.put_slice(&meta_json);
        buf.put_slice(&body);
        Ok(buf.freeze())
    }

    fn decode(mut raw: Bytes) -> StoreResult<(StoredMeta, Option<Bytes>)> {
        if raw.remaining() < 4 {
            return Err(StoreError::Corrupt("truncated header".to_owned()));
        }
        let meta_len = raw.get_u32() as usize;
        if raw.remaining() < meta_len {
            return Err(StoreError::Corrupt("truncated metadata".to_owned()));
        }

        let meta_json = raw.split_to(meta_len);
        let meta: StoredMeta = serde_json::from_slice(&meta_json)?;
        let body = meta.has_body.then_some(raw);
        Ok((meta, body))
    }

    /// Remove an unreadable entry without blocking the caller
    fn discard_in_background(path: PathBuf) {
        tokio::spawn(async move {
            let _ = fs::remove_file(&path).await;
        });
    }
}

#[async_trait::async_trait]
impl EntryStore for FileStore {
    async fn get(&self, key: &CacheKey) -> StoreResult<Option<CacheEntry>> {
        if !self.enabled {
            return Ok(None);
        }

        self.ensure_initialized().await?;

        let path = self.entry_path(key);
        let raw = match fs::read(&path).await {
            Ok(raw) => Bytes::from(raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let (meta, body) = match Self::decode(raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(path = ?path, error = %e, "Discarding unreadable cache entry");
                Self::discard_in_background(path);
                return Ok(None);
            }
        };

        if meta.key != key.as_str() {
            debug!(key = %key, stored = %meta.key, "Cache file belongs to a different key");
            return Ok(None);
        }

        Ok(Some(CacheEntry::new(meta.policy, body)))
    }

    async fn put(&self, key: &CacheKey, entry: CacheEntry) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }

        self.ensure_initialized().await?;

        let path = self.entry_path(key);
        let encoded = Self::encode(key, entry)?;

        // Write to a temporary file then rename, so the entry is replaced atomically
        let temp_id = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_path = path.with_extension(format!(
            "{ENTRY_EXTENSION}.{}-{temp_id}.tmp",
            std::process::id()
        ));
        if let Err(e) = fs::write(&temp_path, &encoded).await {
            warn!(path = ?temp_path, error = %e, "Failed to write cache entry file");
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            warn!(
                from = ?temp_path,
                to = ?path,
                error = %e,
                "Failed to rename temporary cache entry file"
            );
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(key = %key, bytes = encoded.len(), "Stored cache entry");
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }

        self.ensure_initialized().await?;

        let path = self.entry_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to remove cache entry file");
                Err(e.into())
            }
        }
    }

    async fn contains(&self, key: &CacheKey) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn len(&self) -> StoreResult<usize> {
        if !self.enabled {
            return Ok(0);
        }

        self.ensure_initialized().await?;

        let mut entries = fs::read_dir(&self.cache_dir).await?;
        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if StoreFile::classify(&entry.file_name()) == Some(StoreFile::Entry) {
                count += 1;
            }
        }

        Ok(count)
    }

    /// Remove every entry plus leftovers of interrupted writes.
    ///
    /// The directory may be shared with other files; only names this store
    /// produces are touched.
    async fn clear(&self) -> StoreResult<()> {
        if !self.enabled {
            return Ok(());
        }

        self.ensure_initialized().await?;

        let mut entries = match fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = ?self.cache_dir, error = %e, "Failed to read cache directory");
                return Err(e.into());
            }
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if StoreFile::classify(&entry.file_name()).is_none() || !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if let Err(e) = fs::remove_file(&path).await {
                warn!(path = ?path, error = %e, "Failed to remove cache file");
            } else {
                removed += 1;
            }
        }

        debug!(count = removed, "Cleared cache entries");
        Ok(())
    }
}

/// Kinds of file this store writes into its directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreFile {
    /// `<sha256>.entry`
    Entry,
    /// `<sha256>.entry.<pid>-<n>.tmp`, left behind by an interrupted write
    Temp,
}

impl StoreFile {
    fn classify(name: &OsStr) -> Option<Self> {
        let name = name.to_str()?;
        let (hash, rest) = name.split_once('.')?;
        if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }

        if rest == ENTRY_EXTENSION {
            return Some(StoreFile::Entry);
        }
        rest.strip_prefix(ENTRY_EXTENSION)
            .and_then(|r| r.strip_prefix('.'))
            .and_then(|r| r.strip_suffix(".tmp"))
            .filter(|writer| !writer.is_empty())
            .map(|_| StoreFile::Temp)
    }
}
