//! # Entry Store Providers
//!
//! This module contains the persistent entry store interface and its
//! file-backed implementation.

pub use self::file::FileStore;
pub use self::provider::EntryStore;

// Provider interface
pub mod provider;

// Individual provider implementations
pub mod file;
