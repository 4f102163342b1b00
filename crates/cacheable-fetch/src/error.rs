use std::error::Error as StdError;

/// Failure while talking to the origin.
///
/// These are the only errors a caching fetch surfaces once the request has
/// been accepted; they are passed through exactly as the transport produced
/// them.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Escape hatch for custom [`Transport`](crate::transport::Transport) implementations
    #[error("Transport error: {0}")]
    Other(Box<dyn StdError + Send + Sync>),
}

// Custom error type for cacheable fetch operations
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("Invalid URL: {0}")]
    UrlError(String),

    #[error("Invalid method: {0}")]
    InvalidMethod(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Failure inside the persistent entry store.
///
/// Never surfaced to fetch callers: the store client logs these and degrades
/// to a cache miss.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt cache entry: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
