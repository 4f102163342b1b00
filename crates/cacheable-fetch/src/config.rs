use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};

use crate::cache::StoreConfig;

const DEFAULT_USER_AGENT: &str = concat!("cacheable-fetch/", env!("CARGO_PKG_VERSION"));

/// Configurable options for a caching fetch client
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Persistent entry store configuration
    pub store: StoreConfig,

    /// Overall timeout for the entire HTTP request
    pub timeout: Duration,

    /// Connection timeout (time to establish initial connection)
    pub connect_timeout: Duration,

    /// Whether to follow redirects
    pub follow_redirects: bool,

    /// User agent string
    pub user_agent: String,

    /// Whether to honor proxy settings from the environment
    pub use_system_proxy: bool,

    /// Headers sent with every request.
    ///
    /// These are added by the transport and are not seen by the cache policy,
    /// so they should not carry anything that changes the representation.
    pub headers: HeaderMap,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::from_env(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            follow_redirects: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            use_system_proxy: true,
            headers: FetchConfig::get_default_headers(),
        }
    }
}

impl FetchConfig {
    pub fn builder() -> crate::builder::FetchConfigBuilder {
        crate::builder::FetchConfigBuilder::new()
    }

    pub fn get_default_headers() -> HeaderMap {
        let mut default_headers = HeaderMap::new();

        default_headers.insert(reqwest::header::ACCEPT, HeaderValue::from_static("*/*"));

        default_headers
    }
}
