//! # Transport
//!
//! The network side of the cache: executes a [`RequestDescriptor`] against
//! the origin and hands back a streaming [`ResponseDescriptor`]. Responses
//! are passed through as received; in particular the default client does not
//! decode `Content-Encoding`, so stored and returned bodies keep the origin's
//! encoding and headers.

use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::TransportError;
use crate::request::{RequestBody, RequestDescriptor};
use crate::response::{Body, ResponseDescriptor};

/// Executes requests against the origin
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, TransportError>;
}

/// Create a reqwest Client with the provided configuration
pub fn create_client(config: &FetchConfig) -> Result<Client, TransportError> {
    let mut client_builder = Client::builder()
        .pool_max_idle_per_host(5)
        .user_agent(&config.user_agent)
        .default_headers(config.headers.clone())
        .redirect(if config.follow_redirects {
            reqwest::redirect::Policy::limited(10)
        } else {
            reqwest::redirect::Policy::none()
        });

    if !config.timeout.is_zero() {
        client_builder = client_builder.timeout(config.timeout);
    }

    if !config.connect_timeout.is_zero() {
        client_builder = client_builder.connect_timeout(config.connect_timeout);
    }

    if config.use_system_proxy {
        debug!("Using system proxy settings");
    } else {
        client_builder = client_builder.no_proxy();
        debug!("Proxy disabled");
    }

    let client = client_builder.build()?;
    info!(
        user_agent = %config.user_agent,
        timeout = ?config.timeout,
        follow_redirects = config.follow_redirects,
        "Created HTTP client"
    );
    Ok(client)
}

/// [`Transport`] backed by a reqwest [`Client`]
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, TransportError> {
        Ok(Self::from_client(create_client(config)?))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, TransportError> {
        let mut builder = self
            .client
            .request(request.method().clone(), request.url())
            .headers(request.headers().clone());

        match request.body() {
            Some(RequestBody::Text(text)) => builder = builder.body(text.clone()),
            Some(RequestBody::Binary(bytes)) => builder = builder.body(bytes.clone()),
            None => {}
        }

        let response = builder.send().await?;
        debug!(
            method = %request.method(),
            url = %request.url(),
            status = %response.status(),
            "Origin responded"
        );

        let status = response.status();
        let headers = response.headers().clone();
        let body = Body::from_stream(response.bytes_stream().map_err(TransportError::from));
        Ok(ResponseDescriptor::new(status, headers, body))
    }
}
