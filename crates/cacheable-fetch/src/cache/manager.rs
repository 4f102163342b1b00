//! # Cache Manager
//!
//! Coordinates the transport, the policy evaluator and the entry store for
//! a single request:
//!
//! 1. derive the key and look the entry up
//! 2. serve a fresh entry without touching the network
//! 3. revalidate a stale entry with a conditional request
//! 4. otherwise fetch, and store the response when HTTP rules allow it
//!
//! Transport errors propagate unchanged. Store failures are logged by the
//! [`StoreClient`] and never fail the call.

use std::marker::PhantomData;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::cache::adapter::{to_header_map, to_policy_request, to_policy_response};
use crate::cache::key::CacheKey;
use crate::cache::policy::{CachePolicy, Freshness, HttpCachePolicy};
use crate::cache::providers::EntryStore;
use crate::cache::store::StoreClient;
use crate::cache::types::{CacheEntry, CacheStatus};
use crate::error::FetchError;
use crate::request::RequestDescriptor;
use crate::response::ResponseDescriptor;
use crate::transport::Transport;

/// Caching front for a [`Transport`]
pub struct CacheManager<P: CachePolicy = HttpCachePolicy> {
    transport: Arc<dyn Transport>,
    store: StoreClient,
    _policy: PhantomData<fn() -> P>,
}

impl<P: CachePolicy> Clone for CacheManager<P> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            store: self.store.clone(),
            _policy: PhantomData,
        }
    }
}

impl<P: CachePolicy> CacheManager<P> {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn EntryStore>) -> Self {
        Self {
            transport,
            store: StoreClient::new(store),
            _policy: PhantomData,
        }
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Answer `request` from the cache where possible, otherwise from the origin
    pub async fn handle(&self, request: &RequestDescriptor) -> Result<ResponseDescriptor, FetchError> {
        let key = CacheKey::derive(request);

        let Some(entry) = self.store.get(&key).await else {
            debug!(key = %key, "Cache miss");
            return self.fetch(&key, request).await;
        };

        let policy = match P::from_metadata(entry.policy) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding unreadable cache policy");
                return self.fetch(&key, request).await;
            }
        };

        match policy.before_request(&to_policy_request(request)) {
            Freshness::Fresh(head) => {
                debug!(key = %key, "Cache hit");
                Ok(
                    ResponseDescriptor::new(head.status, to_header_map(&head.headers), entry.body)
                        .with_cache_status(CacheStatus::Hit),
                )
            }
            Freshness::Stale {
                revalidation_headers,
            } => {
                debug!(key = %key, "Cached response is stale, revalidating");
                self.revalidate(&key, request, policy, entry.body, revalidation_headers)
                    .await
            }
        }
    }

    async fn revalidate(
        &self,
        key: &CacheKey,
        request: &RequestDescriptor,
        policy: P,
        cached_body: Option<Bytes>,
        revalidation_headers: reqwest::header::HeaderMap,
    ) -> Result<ResponseDescriptor, FetchError> {
        let conditional = request.with_headers(to_header_map(&revalidation_headers));
        let response = self.transport.execute(&conditional).await?;

        let outcome = policy.after_response(
            &to_policy_request(&conditional),
            &to_policy_response(response.status(), response.headers()),
        );

        if !outcome.modified {
            debug!(key = %key, "Origin confirmed cached response");
            self.persist(key, &outcome.policy, cached_body.clone()).await;
            return Ok(ResponseDescriptor::new(
                outcome.response.status,
                to_header_map(&outcome.response.headers),
                cached_body,
            )
            .with_cache_status(CacheStatus::Revalidated));
        }

        if !outcome.policy.is_storable() {
            debug!(key = %key, "Revalidated response is not storable, dropping entry");
            self.store.delete(key).await;
            return Ok(response.with_cache_status(CacheStatus::Uncached));
        }

        let (_, _, body) = response.into_parts();
        let (body, bytes) = body.buffer().await?;
        debug!(key = %key, size = bytes.len(), "Origin sent a new representation");
        self.persist(key, &outcome.policy, non_empty(bytes)).await;

        Ok(ResponseDescriptor::new(
            outcome.response.status,
            to_header_map(&outcome.response.headers),
            body,
        )
        .with_cache_status(CacheStatus::Updated))
    }

    async fn fetch(
        &self,
        key: &CacheKey,
        request: &RequestDescriptor,
    ) -> Result<ResponseDescriptor, FetchError> {
        let response = self.transport.execute(request).await?;

        let policy = P::evaluate(
            &to_policy_request(request),
            &to_policy_response(response.status(), response.headers()),
        );
        if !policy.is_storable() {
            debug!(key = %key, status = %response.status(), "Response is not storable");
            return Ok(response.with_cache_status(CacheStatus::Uncached));
        }

        let (response, bytes) = response.buffer().await?;
        self.persist(key, &policy, non_empty(bytes)).await;
        Ok(response.with_cache_status(CacheStatus::Miss))
    }

    async fn persist(&self, key: &CacheKey, policy: &P, body: Option<Bytes>) {
        match policy.to_metadata() {
            Ok(metadata) => {
                self.store.put(key, CacheEntry::new(metadata, body)).await;
            }
            Err(e) => warn!(key = %key, error = %e, "Failed to serialize cache policy"),
        }
    }
}

fn non_empty(bytes: Bytes) -> Option<Bytes> {
    (!bytes.is_empty()).then_some(bytes)
}
