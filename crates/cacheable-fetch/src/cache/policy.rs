//! # Cache Policy
//!
//! The narrow interface the cache manager needs from an HTTP freshness and
//! validator evaluator, plus the default implementation backed by
//! `http-cache-semantics`.

use std::time::SystemTime;

use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::cache::adapter::{PolicyRequest, PolicyResponse};
use crate::error::StoreResult;

/// Status and headers of a response as computed by the policy
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl From<PolicyResponse> for ResponseHead {
    fn from(parts: PolicyResponse) -> Self {
        Self {
            status: parts.status,
            headers: parts.headers,
        }
    }
}

/// Outcome of checking a stored response against a new request
#[derive(Debug, Clone)]
pub enum Freshness {
    /// The stored response satisfies the request without revalidation.
    /// Carries the stored status and the headers to serve (with `Age` etc.).
    Fresh(ResponseHead),
    /// The stored response must be revalidated with these request headers
    /// (the original headers plus validators such as `If-None-Match`).
    Stale { revalidation_headers: HeaderMap },
}

/// Outcome of a conditional request
#[derive(Debug, Clone)]
pub struct Revalidation<P> {
    /// Policy to persist in place of the old one
    pub policy: P,
    /// Status and headers to serve
    pub response: ResponseHead,
    /// `false` when the origin confirmed the stored body is still valid
    pub modified: bool,
}

/// HTTP caching rules for one stored response.
///
/// Implementations must follow RFC 9111 freshness and revalidation semantics.
/// The policy is persisted through serde and otherwise treated as opaque.
pub trait CachePolicy: Serialize + DeserializeOwned + Send + Sync + Sized {
    /// Build a policy for a response received for `request`
    fn evaluate(request: &PolicyRequest, response: &PolicyResponse) -> Self;

    /// Whether the stored response may serve `request` as-is
    fn before_request(&self, request: &PolicyRequest) -> Freshness;

    /// Fold the origin's answer to a conditional request into a new policy
    fn after_response(
        &self,
        request: &PolicyRequest,
        response: &PolicyResponse,
    ) -> Revalidation<Self>;

    /// Whether HTTP rules permit storing the response at all
    fn is_storable(&self) -> bool;

    fn to_metadata(&self) -> StoreResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    fn from_metadata(metadata: serde_json::Value) -> StoreResult<Self> {
        Ok(serde_json::from_value(metadata)?)
    }
}

/// Default policy, delegating to `http-cache-semantics`
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct HttpCachePolicy(http_cache_semantics::CachePolicy);

impl CachePolicy for HttpCachePolicy {
    fn evaluate(request: &PolicyRequest, response: &PolicyResponse) -> Self {
        Self(http_cache_semantics::CachePolicy::new(request, response))
    }

    fn before_request(&self, request: &PolicyRequest) -> Freshness {
        match self.0.before_request(request, SystemTime::now()) {
            http_cache_semantics::BeforeRequest::Fresh(parts) => Freshness::Fresh(parts.into()),
            http_cache_semantics::BeforeRequest::Stale { request, .. } => Freshness::Stale {
                revalidation_headers: request.headers,
            },
        }
    }

    fn after_response(
        &self,
        request: &PolicyRequest,
        response: &PolicyResponse,
    ) -> Revalidation<Self> {
        match self.0.after_response(request, response, SystemTime::now()) {
            http_cache_semantics::AfterResponse::NotModified(policy, parts) => Revalidation {
                policy: Self(policy),
                response: parts.into(),
                modified: false,
            },
            http_cache_semantics::AfterResponse::Modified(policy, parts) => Revalidation {
                policy: Self(policy),
                response: parts.into(),
                modified: true,
            },
        }
    }

    fn is_storable(&self) -> bool {
        self.0.is_storable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::adapter::{to_policy_request, to_policy_response};
    use crate::request::RequestDescriptor;
    use reqwest::header::HeaderValue;

    fn request(url: &str) -> PolicyRequest {
        to_policy_request(&RequestDescriptor::get(url).unwrap())
    }

    fn response(status: StatusCode, headers: &[(&'static str, &'static str)]) -> PolicyResponse {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.append(*name, HeaderValue::from_static(*value));
        }
        to_policy_response(status, &map)
    }

    #[test]
    fn test_no_store_is_not_storable() {
        let policy = HttpCachePolicy::evaluate(
            &request("http://origin.test/no-store"),
            &response(StatusCode::OK, &[("cache-control", "public, no-cache, no-store")]),
        );
        assert!(!policy.is_storable());
    }

    #[test]
    fn test_max_age_is_fresh() {
        let req = request("http://origin.test/cache");
        let policy = HttpCachePolicy::evaluate(
            &req,
            &response(StatusCode::OK, &[("cache-control", "public, max-age=60")]),
        );
        assert!(policy.is_storable());
        match policy.before_request(&req) {
            Freshness::Fresh(head) => {
                assert_eq!(head.status, StatusCode::OK);
                assert_eq!(
                    head.headers.get("cache-control").unwrap(),
                    "public, max-age=60"
                );
            }
            Freshness::Stale { .. } => panic!("expected a fresh response"),
        }
    }

    #[test]
    fn test_stale_response_yields_validators() {
        let req = request("http://origin.test/etag");
        let policy = HttpCachePolicy::evaluate(
            &req,
            &response(
                StatusCode::OK,
                &[("cache-control", "public, max-age=0"), ("etag", "\"v1\"")],
            ),
        );
        match policy.before_request(&req) {
            Freshness::Stale {
                revalidation_headers,
            } => {
                assert_eq!(revalidation_headers.get("if-none-match").unwrap(), "\"v1\"");
            }
            Freshness::Fresh(_) => panic!("expected a stale response"),
        }
    }

    #[test]
    fn test_not_modified_keeps_stored_status() {
        let req = request("http://origin.test/last-modified");
        let policy = HttpCachePolicy::evaluate(
            &req,
            &response(
                StatusCode::OK,
                &[
                    ("cache-control", "public, max-age=0"),
                    ("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
                ],
            ),
        );

        let revalidation_headers = match policy.before_request(&req) {
            Freshness::Stale {
                revalidation_headers,
            } => revalidation_headers,
            Freshness::Fresh(_) => panic!("expected a stale response"),
        };
        let mut conditional = req;
        conditional.headers = revalidation_headers;

        let outcome = policy.after_response(
            &conditional,
            &response(
                StatusCode::NOT_MODIFIED,
                &[
                    ("cache-control", "public, max-age=0"),
                    ("last-modified", "Wed, 21 Oct 2015 07:28:00 GMT"),
                ],
            ),
        );
        assert!(!outcome.modified);
        assert_eq!(outcome.response.status, StatusCode::OK);
    }

    #[test]
    fn test_metadata_survives_serialization() {
        let req = request("http://origin.test/cache");
        let policy = HttpCachePolicy::evaluate(
            &req,
            &response(StatusCode::OK, &[("cache-control", "public, max-age=60")]),
        );

        let metadata = policy.to_metadata().unwrap();
        let restored = HttpCachePolicy::from_metadata(metadata).unwrap();
        assert!(restored.is_storable());
        assert!(matches!(restored.before_request(&req), Freshness::Fresh(_)));
    }

    #[test]
    fn test_garbage_metadata_is_rejected() {
        let result = HttpCachePolicy::from_metadata(serde_json::json!({"st": 200}));
        assert!(result.is_err());
    }
}
