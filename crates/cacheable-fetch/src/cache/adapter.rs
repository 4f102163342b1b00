//! # Policy Adapter
//!
//! Maps this crate's request/response shapes onto the `http` parts the
//! policy evaluator consumes, and rebuilds header multimaps from what the
//! evaluator hands back. No caching decisions are made here.

use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use crate::request::RequestDescriptor;

/// Request metadata seen by the policy evaluator
pub type PolicyRequest = http::request::Parts;

/// Response metadata seen by the policy evaluator
pub type PolicyResponse = http::response::Parts;

pub fn to_policy_request(request: &RequestDescriptor) -> PolicyRequest {
    let mut policy_request = http::Request::new(());
    *policy_request.method_mut() = request.method().clone();
    *policy_request.uri_mut() = request.uri().clone();
    *policy_request.headers_mut() = request.headers().clone();
    policy_request.into_parts().0
}

pub fn to_policy_response(status: StatusCode, headers: &HeaderMap) -> PolicyResponse {
    let mut policy_response = http::Response::new(());
    *policy_response.status_mut() = status;
    *policy_response.headers_mut() = headers.clone();
    policy_response.into_parts().0
}

/// Rebuild a header multimap from evaluator output.
///
/// Every value of a multi-valued header becomes its own occurrence, in the
/// order the evaluator lists them; values are never comma-joined. Empty
/// values are skipped.
pub fn to_header_map(policy_headers: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(policy_headers.keys_len());
    for name in policy_headers.keys() {
        for value in policy_headers.get_all(name) {
            if value.is_empty() {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}
