//! Origin fixture for integration tests
//!
//! Every test spawns its own server so route counters never leak between tests.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use cacheable_fetch::{CacheableFetch, FetchConfig};
use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const LAST_MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
pub const ETAG: &str = "33a64df551425fcc55e4d42a148795d9f25f89d4";
pub const COMPRESS_ETAG: &str = "foobar";
pub const COMPRESS_PAYLOAD: &str = r#"{"foo":"bar"}"#;

#[derive(Default)]
pub struct Counters {
    pub root: AtomicUsize,
    pub no_store: AtomicUsize,
    pub cache: AtomicUsize,
    pub not_modified: AtomicUsize,
    pub cache_then_no_store: AtomicUsize,
    pub first_error: AtomicUsize,
    pub echo: AtomicUsize,
    pub total: AtomicUsize,
}

impl Counters {
    /// Requests the origin has seen so far, on any route
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub counters: Arc<Counters>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        let counters = Arc::new(Counters::default());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let app = router(counters.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, counters }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

/// A client with its own store in a fresh temp directory
pub fn client() -> (CacheableFetch, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = FetchConfig::builder()
        .with_storage_path(dir.path())
        .with_system_proxy(false)
        .build();
    (CacheableFetch::new(config).unwrap(), dir)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn router(counters: Arc<Counters>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/no-store", get(no_store))
        .route("/cache", get(cache))
        .route("/last-modified", get(last_modified))
        .route("/etag", get(etag))
        .route("/revalidate-modified", get(revalidate_modified))
        .route("/cache-then-no-store-on-revalidate", get(cache_then_no_store))
        .route("/first-error", get(first_error))
        .route("/compress", get(compress))
        .route("/echo", any(echo))
        .layer(axum::middleware::from_fn_with_state(
            counters.clone(),
            count_requests,
        ))
        .with_state(counters)
}

async fn count_requests(
    State(counters): State<Arc<Counters>>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    counters.total.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

fn next(counter: &AtomicUsize) -> usize {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

fn header_is(headers: &HeaderMap, name: header::HeaderName, expected: &str) -> bool {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected)
}

async fn root(State(counters): State<Arc<Counters>>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=60")],
        format!("Hello - {}", next(&counters.root)),
    )
}

async fn no_store(State(counters): State<Arc<Counters>>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, no-cache, no-store")],
        next(&counters.no_store).to_string(),
    )
}

async fn cache(State(counters): State<Arc<Counters>>) -> impl IntoResponse {
    (
        [(header::CACHE_CONTROL, "public, max-age=60")],
        next(&counters.cache).to_string(),
    )
}

async fn last_modified(State(counters): State<Arc<Counters>>, headers: HeaderMap) -> Response {
    let head = [
        (header::CACHE_CONTROL, "public, max-age=0"),
        (header::LAST_MODIFIED, LAST_MODIFIED),
    ];
    if header_is(&headers, header::IF_MODIFIED_SINCE, LAST_MODIFIED) {
        next(&counters.not_modified);
        return (StatusCode::NOT_MODIFIED, head).into_response();
    }
    (head, "last modified").into_response()
}

async fn etag(State(counters): State<Arc<Counters>>, headers: HeaderMap) -> Response {
    let head = [
        (header::CACHE_CONTROL, "public, max-age=0"),
        (header::ETAG, ETAG),
    ];
    if header_is(&headers, header::IF_NONE_MATCH, ETAG) {
        next(&counters.not_modified);
        return (StatusCode::NOT_MODIFIED, head).into_response();
    }
    (head, "etag").into_response()
}

async fn revalidate_modified(headers: HeaderMap) -> Response {
    if header_is(&headers, header::IF_NONE_MATCH, ETAG) {
        return (
            [
                (header::CACHE_CONTROL, "public, max-age=0"),
                (header::ETAG, "0000000000000000000000000000000000"),
            ],
            "new-body",
        )
            .into_response();
    }
    (
        [
            (header::CACHE_CONTROL, "public, max-age=0"),
            (header::ETAG, ETAG),
        ],
        "revalidate-modified",
    )
        .into_response()
}

async fn cache_then_no_store(State(counters): State<Arc<Counters>>) -> Response {
    if next(&counters.cache_then_no_store) == 1 {
        (
            [(header::CACHE_CONTROL, "public, max-age=0")],
            "cache-then-no-store-on-revalidate",
        )
            .into_response()
    } else {
        (
            [(header::CACHE_CONTROL, "public, no-cache, no-store")],
            "no-store",
        )
            .into_response()
    }
}

async fn first_error(State(counters): State<Arc<Counters>>) -> Response {
    if next(&counters.first_error) == 1 {
        return (StatusCode::BAD_GATEWAY, "received 502").into_response();
    }
    "ok".into_response()
}

async fn compress(headers: HeaderMap) -> Response {
    if header_is(&headers, header::IF_NONE_MATCH, COMPRESS_ETAG) {
        return StatusCode::NOT_MODIFIED.into_response();
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(COMPRESS_PAYLOAD.as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();

    (
        [
            (header::CONTENT_ENCODING, "gzip"),
            (header::ETAG, COMPRESS_ETAG),
            (header::CACHE_CONTROL, "public, max-age=60"),
        ],
        compressed,
    )
        .into_response()
}

async fn echo(
    State(counters): State<Arc<Counters>>,
    method: Method,
    uri: Uri,
    body: String,
) -> impl IntoResponse {
    let payload = serde_json::json!({
        "count": next(&counters.echo),
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "body": body,
    });
    (
        [
            (header::CACHE_CONTROL, "public, max-age=60"),
            (header::CONTENT_TYPE, "application/json"),
        ],
        payload.to_string(),
    )
}
