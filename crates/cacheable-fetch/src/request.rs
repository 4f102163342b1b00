//! # Request Descriptor
//!
//! Immutable view of an outgoing request. A descriptor is built once per
//! call; revalidation derives a new one through [`RequestDescriptor::with_headers`]
//! instead of mutating the original.

use bytes::Bytes;
use http::Uri;
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::FetchError;

/// Request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Textual payload; participates in the cache key for POST, PUT and PATCH
    Text(String),
    /// Opaque payload; never hashed into the cache key
    Binary(Bytes),
}

impl RequestBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RequestBody::Text(text) => text.as_bytes(),
            RequestBody::Binary(bytes) => bytes,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(text) => Some(text),
            RequestBody::Binary(_) => None,
        }
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_owned())
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Binary(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Binary(Bytes::from(bytes))
    }
}

#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    /// Exact caller string, used verbatim in the cache key
    url: String,
    /// Parsed form of `url` handed to the policy evaluator
    uri: Uri,
    headers: HeaderMap,
    body: Option<RequestBody>,
}

impl RequestDescriptor {
    /// Create a descriptor for an absolute http(s) URL.
    ///
    /// The URL string is kept exactly as given: `https://h` and `https://h/`
    /// stay distinct.
    pub fn new(method: Method, url: impl Into<String>) -> Result<Self, FetchError> {
        let url = url.into();

        let parsed = url::Url::parse(&url).map_err(|e| FetchError::UrlError(format!("{url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::UrlError(format!(
                "{url}: unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        let uri = url
            .parse::<Uri>()
            .map_err(|e| FetchError::UrlError(format!("{url}: {e}")))?;

        Ok(Self {
            method,
            url,
            uri,
            headers: HeaderMap::new(),
            body: None,
        })
    }

    /// Create a descriptor from a textual method name, normalized to uppercase
    pub fn parse(method: &str, url: impl Into<String>) -> Result<Self, FetchError> {
        let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
            .map_err(|_| FetchError::InvalidMethod(method.to_owned()))?;
        Self::new(method, url)
    }

    pub fn get(url: impl Into<String>) -> Result<Self, FetchError> {
        Self::new(Method::GET, url)
    }

    /// Append a header, keeping any existing values for the same name
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, FetchError> {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())
            .map_err(|_| FetchError::InvalidHeader(name.as_ref().to_owned()))?;
        let value = HeaderValue::from_str(value.as_ref())
            .map_err(|_| FetchError::InvalidHeader(format!("{name}: {}", value.as_ref())))?;
        self.headers.append(name, value);
        Ok(self)
    }

    /// Derive a descriptor identical to this one except for its headers
    pub fn with_headers(&self, headers: HeaderMap) -> Self {
        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            uri: self.uri.clone(),
            headers,
            body: self.body.clone(),
        }
    }

    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_is_kept_verbatim() {
        let bare = RequestDescriptor::get("https://example.com").unwrap();
        let slashed = RequestDescriptor::get("https://example.com/").unwrap();
        assert_eq!(bare.url(), "https://example.com");
        assert_eq!(slashed.url(), "https://example.com/");
    }

    #[test]
    fn test_rejects_relative_and_non_http_urls() {
        assert!(matches!(
            RequestDescriptor::get("/relative/path"),
            Err(FetchError::UrlError(_))
        ));
        assert!(matches!(
            RequestDescriptor::get("ftp://example.com/file"),
            Err(FetchError::UrlError(_))
        ));
    }

    #[test]
    fn test_parse_uppercases_method() {
        let request = RequestDescriptor::parse("post", "https://example.com/items").unwrap();
        assert_eq!(request.method(), &Method::POST);
    }

    #[test]
    fn test_with_headers_derives_new_descriptor() {
        let original = RequestDescriptor::get("https://example.com/a")
            .unwrap()
            .with_header("Accept", "text/plain")
            .unwrap();

        let mut replaced = HeaderMap::new();
        replaced.insert("if-none-match", HeaderValue::from_static("\"abc\""));
        let derived = original.with_headers(replaced);

        assert_eq!(derived.url(), original.url());
        assert!(derived.headers().get("accept").is_none());
        assert_eq!(derived.headers().get("if-none-match").unwrap(), "\"abc\"");
        assert_eq!(original.headers().get("accept").unwrap(), "text/plain");
    }

    #[test]
    fn test_with_header_appends_repeated_values() {
        let request = RequestDescriptor::get("https://example.com/")
            .unwrap()
            .with_header("X-Tag", "a")
            .unwrap()
            .with_header("x-tag", "b")
            .unwrap();
        let values: Vec<_> = request.headers().get_all("x-tag").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
    }
}
