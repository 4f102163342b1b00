//! # Response Descriptor
//!
//! A response body is a single-consumption stream: every reading method takes
//! the body by value. Code that needs to both return a body and persist it
//! calls [`Body::buffer`] first, which reads the stream once and yields an
//! independent readable copy alongside the buffered bytes.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt, ready};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tokio::io::{AsyncRead, ReadBuf};

use crate::TransportError;
use crate::cache::CacheStatus;

pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

pub struct Body {
    kind: BodyKind,
}

enum BodyKind {
    Empty,
    Buffered(Bytes),
    Stream(BodyStream),
}

impl Body {
    pub fn empty() -> Self {
        Self {
            kind: BodyKind::Empty,
        }
    }

    pub fn from_stream(
        stream: impl Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    ) -> Self {
        Self {
            kind: BodyKind::Stream(stream.boxed()),
        }
    }

    /// Whether the body is already held in memory (or absent)
    pub fn is_buffered(&self) -> bool {
        !matches!(self.kind, BodyKind::Stream(_))
    }

    /// Read the whole body
    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        match self.kind {
            BodyKind::Empty => Ok(Bytes::new()),
            BodyKind::Buffered(bytes) => Ok(bytes),
            BodyKind::Stream(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Read the whole body as UTF-8, replacing invalid sequences
    pub async fn text(self) -> Result<String, TransportError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read the stream once and return a fresh body plus a second view of
    /// the same bytes.
    pub async fn buffer(self) -> Result<(Body, Bytes), TransportError> {
        let bytes = self.bytes().await?;
        Ok((Body::from(bytes.clone()), bytes))
    }

    pub fn into_stream(self) -> BodyStream {
        match self.kind {
            BodyKind::Empty => stream::empty().boxed(),
            BodyKind::Buffered(bytes) => stream::once(async move { Ok::<_, TransportError>(bytes) }).boxed(),
            BodyKind::Stream(stream) => stream,
        }
    }

    /// Adapt the body for `tokio::io` consumers
    pub fn into_reader(self) -> BodyReader {
        match self.kind {
            BodyKind::Empty => BodyReader {
                pending: Bytes::new(),
                rest: None,
            },
            BodyKind::Buffered(bytes) => BodyReader {
                pending: bytes,
                rest: None,
            },
            BodyKind::Stream(stream) => BodyReader {
                pending: Bytes::new(),
                rest: Some(stream),
            },
        }
    }
}

/// [`AsyncRead`] over a [`Body`].
///
/// Buffered bodies are served straight from memory. Stream errors surface
/// as `io::Error`s wrapping the [`TransportError`] and end the body.
pub struct BodyReader {
    /// Unread part of the current chunk
    pending: Bytes,
    rest: Option<BodyStream>,
}

impl AsyncRead for BodyReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = &mut *self;

        while this.pending.is_empty() {
            let Some(stream) = this.rest.as_mut() else {
                return Poll::Ready(Ok(()));
            };
            match ready!(stream.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => this.pending = chunk,
                Some(Err(e)) => {
                    this.rest = None;
                    return Poll::Ready(Err(io::Error::other(e)));
                }
                None => this.rest = None,
            }
        }

        let n = buf.remaining().min(this.pending.len());
        buf.put_slice(&this.pending.split_to(n));
        Poll::Ready(Ok(()))
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BodyKind::Empty => f.write_str("Body(empty)"),
            BodyKind::Buffered(bytes) => write!(f, "Body({} bytes)", bytes.len()),
            BodyKind::Stream(_) => f.write_str("Body(stream)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self {
            kind: BodyKind::Buffered(bytes),
        }
    }
}

impl From<Option<Bytes>> for Body {
    fn from(bytes: Option<Bytes>) -> Self {
        bytes.map(Body::from).unwrap_or_default()
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Body::from(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Body::from(Bytes::from_static(text.as_bytes()))
    }
}

#[derive(Debug)]
pub struct ResponseDescriptor {
    status: StatusCode,
    headers: HeaderMap,
    body: Body,
    cache_status: CacheStatus,
}

impl ResponseDescriptor {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            cache_status: CacheStatus::Uncached,
        }
    }

    pub(crate) fn with_cache_status(mut self, cache_status: CacheStatus) -> Self {
        self.cache_status = cache_status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// How the cache produced this response
    pub fn cache_status(&self) -> CacheStatus {
        self.cache_status
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Body) {
        (self.status, self.headers, self.body)
    }

    pub async fn bytes(self) -> Result<Bytes, TransportError> {
        self.body.bytes().await
    }

    pub async fn text(self) -> Result<String, TransportError> {
        self.body.text().await
    }

    /// Buffer the body once, returning this response with a readable copy
    /// and a second, independent view of the bytes.
    pub async fn buffer(self) -> Result<(Self, Bytes), TransportError> {
        let Self {
            status,
            headers,
            body,
            cache_status,
        } = self;
        let (body, bytes) = body.buffer().await?;
        Ok((
            Self {
                status,
                headers,
                body,
                cache_status,
            },
            bytes,
        ))
    }
}
