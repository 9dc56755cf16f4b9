//! Raw transport response: status, headers and a not-yet-consumed body stream.

use crate::{ByteStream, Result};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;
use std::fmt;
use url::Url;

/// What a transport hands back. The body is a single-consumer stream; reading it
/// consumes the response.
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Final URL reported by the transport, when it knows one.
    pub url: Option<Url>,
    body: ByteStream,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ByteStream) -> Self {
        Self {
            status,
            headers,
            url: None,
            body,
        }
    }

    /// Build a response around an already buffered body.
    pub fn from_bytes(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        let stream: ByteStream = if body.is_empty() {
            Box::pin(stream::empty::<Result<Bytes>>())
        } else {
            Box::pin(stream::once(async move { Ok::<_, crate::Error>(body) }))
        };
        Self::new(status, headers, stream)
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Replace the body, e.g. from an `after` interceptor that tees or rewrites it.
    pub fn map_body(mut self, f: impl FnOnce(ByteStream) -> ByteStream) -> Self {
        self.body = f(self.body);
        self
    }

    pub fn into_body(self) -> ByteStream {
        self.body
    }

    /// Read the whole body into memory.
    pub async fn bytes(self) -> Result<Bytes> {
        let mut body = self.body;
        let mut buf = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}
