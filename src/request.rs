//! Wire request model shared by the serializer, interceptors and transports.

use crate::codec::multipart::MultipartForm;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

/// Placeholder base used while building requests; rewritten by the base-URL interceptor.
pub const SENTINEL_PREFIX: &str = "local://";

/// A fully built request. Interceptors receive it by value and hand back a new one.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Text(String),
    Bytes(Bytes),
    Multipart(MultipartForm),
}

impl RequestBody {
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Wire bytes for transports that write the body themselves.
    ///
    /// Multipart forms are encoded with a fresh boundary and come back with the
    /// `Content-Type` that names it. Other bodies keep the request's own header.
    pub fn encode(&self) -> (Option<String>, Bytes) {
        match self {
            RequestBody::Empty => (None, Bytes::new()),
            RequestBody::Text(text) => (None, Bytes::from(text.clone())),
            RequestBody::Bytes(bytes) => (None, bytes.clone()),
            RequestBody::Multipart(form) => {
                let boundary = MultipartForm::generate_boundary();
                (
                    Some(MultipartForm::content_type(&boundary)),
                    form.encode(&boundary),
                )
            }
        }
    }
}

impl RequestConfig {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Set a header, replacing any previous value.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether the URL still carries the `local://` placeholder base.
    pub fn is_sentinel(&self) -> bool {
        self.url.as_str().starts_with(SENTINEL_PREFIX)
    }
}

/// Validate a header name/value pair coming from endpoint data or caller input.
pub(crate) fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        Error::serialization_with_context(
            format!("invalid header name: {}", e),
            ErrorContext::new()
                .with_field_path(format!("headers.{}", name))
                .with_source("request"),
        )
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| {
        Error::serialization_with_context(
            format!("invalid header value: {}", e),
            ErrorContext::new()
                .with_field_path(format!("headers.{}", name))
                .with_source("request"),
        )
    })?;
    Ok((header_name, header_value))
}
