use super::{Transport, TransportError};
use crate::codec::multipart::MultipartForm;
use crate::request::{RequestBody, RequestConfig};
use crate::response::RawResponse;
use crate::{ByteStream, Error, ErrorContext, Result};
use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::Proxy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Connection settings for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpTransportConfig {
    /// Whole-request timeout. `None` leaves timing to the caller.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
    #[serde(default)]
    pub proxy_url: Option<String>,
}

fn default_pool_max_idle_per_host() -> usize {
    32
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            connect_timeout_ms: None,
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
            proxy_url: None,
        }
    }
}

/// Default transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        Self::with_config(&HttpTransportConfig::default())
    }

    pub fn with_config(config: &HttpTransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .pool_idle_timeout(Some(Duration::from_secs(config.pool_idle_timeout_secs)))
            // Conservative HTTP/2 keepalive defaults for long-lived connections.
            .http2_adaptive_window(true)
            .http2_keep_alive_interval(Some(Duration::from_secs(30)))
            .http2_keep_alive_timeout(Duration::from_secs(10));

        if let Some(ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = config.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }
        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| {
                Error::configuration_with_context(
                    format!("invalid proxy URL: {}", e),
                    ErrorContext::new()
                        .with_field_path("transport.proxy_url")
                        .with_source("http_transport"),
                )
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    fn build_request(
        &self,
        request: RequestConfig,
    ) -> std::result::Result<reqwest::RequestBuilder, TransportError> {
        if request.is_sentinel() {
            return Err(TransportError::Other(format!(
                "request URL was never resolved against a base URL: {}",
                request.url
            )));
        }
        let builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        Ok(match request.body {
            RequestBody::Empty => builder,
            RequestBody::Text(text) => builder.body(text),
            RequestBody::Bytes(bytes) => builder.body(bytes),
            RequestBody::Multipart(form) => builder.multipart(to_reqwest_form(form)?),
        })
    }
}

fn to_reqwest_form(
    form: MultipartForm,
) -> std::result::Result<reqwest::multipart::Form, TransportError> {
    let mut out = reqwest::multipart::Form::new();
    for part in form.parts() {
        let mut p = reqwest::multipart::Part::bytes(part.data.to_vec());
        if let Some(filename) = &part.filename {
            p = p.file_name(filename.clone());
        }
        if let Some(ct) = &part.content_type {
            p = p.mime_str(ct)?;
        }
        out = out.part(part.name.clone(), p);
    }
    Ok(out)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: RequestConfig,
        cancel: Option<CancellationToken>,
    ) -> std::result::Result<RawResponse, TransportError> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "sending request"
        );
        let pending = self.build_request(request)?.send();

        let resp = match &cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(TransportError::Cancelled),
                resp = pending => resp?,
            },
            None => pending.await?,
        };

        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body: ByteStream = Box::pin(
            resp.bytes_stream()
                .map_err(|e| Error::Transport(TransportError::Http(e))),
        );
        let body = match cancel {
            Some(token) => cancellable(body, token),
            None => body,
        };
        Ok(RawResponse::new(status, headers, body).with_url(url))
    }
}

/// Stop reading `body` once `token` fires; the stream then yields a single
/// `Cancelled` error and ends.
fn cancellable(body: ByteStream, token: CancellationToken) -> ByteStream {
    Box::pin(stream::unfold(Some((body, token)), |state| async move {
        let (mut body, token) = match state {
            Some(state) => state,
            None => return None,
        };
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => None,
            next = body.next() => Some(next),
        };
        match next {
            None => Some((Err(Error::Transport(TransportError::Cancelled)), None)),
            Some(None) => None,
            Some(Some(item)) => Some((item, Some((body, token)))),
        }
    }))
}
