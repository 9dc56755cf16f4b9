//! Transport seam: the one place a request leaves the process.
//!
//! The dispatcher only needs something that turns a [`RequestConfig`] into a
//! [`RawResponse`]. [`HttpTransport`] is the reqwest-backed default; tests and
//! embedders inject their own.

pub mod http;

pub use http::{HttpTransport, HttpTransportConfig};

use crate::request::RequestConfig;
use crate::response::RawResponse;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request`. When `cancel` fires before a response arrives the call must
    /// resolve to [`TransportError::Cancelled`].
    async fn send(
        &self,
        request: RequestConfig,
        cancel: Option<CancellationToken>,
    ) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("Transport error: {0}")]
    Other(String),

    /// Failure reported by an injected transport, passed through as-is.
    #[error(transparent)]
    Custom(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    pub fn custom(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransportError::Custom(Box::new(err))
    }
}
