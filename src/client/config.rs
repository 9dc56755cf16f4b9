use crate::transport::Transport;
use crate::Result;
use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Client-wide settings. Read once per call; replaced as a whole by
/// [`Client::set_options`](crate::Client::set_options).
#[derive(Clone)]
pub struct ClientConfig {
    /// Real base URL substituted for the `local://` sentinel. Without one, requests
    /// reach the transport with sentinel URLs.
    pub base_url: Option<Url>,
    /// Lowest priority header layer.
    pub default_headers: HeaderMap,
    pub token: Option<TokenResolver>,
    pub transport: Arc<dyn Transport>,
}

impl ClientConfig {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            token: None,
            transport,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("default_headers", &self.default_headers.len())
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

type ResolveFn = dyn Fn() -> BoxFuture<'static, Result<String>> + Send + Sync;

/// Source of the `Authorization` header.
#[derive(Clone)]
pub enum TokenResolver {
    /// Used verbatim as the header value.
    Static(String),
    /// Called on every request; the token it yields is sent as `Bearer <token>`.
    Resolver(Arc<ResolveFn>),
}

impl TokenResolver {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> Result<String> + Send + Sync + 'static,
    {
        TokenResolver::Resolver(Arc::new(move || -> BoxFuture<'static, Result<String>> {
            let token = f();
            Box::pin(async move { token })
        }))
    }

    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        TokenResolver::Resolver(Arc::new(move || -> BoxFuture<'static, Result<String>> {
            Box::pin(f())
        }))
    }

    /// Header value for the next request.
    pub async fn authorization(&self) -> Result<String> {
        match self {
            TokenResolver::Static(value) => Ok(value.clone()),
            TokenResolver::Resolver(resolve) => Ok(format!("Bearer {}", resolve().await?)),
        }
    }
}

impl fmt::Debug for TokenResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenResolver::Static(_) => f.write_str("Static(<redacted>)"),
            TokenResolver::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}
