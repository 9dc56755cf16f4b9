use crate::interceptors::{Interceptor, InterceptorChain};
use crate::request::header_pair;
use crate::Result;
use reqwest::header::HeaderMap;
use tokio_util::sync::CancellationToken;

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Highest priority header layer.
    pub headers: HeaderMap,
    /// Run after the client's standard interceptors, in order.
    pub interceptors: InterceptorChain,
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn interceptor<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors = self.interceptors.with(interceptor);
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
