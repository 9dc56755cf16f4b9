//! Interceptor hooks around every dispatched request.
//!
//! An interceptor sees the fully built [`RequestConfig`] before it reaches the
//! transport and the [`RawResponse`] before it is classified. Hooks run in chain order
//! on the way out and in reverse order on the way back, so the first interceptor in
//! the chain wraps all the others.
//!
//! The client always puts [`HeaderDefaults`] and [`BaseUrl`] first; caller supplied
//! interceptors follow.

mod base_url;
mod headers;
mod logging;

pub use base_url::BaseUrl;
pub use headers::HeaderDefaults;
pub use logging::TracingInterceptor;

use crate::request::RequestConfig;
use crate::response::RawResponse;
use crate::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Before/after hooks for cross-cutting concerns (auth, headers, logging, auditing).
///
/// Both hooks default to pass-through. Returning an error aborts the dispatch with it.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn before(&self, request: RequestConfig) -> Result<RequestConfig> {
        Ok(request)
    }

    async fn after(&self, response: RawResponse) -> Result<RawResponse> {
        Ok(response)
    }
}

/// Ordered interceptor list. Cloning is cheap; interceptors are shared.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Append every interceptor of `other`, keeping its order.
    pub fn extend(&mut self, other: &InterceptorChain) {
        self.interceptors.extend(other.interceptors.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every `before` hook in chain order.
    pub async fn run_before(&self, mut request: RequestConfig) -> Result<RequestConfig> {
        for interceptor in &self.interceptors {
            request = interceptor.before(request).await?;
        }
        Ok(request)
    }

    /// Run every `after` hook in reverse chain order.
    pub async fn run_after(&self, mut response: RawResponse) -> Result<RawResponse> {
        for interceptor in self.interceptors.iter().rev() {
            response = interceptor.after(response).await?;
        }
        Ok(response)
    }
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.interceptors.len())
            .finish()
    }
}

impl<I: Interceptor + 'static> FromIterator<I> for InterceptorChain {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            interceptors: iter
                .into_iter()
                .map(|i| Arc::new(i) as Arc<dyn Interceptor>)
                .collect(),
        }
    }
}

/// Interceptor built from a synchronous request closure.
pub struct BeforeFn<F>(pub F);

#[async_trait]
impl<F> Interceptor for BeforeFn<F>
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync,
{
    async fn before(&self, request: RequestConfig) -> Result<RequestConfig> {
        (self.0)(request)
    }
}

/// Interceptor built from a synchronous response closure.
pub struct AfterFn<F>(pub F);

#[async_trait]
impl<F> Interceptor for AfterFn<F>
where
    F: Fn(RawResponse) -> Result<RawResponse> + Send + Sync,
{
    async fn after(&self, response: RawResponse) -> Result<RawResponse> {
        (self.0)(response)
    }
}

pub fn before_fn<F>(f: F) -> BeforeFn<F>
where
    F: Fn(RequestConfig) -> Result<RequestConfig> + Send + Sync,
{
    BeforeFn(f)
}

pub fn after_fn<F>(f: F) -> AfterFn<F>
where
    F: Fn(RawResponse) -> Result<RawResponse> + Send + Sync,
{
    AfterFn(f)
}
