use super::Interceptor;
use crate::request::RequestConfig;
use crate::response::RawResponse;
use crate::Result;
use async_trait::async_trait;

/// Logs outgoing requests and incoming statuses at debug level.
#[derive(Debug, Clone, Default)]
pub struct TracingInterceptor {
    _priv: (),
}

impl TracingInterceptor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Interceptor for TracingInterceptor {
    async fn before(&self, request: RequestConfig) -> Result<RequestConfig> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            headers = request.headers.len(),
            "outgoing request"
        );
        Ok(request)
    }

    async fn after(&self, response: RawResponse) -> Result<RawResponse> {
        tracing::debug!(
            http_status = response.status.as_u16(),
            content_type = response.content_type().unwrap_or("-"),
            "incoming response"
        );
        Ok(response)
    }
}
