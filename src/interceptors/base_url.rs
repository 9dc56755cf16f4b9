use super::Interceptor;
use crate::request::{RequestConfig, SENTINEL_PREFIX};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use url::Url;

/// Rewrites `local://<rest>` request URLs to `<base>/<rest>`.
///
/// Requests whose URL does not use the sentinel scheme are left untouched.
#[derive(Debug, Clone)]
pub struct BaseUrl {
    base: Url,
}

impl BaseUrl {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn parse(base: &str) -> Result<Self> {
        let url = Url::parse(base).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(base.to_string())
                    .with_source("base_url_interceptor"),
            )
        })?;
        Ok(Self::new(url))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn rewrite(&self, url: &Url) -> Result<Url> {
        let Some(rest) = url.as_str().strip_prefix(SENTINEL_PREFIX) else {
            return Ok(url.clone());
        };
        let joined = format!(
            "{}/{}",
            self.base.as_str().trim_end_matches('/'),
            rest.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| {
            Error::serialization_with_context(
                format!("cannot join request URL onto base URL: {}", e),
                ErrorContext::new()
                    .with_details(joined.clone())
                    .with_source("base_url_interceptor"),
            )
        })
    }
}

#[async_trait]
impl Interceptor for BaseUrl {
    async fn before(&self, mut request: RequestConfig) -> Result<RequestConfig> {
        request.url = self.rewrite(&request.url)?;
        Ok(request)
    }
}
