use super::config::{ClientConfig, TokenResolver};
use super::core::Client;
use crate::endpoint::EndpointRegistry;
use crate::request::header_pair;
use crate::transport::{HttpTransport, HttpTransportConfig, Transport};
use crate::{Error, ErrorContext, Result};
use reqwest::header::HeaderMap;
use std::sync::Arc;
use url::Url;

/// Builder for [`Client`].
pub struct ClientBuilder {
    registry: EndpointRegistry,
    base_url: Option<Url>,
    default_headers: HeaderMap,
    token: Option<TokenResolver>,
    transport: Option<Arc<dyn Transport>>,
    transport_config: HttpTransportConfig,
}

impl ClientBuilder {
    pub fn new(registry: EndpointRegistry) -> Self {
        Self {
            registry,
            base_url: None,
            default_headers: HeaderMap::new(),
            token: None,
            transport: None,
            transport_config: HttpTransportConfig::default(),
        }
    }

    pub fn base_url(mut self, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid base URL: {}", e),
                ErrorContext::new()
                    .with_field_path("base_url")
                    .with_details(base_url.to_string())
                    .with_source("client_builder"),
            )
        })?;
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn default_header(mut self, name: &str, value: &str) -> Result<Self> {
        let (name, value) = header_pair(name, value)?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// `Authorization` value sent as given, e.g. `"Basic dXNlcjpwYXNz"`.
    pub fn token(mut self, value: impl Into<String>) -> Self {
        self.token = Some(TokenResolver::Static(value.into()));
        self
    }

    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.token = Some(TokenResolver::Static(format!("Bearer {}", token.as_ref())));
        self
    }

    pub fn token_resolver(mut self, resolver: TokenResolver) -> Self {
        self.token = Some(resolver);
        self
    }

    /// Use a custom transport instead of the default reqwest one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Settings for the default transport. Ignored when a custom transport is set.
    pub fn transport_config(mut self, config: HttpTransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    pub fn build(self) -> Result<Client> {
        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::with_config(&self.transport_config)?),
        };
        let config = ClientConfig {
            base_url: self.base_url,
            default_headers: self.default_headers,
            token: self.token,
            transport,
        };
        tracing::debug!(
            endpoints = self.registry.len(),
            base_url = config.base_url.as_ref().map(Url::as_str).unwrap_or("-"),
            "client built"
        );
        Ok(Client::new(self.registry, config))
    }
}
