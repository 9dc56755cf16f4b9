use super::builder::ClientBuilder;
use super::config::ClientConfig;
use super::options::RequestOptions;
use crate::dispatch::{Dispatcher, ResponseParser, Success};
use crate::endpoint::{Endpoint, EndpointRegistry};
use crate::interceptors::{BaseUrl, HeaderDefaults, InterceptorChain};
use crate::request::{header_pair, RequestConfig};
use crate::{Error, Result};
use arc_swap::ArcSwap;
use reqwest::header::AUTHORIZATION;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::Instrument;

/// Entry point for calling registered endpoints.
///
/// Cloning is cheap; clones share the registry and the configuration slot.
#[derive(Clone)]
pub struct Client {
    registry: Arc<EndpointRegistry>,
    config: Arc<ArcSwap<ClientConfig>>,
}

/// A request with every `before` hook applied, plus the parser for its response.
#[derive(Debug)]
pub struct PreparedRequest {
    pub request: RequestConfig,
    pub parser: ResponseParser,
}

impl Client {
    pub fn builder(registry: EndpointRegistry) -> ClientBuilder {
        ClientBuilder::new(registry)
    }

    pub fn new(registry: EndpointRegistry, config: ClientConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Arc<ClientConfig> {
        self.config.load_full()
    }

    /// Replace the whole configuration. Calls already in flight keep their snapshot.
    pub fn set_options(&self, config: ClientConfig) {
        tracing::debug!(
            base_url = config.base_url.as_ref().map(|u| u.as_str()).unwrap_or("-"),
            "client configuration replaced"
        );
        self.config.store(Arc::new(config));
    }

    /// Merge defaults and validate `input` for `key` without sending anything.
    pub fn validate(&self, key: &str, input: Value) -> Result<Map<String, Value>> {
        let endpoint = self.registry.resolve(key)?;
        endpoint.validate_input(input).map_err(Error::Validation)
    }

    /// Validate, build, intercept, send, classify and decode.
    pub async fn request(
        &self,
        key: &str,
        input: Value,
        options: RequestOptions,
    ) -> Result<Success> {
        let span = tracing::debug_span!("api_request", endpoint = key);
        async move {
            let endpoint = self.registry.resolve(key)?;
            let input = validated(&endpoint, input)?;
            let config = self.config.load_full();
            let chain = interceptors(&endpoint, &config, &options).await?;
            let request = endpoint.to_request(&input)?;

            Dispatcher::new(config.transport.clone())
                .send(request, &chain, endpoint.responses(), options.cancel)
                .await
        }
        .instrument(span)
        .await
    }

    /// Everything [`request`](Self::request) does up to the transport call.
    ///
    /// The caller sends `request` itself and hands the raw response to `parser`.
    pub async fn prepare(
        &self,
        key: &str,
        input: Value,
        options: RequestOptions,
    ) -> Result<PreparedRequest> {
        let endpoint = self.registry.resolve(key)?;
        let input = validated(&endpoint, input)?;
        let config = self.config.load_full();
        let chain = interceptors(&endpoint, &config, &options).await?;
        let request = chain.run_before(endpoint.to_request(&input)?).await?;

        Ok(PreparedRequest {
            request,
            parser: ResponseParser::new(endpoint.responses().clone(), chain),
        })
    }
}

fn validated(endpoint: &Endpoint, input: Value) -> Result<Map<String, Value>> {
    endpoint.validate_input(input).map_err(|errors| {
        tracing::debug!(
            endpoint = endpoint.key(),
            issues = errors.len(),
            "input rejected"
        );
        Error::Validation(errors)
    })
}

/// `[HeaderDefaults, BaseUrl, caller interceptors...]` for one call.
async fn interceptors(
    endpoint: &Endpoint,
    config: &ClientConfig,
    options: &RequestOptions,
) -> Result<InterceptorChain> {
    let mut client_headers = config.default_headers.clone();
    if let Some(token) = &config.token {
        let (_, value) = header_pair(AUTHORIZATION.as_str(), &token.authorization().await?)?;
        client_headers.insert(AUTHORIZATION, value);
    }

    let headers = HeaderDefaults::new()
        .layer(options.headers.clone())
        .layer(endpoint.headers().clone())
        .layer(client_headers);

    let mut chain = InterceptorChain::new().with(headers);
    if let Some(base) = &config.base_url {
        chain = chain.with(BaseUrl::new(base.clone()));
    }
    chain.extend(&options.interceptors);
    Ok(chain)
}
