use super::Interceptor;
use crate::request::RequestConfig;
use crate::Result;
use async_trait::async_trait;
use reqwest::header::HeaderMap;

/// Fills in default headers from layered sources.
///
/// Layers are kept highest priority first (per-call, then per-endpoint, then
/// client-wide). A header the request already carries, or one contributed by a
/// higher layer, is never overwritten.
#[derive(Debug, Clone, Default)]
pub struct HeaderDefaults {
    layers: Vec<HeaderMap>,
}

impl HeaderDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer below every layer added so far.
    pub fn layer(mut self, headers: HeaderMap) -> Self {
        if !headers.is_empty() {
            self.layers.push(headers);
        }
        self
    }

    fn apply(&self, target: &mut HeaderMap) {
        for layer in &self.layers {
            for name in layer.keys() {
                if target.contains_key(name) {
                    continue;
                }
                for value in layer.get_all(name) {
                    target.append(name.clone(), value.clone());
                }
            }
        }
    }
}

#[async_trait]
impl Interceptor for HeaderDefaults {
    async fn before(&self, mut request: RequestConfig) -> Result<RequestConfig> {
        self.apply(&mut request.headers);
        Ok(request)
    }
}
