//! Explicit endpoint registration.

use super::manifest::RegistryManifest;
use super::Endpoint;
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Endpoints keyed by `"<METHOD> <path template>"`.
///
/// Keys are unique: registering or merging a key twice is a configuration error, so
/// one module's endpoint never silently shadows another's.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: HashMap<String, Arc<Endpoint>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, endpoint: Endpoint) -> Result<()> {
        let key = endpoint.key().to_string();
        if self.endpoints.contains_key(&key) {
            return Err(duplicate(&key));
        }
        tracing::debug!(endpoint = key.as_str(), "registered endpoint");
        self.endpoints.insert(key, Arc::new(endpoint));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, endpoint: Endpoint) -> Result<Self> {
        self.register(endpoint)?;
        Ok(self)
    }

    /// Fold another registry (e.g. one per service area) into this one.
    pub fn merge(mut self, other: EndpointRegistry) -> Result<Self> {
        for (key, endpoint) in other.endpoints {
            if self.endpoints.contains_key(&key) {
                return Err(duplicate(&key));
            }
            self.endpoints.insert(key, endpoint);
        }
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<Arc<Endpoint>> {
        self.endpoints.get(key).cloned()
    }

    pub fn resolve(&self, key: &str) -> Result<Arc<Endpoint>> {
        self.get(key).ok_or_else(|| Error::EndpointNotFound {
            key: key.to_string(),
        })
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.endpoints.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn from_manifest(manifest: RegistryManifest) -> Result<Self> {
        let mut registry = Self::new();
        for spec in manifest.endpoints {
            registry.register(spec.into_endpoint()?)?;
        }
        Ok(registry)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Self::from_manifest(RegistryManifest::from_yaml_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Self::from_manifest(RegistryManifest::from_json_str(content)?)
    }

    /// Load a manifest file; `.json` files are read as JSON, anything else as YAML.
    pub async fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::configuration_with_context(
                format!("Failed to read endpoint manifest: {}", e),
                ErrorContext::new()
                    .with_details(path.display().to_string())
                    .with_source("endpoint_registry"),
            )
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }
}

fn duplicate(key: &str) -> Error {
    Error::configuration_with_context(
        format!("endpoint '{}' is already registered", key),
        ErrorContext::new()
            .with_field_path(key.to_string())
            .with_source("endpoint_registry"),
    )
}
