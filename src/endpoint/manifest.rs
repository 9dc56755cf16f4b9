//! Endpoint manifests: the registry described as YAML or JSON data.
//!
//! ```yaml
//! endpoints:
//!   - method: POST
//!     path: /teams/{team}/schedules
//!     serialization: json
//!     routing:
//!       path: [team]
//!       body: [name, cron]
//!     schema:
//!       type: object
//!       required: [team, name]
//!     defaults:
//!       cron: "0 0 * * *"
//!     responses:
//!       - { name: Created, status: 201, kind: success }
//!       - { name: BadRequest, status: 400, kind: error }
//! ```

use super::{Endpoint, FieldRouting};
use crate::classify::ResponseVariant;
use crate::serializer::Serialization;
use crate::{Error, ErrorContext, Result};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryManifest {
    #[serde(default)]
    pub endpoints: Vec<EndpointSpec>,
}

/// One endpoint as written in a manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub serialization: Serialization,
    #[serde(default)]
    pub routing: FieldRouting,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default)]
    pub defaults: Map<String, Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub responses: Vec<ResponseVariant>,
}

impl RegistryManifest {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid endpoint manifest: {}", e),
                ErrorContext::new().with_source("manifest_yaml"),
            )
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            Error::configuration_with_context(
                format!("Invalid endpoint manifest: {}", e),
                ErrorContext::new().with_source("manifest_json"),
            )
        })
    }
}

impl EndpointSpec {
    pub fn into_endpoint(self) -> Result<Endpoint> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes()).map_err(|_| {
            Error::configuration_with_context(
                format!("invalid HTTP method '{}'", self.method),
                ErrorContext::new()
                    .with_field_path(format!("{} {}", self.method, self.path))
                    .with_source("endpoint_manifest"),
            )
        })?;

        let mut builder = Endpoint::builder(method, self.path)
            .serialization(self.serialization)
            .routing(self.routing);
        if let Some(schema) = self.schema {
            builder = builder.schema(schema);
        }
        for (key, value) in self.defaults {
            builder = builder.default_value(key, value);
        }
        for (name, value) in self.headers {
            builder = builder.default_header(name, value);
        }
        for variant in self.responses {
            builder = builder.respond(variant);
        }
        builder.build()
    }
}
