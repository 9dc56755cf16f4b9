//! Endpoint definitions and the registry that holds them.
//!
//! An [`Endpoint`] is pure data: method, path template, [`FieldRouting`], serialization
//! strategy, optional input schema and defaults, per-endpoint default headers, and the
//! ordered response table. Endpoints are registered explicitly in an
//! [`EndpointRegistry`], either in code or from a YAML/JSON manifest.

pub mod manifest;
pub mod registry;
pub mod routing;
pub mod schema;

pub use manifest::{EndpointSpec, RegistryManifest};
pub use registry::EndpointRegistry;
pub use routing::{FieldRouting, RAW_BODY_KEY};
pub use schema::InputSchema;

use crate::classify::{ResponseTable, ResponseVariant};
use crate::error::ValidationErrors;
use crate::request::{header_pair, RequestConfig};
use crate::serializer::Serialization;
use crate::Result;
use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Endpoint {
    key: String,
    method: Method,
    path: String,
    routing: FieldRouting,
    serialization: Serialization,
    schema: Option<Arc<InputSchema>>,
    defaults: Map<String, Value>,
    headers: HeaderMap,
    responses: ResponseTable,
}

impl Endpoint {
    pub fn builder(method: Method, path: impl Into<String>) -> EndpointBuilder {
        EndpointBuilder::new(method, path)
    }

    /// Registry key, `"<METHOD> <path template>"` (e.g. `"POST /schedules"`).
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn routing(&self) -> &FieldRouting {
        &self.routing
    }

    pub fn serialization(&self) -> Serialization {
        self.serialization
    }

    pub fn schema(&self) -> Option<&InputSchema> {
        self.schema.as_deref()
    }

    pub fn defaults(&self) -> &Map<String, Value> {
        &self.defaults
    }

    /// Per-endpoint default headers, applied below per-call headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn responses(&self) -> &ResponseTable {
        &self.responses
    }

    /// Lay caller input over the endpoint defaults. Input keys win.
    pub fn merge_defaults(&self, input: Map<String, Value>) -> Map<String, Value> {
        let mut merged = self.defaults.clone();
        merged.extend(input);
        merged
    }

    /// Merge defaults and validate against the input schema, without touching the network.
    pub fn validate_input(&self, input: Value) -> std::result::Result<Map<String, Value>, ValidationErrors> {
        let input = match input {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut errors = ValidationErrors::new(&self.key);
                errors.push("$", format!("input must be an object, got {}", type_name(&other)));
                return Err(errors);
            }
        };
        let merged = self.merge_defaults(input);
        if let Some(schema) = &self.schema {
            // Validation needs a Value; the clone is dropped right after.
            schema.validate(&self.key, &Value::Object(merged.clone()))?;
        }
        Ok(merged)
    }

    /// Build the wire request for `input` against the `local://` sentinel base.
    pub fn to_request(&self, input: &Map<String, Value>) -> Result<RequestConfig> {
        let parts = self.serialization.serialize(&self.path, input, &self.routing)?;
        Ok(RequestConfig {
            url: parts.url,
            method: self.method.clone(),
            headers: parts.headers,
            body: parts.body,
        })
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Builder for [`Endpoint`]; `build` checks the routing invariants.
pub struct EndpointBuilder {
    method: Method,
    path: String,
    routing: FieldRouting,
    serialization: Serialization,
    schema: Option<Value>,
    defaults: Map<String, Value>,
    headers: Vec<(String, String)>,
    responses: ResponseTable,
}

impl EndpointBuilder {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            routing: FieldRouting::default(),
            serialization: Serialization::Empty,
            schema: None,
            defaults: Map::new(),
            headers: Vec::new(),
            responses: ResponseTable::default(),
        }
    }

    pub fn serialization(mut self, serialization: Serialization) -> Self {
        self.serialization = serialization;
        self
    }

    pub fn json(self) -> Self {
        self.serialization(Serialization::Json)
    }

    pub fn url_encoded(self) -> Self {
        self.serialization(Serialization::UrlEncoded)
    }

    pub fn multipart(self) -> Self {
        self.serialization(Serialization::Multipart)
    }

    pub fn routing(mut self, routing: FieldRouting) -> Self {
        self.routing = routing;
        self
    }

    pub fn path<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routing = self.routing.path(keys);
        self
    }

    pub fn query<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routing = self.routing.query(keys);
        self
    }

    pub fn headers<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routing = self.routing.headers(keys);
        self
    }

    pub fn body<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.routing = self.routing.body(keys);
        self
    }

    pub fn schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn default_value(mut self, key: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(key.into(), value);
        self
    }

    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn respond(mut self, variant: ResponseVariant) -> Self {
        self.responses.push(variant);
        self
    }

    pub fn responses(mut self, responses: ResponseTable) -> Self {
        self.responses = responses;
        self
    }

    pub fn build(self) -> Result<Endpoint> {
        self.routing.validate(&self.path)?;

        let key = format!("{} {}", self.method, self.path);
        let dups = self.responses.duplicate_statuses();
        if !dups.is_empty() {
            tracing::warn!(
                endpoint = key.as_str(),
                statuses = ?dups,
                "response statuses declared more than once; the first declaration wins"
            );
        }

        let schema = self.schema.map(InputSchema::compile).transpose()?.map(Arc::new);

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let (name, value) = header_pair(name, value)?;
            headers.insert(name, value);
        }

        Ok(Endpoint {
            key,
            method: self.method,
            path: self.path,
            routing: self.routing,
            serialization: self.serialization,
            schema,
            defaults: self.defaults,
            headers,
            responses: self.responses,
        })
    }
}
