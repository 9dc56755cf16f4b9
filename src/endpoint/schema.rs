//! Endpoint input validation using JSON Schema.

use crate::error::ValidationErrors;
use crate::{Error, ErrorContext, Result};
use jsonschema::error::ValidationErrorKind;
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;
use std::fmt;

/// Compiled input schema of one endpoint.
pub struct InputSchema {
    raw: Value,
    compiled: JSONSchema,
}

impl InputSchema {
    pub fn compile(raw: Value) -> Result<Self> {
        let compiled = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&raw)
            .map_err(|e| {
                Error::configuration_with_context(
                    format!("Failed to compile input schema: {}", e),
                    ErrorContext::new().with_source("input_schema"),
                )
            })?;
        Ok(Self { raw, compiled })
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Collect every violation of `input`, keyed by field.
    pub fn validate(&self, endpoint: &str, input: &Value) -> std::result::Result<(), ValidationErrors> {
        let Err(errors) = self.compiled.validate(input) else {
            return Ok(());
        };
        let mut out = ValidationErrors::new(endpoint);
        for error in errors {
            let mut segments = error.instance_path.clone().into_vec();
            if let ValidationErrorKind::Required { property } = &error.kind {
                if let Some(name) = property.as_str() {
                    segments.push(name.to_string());
                }
            }
            let field = if segments.is_empty() {
                "$".to_string()
            } else {
                segments.join(".")
            };
            out.push(field, error.to_string());
        }
        Err(out)
    }
}

impl fmt::Debug for InputSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputSchema").field("raw", &self.raw).finish()
    }
}
