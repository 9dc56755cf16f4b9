use crate::codec::DecodingError;
use crate::transport::TransportError;
use crate::ByteStream;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "routing.query", "headers.x-trace")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected type, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "serializer", "endpoint_builder")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A single schema violation, keyed by the input field it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    /// Dotted path of the offending field; `$` for the input object itself.
    pub field: String,
    pub message: String,
}

/// Every issue found while validating one endpoint input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub endpoint: String,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            issues: Vec::new(),
        }
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Messages grouped per field, for rendering next to form inputs.
    pub fn by_field(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut out: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for issue in &self.issues {
            out.entry(issue.field.as_str())
                .or_default()
                .push(issue.message.as_str());
        }
        out
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: ", self.endpoint)?;
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", issue.field, issue.message)?;
        }
        Ok(())
    }
}

/// Body stream carried by [`Error::Protocol`] for chunked error variants.
///
/// Held behind a mutex so `Error` stays `Sync`; it is only ever taken by value.
pub struct ErrorStream(Mutex<ByteStream>);

impl ErrorStream {
    pub fn new(stream: ByteStream) -> Self {
        Self(Mutex::new(stream))
    }

    pub fn into_inner(self) -> ByteStream {
        self.0.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ErrorStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorStream(..)")
    }
}

/// Unified error type for the dispatch runtime.
///
/// `Validation` is only produced at the client boundary, before any network activity.
/// `Decoding`, `Protocol` and `Unclassified` come out of dispatching or parsing a
/// response. `Transport` carries whatever the transport reported, untouched.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Input validation failed for {0}")]
    Validation(ValidationErrors),

    #[error("Response decoding error: {0}")]
    Decoding(#[from] DecodingError),

    #[error("HTTP {status} matched declared error variant '{variant}'")]
    Protocol {
        status: u16,
        variant: String,
        /// Decoded body; `null` when the variant is chunked.
        data: serde_json::Value,
        /// Live body of a chunked error variant.
        stream: Option<ErrorStream>,
    },

    #[error("HTTP {status} did not match any declared response variant")]
    Unclassified {
        status: u16,
        data: serde_json::Value,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Endpoint not registered: {key}")]
    EndpointNotFound { key: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Request serialization error: {message}{}", format_context(.context))]
    Serialization {
        message: String,
        context: ErrorContext,
    },
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a new serialization error with structured context
    pub fn serialization_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Serialization {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::configuration_with_context(msg, ErrorContext::new())
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Serialization { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }

    /// HTTP status of the response this error was classified from, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol { status, .. } | Error::Unclassified { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded body of an error response, if any.
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Error::Protocol { data, .. } | Error::Unclassified { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Deserialize the decoded error body into a caller-chosen shape.
    pub fn body_as<T: serde::de::DeserializeOwned>(&self) -> Option<crate::Result<T>> {
        self.body().map(|data| {
            serde_json::from_value(data.clone()).map_err(|e| {
                Error::Decoding(DecodingError::Shape {
                    target: std::any::type_name::<T>(),
                    reason: e.to_string(),
                })
            })
        })
    }

    /// Live body of a chunked error variant.
    pub fn into_body_stream(self) -> Option<ByteStream> {
        match self {
            Error::Protocol {
                stream: Some(stream),
                ..
            } => Some(stream.into_inner()),
            _ => None,
        }
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Error::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
