//! Response classification: status code → declared response variant.
//!
//! Each endpoint declares an ordered table of variants. The first entry whose status
//! equals the actual status wins; duplicates are resolved by declaration order.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantKind {
    Success,
    Error,
}

/// Which body decoder a variant selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    #[default]
    Buffered,
    Chunked,
}

/// One declared (status, kind) pair of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseVariant {
    pub name: String,
    pub status: u16,
    pub kind: VariantKind,
    #[serde(default)]
    pub parse: ParseMode,
    /// Descriptive JSON Schema of the body. Carried as data, never enforced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Value>,
}

impl ResponseVariant {
    pub fn new(name: impl Into<String>, status: u16, kind: VariantKind) -> Self {
        Self {
            name: name.into(),
            status,
            kind,
            parse: ParseMode::Buffered,
            shape: None,
        }
    }

    pub fn success(name: impl Into<String>, status: u16) -> Self {
        Self::new(name, status, VariantKind::Success)
    }

    pub fn error(name: impl Into<String>, status: u16) -> Self {
        Self::new(name, status, VariantKind::Error)
    }

    /// Select the chunked decoder for this variant.
    pub fn streaming(mut self) -> Self {
        self.parse = ParseMode::Chunked;
        self
    }

    pub fn with_shape(mut self, shape: Value) -> Self {
        self.shape = Some(shape);
        self
    }
}

/// First variant in declaration order whose status equals `status`.
pub fn classify(status: u16, variants: &[ResponseVariant]) -> Option<&ResponseVariant> {
    variants.iter().find(|v| v.status == status)
}

/// Outcome of looking up a status in a [`ResponseTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification<'a> {
    Declared(&'a ResponseVariant),
    /// No declared variant; the status is below 400.
    FallbackSuccess,
    /// No declared variant; the status is 400 or above.
    FallbackError,
}

impl Classification<'_> {
    pub fn kind(&self) -> VariantKind {
        match self {
            Classification::Declared(v) => v.kind,
            Classification::FallbackSuccess => VariantKind::Success,
            Classification::FallbackError => VariantKind::Error,
        }
    }

    /// Parser to run. Fallbacks always buffer.
    pub fn parse_mode(&self) -> ParseMode {
        match self {
            Classification::Declared(v) => v.parse,
            _ => ParseMode::Buffered,
        }
    }

    pub fn variant_name(&self) -> Option<&str> {
        match self {
            Classification::Declared(v) => Some(v.name.as_str()),
            _ => None,
        }
    }
}

/// The ordered variant list of one endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseTable {
    variants: Vec<ResponseVariant>,
}

impl ResponseTable {
    pub fn new(variants: Vec<ResponseVariant>) -> Self {
        Self { variants }
    }

    pub fn push(&mut self, variant: ResponseVariant) {
        self.variants.push(variant);
    }

    pub fn variants(&self) -> &[ResponseVariant] {
        &self.variants
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    pub fn classify(&self, status: StatusCode) -> Classification<'_> {
        match classify(status.as_u16(), &self.variants) {
            Some(v) => Classification::Declared(v),
            None if status.as_u16() < 400 => Classification::FallbackSuccess,
            None => Classification::FallbackError,
        }
    }

    /// Statuses declared more than once; only the first declaration is reachable.
    pub fn duplicate_statuses(&self) -> Vec<u16> {
        let mut seen = std::collections::HashSet::new();
        let mut dups = Vec::new();
        for v in &self.variants {
            if !seen.insert(v.status) && !dups.contains(&v.status) {
                dups.push(v.status);
            }
        }
        dups
    }
}

impl FromIterator<ResponseVariant> for ResponseTable {
    fn from_iter<I: IntoIterator<Item = ResponseVariant>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
