//! Field routing: which input keys travel as headers, query pairs, body fields or path
//! parameters.

use crate::template::path_tokens;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Sentinel body key: the whole `input["$body"]` value is the request body.
pub const RAW_BODY_KEY: &str = "$body";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRouting {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub query: Vec<String>,
    #[serde(default)]
    pub body: Vec<String>,
    #[serde(default)]
    pub path: Vec<String>,
}

impl FieldRouting {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn headers<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn query<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn body<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.body.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn path<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Whether the body bucket is exactly the `$body` sentinel.
    pub fn is_raw_body(&self) -> bool {
        self.body.len() == 1 && self.body[0] == RAW_BODY_KEY
    }

    /// Every routed key, across all buckets.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .chain(&self.query)
            .chain(&self.body)
            .chain(&self.path)
            .map(String::as_str)
    }

    /// Check the routing against the endpoint's path template.
    ///
    /// A key may appear in at most one bucket, and the path bucket must name exactly
    /// the `{token}`s of the template.
    pub fn validate(&self, template: &str) -> Result<()> {
        let mut seen: HashMap<&str, &'static str> = HashMap::new();
        let buckets: [(&'static str, &Vec<String>); 4] = [
            ("headers", &self.headers),
            ("query", &self.query),
            ("body", &self.body),
            ("path", &self.path),
        ];
        for (bucket, keys) in buckets {
            for key in keys {
                if let Some(previous) = seen.insert(key.as_str(), bucket) {
                    return Err(Error::configuration_with_context(
                        format!("key '{}' is routed to both {} and {}", key, previous, bucket),
                        ErrorContext::new()
                            .with_field_path(format!("routing.{}", bucket))
                            .with_source("field_routing"),
                    ));
                }
            }
        }

        if self.body.len() > 1 && self.body.iter().any(|k| k == RAW_BODY_KEY) {
            return Err(Error::configuration_with_context(
                format!("'{}' must be the only body key", RAW_BODY_KEY),
                ErrorContext::new()
                    .with_field_path("routing.body")
                    .with_source("field_routing"),
            ));
        }

        let declared: BTreeSet<&str> = self.path.iter().map(String::as_str).collect();
        let tokens = path_tokens(template);
        let in_template: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
        if declared != in_template {
            return Err(Error::configuration_with_context(
                format!(
                    "path keys {:?} do not match template tokens {:?}",
                    declared, in_template
                ),
                ErrorContext::new()
                    .with_field_path("routing.path")
                    .with_details(template.to_string())
                    .with_source("field_routing"),
            ));
        }
        Ok(())
    }
}
