//! Request serialization strategies.
//!
//! All four strategies resolve path parameters, append query pairs and copy header
//! fields the same way; they differ only in how the body bucket is encoded.

use crate::codec::multipart::MultipartForm;
use crate::endpoint::routing::{FieldRouting, RAW_BODY_KEY};
use crate::request::{header_pair, RequestBody, SENTINEL_PREFIX};
use crate::template::{path_tokens, resolve_path, stringify};
use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Serialization {
    Json,
    UrlEncoded,
    Multipart,
    /// No body and no body headers (GET, DELETE, payload-less POST).
    #[default]
    Empty,
}

/// URL, headers and body produced for one input.
#[derive(Debug, Clone)]
pub struct SerializedRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl Serialization {
    pub fn serialize(
        self,
        template: &str,
        input: &Map<String, Value>,
        routing: &FieldRouting,
    ) -> Result<SerializedRequest> {
        let url = build_url(template, input, routing)?;
        let mut headers = routed_headers(input, routing)?;

        let body = match self {
            Serialization::Json => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
                headers.insert(ACCEPT, HeaderValue::from_static(JSON));
                json_body(input, routing)?
            }
            Serialization::UrlEncoded => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM));
                headers.insert(ACCEPT, HeaderValue::from_static(JSON));
                RequestBody::Text(form_body(input, routing))
            }
            Serialization::Multipart => {
                // Content-Type carries the boundary and is set when the form is encoded.
                headers.insert(ACCEPT, HeaderValue::from_static(JSON));
                RequestBody::Multipart(multipart_body(input, routing)?)
            }
            Serialization::Empty => RequestBody::Empty,
        };

        Ok(SerializedRequest { url, headers, body })
    }
}

/// `local://` URL with the path resolved and the query bucket appended.
///
/// A path parameter equal to `.` or `..` is rejected: URL parsing collapses dot
/// segments even when percent-encoded, which would address a different resource.
pub fn build_url(template: &str, input: &Map<String, Value>, routing: &FieldRouting) -> Result<Url> {
    for name in path_tokens(template) {
        if let Some(value) = input.get(&name) {
            let segment = stringify(value);
            if segment == "." || segment == ".." {
                return Err(Error::serialization_with_context(
                    format!("path parameter '{}' cannot be a dot segment", name),
                    ErrorContext::new()
                        .with_field_path(name.clone())
                        .with_details(segment)
                        .with_source("serializer"),
                ));
            }
        }
    }

    let path = resolve_path(template, input);
    let raw = format!("{}/{}", SENTINEL_PREFIX, path.trim_start_matches('/'));
    let mut url = Url::parse(&raw).map_err(|e| {
        Error::serialization_with_context(
            format!("cannot build request URL: {}", e),
            ErrorContext::new()
                .with_details(raw.clone())
                .with_source("serializer"),
        )
    })?;

    let pairs = query_pairs(input, &routing.query);
    if !pairs.is_empty() {
        url.query_pairs_mut().extend_pairs(pairs);
    }
    Ok(url)
}

/// Query pairs in routing order: arrays repeat the key, absent keys are skipped.
fn query_pairs(input: &Map<String, Value>, keys: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for key in keys {
        match input.get(key) {
            None => {}
            Some(Value::Array(items)) => {
                pairs.extend(items.iter().map(|item| (key.clone(), stringify(item))));
            }
            Some(value) => pairs.push((key.clone(), stringify(value))),
        }
    }
    pairs
}

fn routed_headers(input: &Map<String, Value>, routing: &FieldRouting) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for key in &routing.headers {
        if let Some(value) = input.get(key) {
            let (name, value) = header_pair(key, &stringify(value))?;
            headers.insert(name, value);
        }
    }
    Ok(headers)
}

fn json_body(input: &Map<String, Value>, routing: &FieldRouting) -> Result<RequestBody> {
    if routing.is_raw_body() {
        return match input.get(RAW_BODY_KEY) {
            None => Ok(RequestBody::Empty),
            Some(raw) => Ok(RequestBody::Text(to_json(raw)?)),
        };
    }
    let body: Map<String, Value> = routing
        .body
        .iter()
        .filter_map(|key| input.get(key).map(|v| (key.clone(), v.clone())))
        .collect();
    Ok(RequestBody::Text(to_json(&Value::Object(body))?))
}

fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| {
        Error::serialization_with_context(
            e.to_string(),
            ErrorContext::new().with_source("serializer"),
        )
    })
}

fn form_body(input: &Map<String, Value>, routing: &FieldRouting) -> String {
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    form.extend_pairs(query_pairs(input, &routing.body));
    form.finish()
}

fn multipart_body(input: &Map<String, Value>, routing: &FieldRouting) -> Result<MultipartForm> {
    let mut form = MultipartForm::new();
    for key in &routing.body {
        if let Some(value) = input.get(key) {
            form.append_value(key, value)?;
        }
    }
    Ok(form)
}
