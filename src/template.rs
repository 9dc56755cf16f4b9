//! Path templates: `{name}` tokens filled from a parameter map.
//!
//! `{{name}}` is an escape that renders the bare identifier with both brace layers
//! removed. An unmatched `{` is left as literal text.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use serde_json::{Map, Value};

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{([A-Za-z_][A-Za-z0-9_]*)\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .expect("path token pattern is valid")
});

/// Characters left untouched by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Substitute every `{name}` token in `template` with the escaped value of `params[name]`.
///
/// Absent and `null` parameters render as an empty string.
pub fn resolve_path(template: &str, params: &Map<String, Value>) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures<'_>| {
            if let Some(escaped) = caps.get(1) {
                return escaped.as_str().to_string();
            }
            let name = &caps[2];
            match params.get(name) {
                None | Some(Value::Null) => String::new(),
                Some(value) => encode_segment(&stringify(value)),
            }
        })
        .into_owned()
}

/// Names of the tokens `resolve_path` would substitute, in order of appearance.
pub fn path_tokens(template: &str) -> Vec<String> {
    TOKEN
        .captures_iter(template)
        .filter_map(|caps| caps.get(2).map(|m| m.as_str().to_string()))
        .collect()
}

pub fn encode_component(raw: &str) -> String {
    utf8_percent_encode(raw, COMPONENT).to_string()
}

/// Component encoding for a path segment. A value of exactly `.` or `..` is
/// percent-encoded so URL parsing cannot collapse it as a dot segment.
fn encode_segment(raw: &str) -> String {
    match raw {
        "." => "%2E".to_string(),
        ".." => "%2E%2E".to_string(),
        other => encode_component(other),
    }
}

/// String form used for path, query and header values.
///
/// Strings are taken verbatim, scalars use their JSON text and composite values are
/// rendered as compact JSON.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
