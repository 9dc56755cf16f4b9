//! Body codec: content-type keyed decoding of response bodies.
//!
//! Two decoders exist. [`decode_buffered`] reads the body to completion and returns a
//! structured [`Value`]; [`decode_chunked`] hands back the live byte stream untouched.
//!
//! | MIME type | Buffered value |
//! |-----------|----------------|
//! | `application/json` | parsed JSON |
//! | `text/plain`, `text/html` | string |
//! | `application/xml`, `text/xml` | raw string |
//! | `application/x-www-form-urlencoded` | object of strings (repeated keys become arrays) |
//! | `multipart/form-data` | object keyed by part name, see [`multipart::MultipartForm::to_value`] |

pub mod multipart;

use crate::response::RawResponse;
use crate::{ByteStream, Result};
use reqwest::StatusCode;
use serde_json::{Map, Value};

pub use multipart::{FormPart, MultipartForm};

/// Response body decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodingError {
    #[error("missing content type")]
    MissingContentType,

    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("malformed {media} body: {reason}")]
    Malformed { media: &'static str, reason: String },

    #[error("decoded body does not fit {target}: {reason}")]
    Shape { target: &'static str, reason: String },
}

/// The MIME types the buffered decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Json,
    PlainText,
    Html,
    Xml,
    TextXml,
    FormUrlEncoded,
    MultipartFormData,
}

impl MediaType {
    pub const ALL: [MediaType; 7] = [
        MediaType::Json,
        MediaType::PlainText,
        MediaType::Html,
        MediaType::Xml,
        MediaType::TextXml,
        MediaType::FormUrlEncoded,
        MediaType::MultipartFormData,
    ];

    pub fn essence(&self) -> &'static str {
        match self {
            MediaType::Json => "application/json",
            MediaType::PlainText => "text/plain",
            MediaType::Html => "text/html",
            MediaType::Xml => "application/xml",
            MediaType::TextXml => "text/xml",
            MediaType::FormUrlEncoded => "application/x-www-form-urlencoded",
            MediaType::MultipartFormData => "multipart/form-data",
        }
    }

    /// Look up a `Content-Type` header value, ignoring parameters and case.
    pub fn parse(content_type: &str) -> Option<Self> {
        let essence = essence_of(content_type);
        Self::ALL
            .into_iter()
            .find(|m| m.essence().eq_ignore_ascii_case(&essence))
    }
}

fn essence_of(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Value of a `Content-Type` parameter such as `boundary` or `charset`.
pub fn content_type_param(content_type: &str, name: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if key.trim().eq_ignore_ascii_case(name) {
            Some(value.trim().trim_matches('"').to_string())
        } else {
            None
        }
    })
}

/// Read the response to completion and decode it by content type.
///
/// A 204 decodes to `null` without looking at the headers or the body.
pub async fn decode_buffered(response: RawResponse) -> Result<Value> {
    if response.status == StatusCode::NO_CONTENT {
        return Ok(Value::Null);
    }
    let content_type = response
        .content_type()
        .map(str::to_string)
        .ok_or(DecodingError::MissingContentType)?;
    // Reject unknown types before pulling the body off the wire.
    if MediaType::parse(&content_type).is_none() {
        return Err(DecodingError::UnsupportedContentType(essence_of(&content_type)).into());
    }
    let body = response.bytes().await?;
    Ok(decode_body(&content_type, &body)?)
}

/// Hand back the live body stream for incremental reading.
///
/// The stream has a single consumer and nothing is buffered on its behalf.
pub fn decode_chunked(response: RawResponse) -> ByteStream {
    response.into_body()
}

/// Decode an already buffered body according to `content_type`.
pub fn decode_body(content_type: &str, body: &[u8]) -> std::result::Result<Value, DecodingError> {
    let media = MediaType::parse(content_type)
        .ok_or_else(|| DecodingError::UnsupportedContentType(essence_of(content_type)))?;
    match media {
        MediaType::Json => serde_json::from_slice(body).map_err(|e| DecodingError::Malformed {
            media: media.essence(),
            reason: e.to_string(),
        }),
        MediaType::PlainText | MediaType::Html | MediaType::Xml | MediaType::TextXml => {
            decode_text(media, content_type_param(content_type, "charset"), body).map(Value::String)
        }
        MediaType::FormUrlEncoded => Ok(decode_form(body)),
        MediaType::MultipartFormData => {
            let boundary = content_type_param(content_type, "boundary").ok_or_else(|| {
                DecodingError::Malformed {
                    media: media.essence(),
                    reason: "content type has no boundary parameter".into(),
                }
            })?;
            Ok(MultipartForm::parse(body, &boundary)?.to_value())
        }
    }
}

/// Text in the declared charset; UTF-8 when none is given.
fn decode_text(
    media: MediaType,
    charset: Option<String>,
    body: &[u8],
) -> std::result::Result<String, DecodingError> {
    let charset = charset.map(|c| c.to_ascii_lowercase());
    match charset.as_deref() {
        None | Some("utf-8") | Some("utf8") | Some("us-ascii") => String::from_utf8(body.to_vec())
            .map_err(|e| DecodingError::Malformed {
                media: media.essence(),
                reason: e.to_string(),
            }),
        Some("iso-8859-1") | Some("latin1") => Ok(body.iter().map(|&b| char::from(b)).collect()),
        Some(other) => Err(DecodingError::Malformed {
            media: media.essence(),
            reason: format!("unsupported charset {}", other),
        }),
    }
}

fn decode_form(body: &[u8]) -> Value {
    let mut out = Map::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        push_repeated(&mut out, key.into_owned(), Value::String(value.into_owned()));
    }
    Value::Object(out)
}

/// Insert `value` under `key`, turning repeated keys into arrays.
pub(crate) fn push_repeated(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        None => {
            map.insert(key, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}
