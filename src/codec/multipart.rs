//! `multipart/form-data` forms: building, encoding and parsing.
//!
//! In JSON form a file part is an object carrying its bytes base64-encoded under
//! `$binary`, plus optional `filename` and `contentType`:
//!
//! ```json
//! { "filename": "a.png", "contentType": "image/png", "$binary": "iVBORw0K..." }
//! ```

use super::{push_repeated, DecodingError};
use crate::template::stringify;
use crate::{Error, ErrorContext, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{BufMut, Bytes, BytesMut};
use serde_json::{json, Map, Value};

/// Key marking a JSON object as a file part.
pub const BINARY_KEY: &str = "$binary";

const MEDIA: &str = "multipart/form-data";

#[derive(Debug, Clone, PartialEq)]
pub struct FormPart {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    pub fn file(
        name: impl Into<String>,
        filename: Option<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            filename,
            content_type,
            data: data.into(),
        }
    }

    /// A part is a file when it carries a filename or its own content type.
    pub fn is_file(&self) -> bool {
        self.filename.is_some() || self.content_type.is_some()
    }

    fn to_value(&self) -> Value {
        if !self.is_file() {
            return Value::String(String::from_utf8_lossy(&self.data).into_owned());
        }
        let mut obj = Map::new();
        if let Some(f) = &self.filename {
            obj.insert("filename".into(), json!(f));
        }
        if let Some(ct) = &self.content_type {
            obj.insert("contentType".into(), json!(ct));
        }
        obj.insert(BINARY_KEY.into(), json!(STANDARD.encode(&self.data)));
        Value::Object(obj)
    }
}

/// An ordered list of form parts. Names may repeat.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MultipartForm {
    parts: Vec<FormPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(FormPart::text(name, value));
        self
    }

    pub fn part(mut self, part: FormPart) -> Self {
        self.parts.push(part);
        self
    }

    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Append an input value under `name`.
    ///
    /// Arrays append one part per element; `$binary` objects become file parts;
    /// everything else becomes a text part.
    pub fn append_value(&mut self, name: &str, value: &Value) -> Result<()> {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.append_value(name, item)?;
                }
            }
            Value::Object(obj) if obj.contains_key(BINARY_KEY) => {
                let encoded = obj.get(BINARY_KEY).and_then(Value::as_str).unwrap_or_default();
                let data = STANDARD.decode(encoded).map_err(|e| {
                    Error::serialization_with_context(
                        format!("invalid base64 file content: {}", e),
                        ErrorContext::new()
                            .with_field_path(format!("body.{}", name))
                            .with_source("multipart"),
                    )
                })?;
                let text_field = |key: &str| obj.get(key).and_then(Value::as_str).map(String::from);
                self.parts.push(FormPart::file(
                    name,
                    text_field("filename"),
                    text_field("contentType"),
                    data,
                ));
            }
            other => self.parts.push(FormPart::text(name, stringify(other))),
        }
        Ok(())
    }

    /// A boundary unlikely to collide with part contents.
    pub fn generate_boundary() -> String {
        format!("----api-dispatch-{}", uuid::Uuid::new_v4().simple())
    }

    pub fn content_type(boundary: &str) -> String {
        format!("{}; boundary={}", MEDIA, boundary)
    }

    /// Serialize the form with the given boundary.
    pub fn encode(&self, boundary: &str) -> Bytes {
        let mut buf = BytesMut::new();
        for part in &self.parts {
            buf.put_slice(format!("--{}\r\n", boundary).as_bytes());
            let mut disposition = format!(
                "Content-Disposition: form-data; name=\"{}\"",
                escape_quoted(&part.name)
            );
            if let Some(filename) = &part.filename {
                disposition.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
            }
            buf.put_slice(disposition.as_bytes());
            buf.put_slice(b"\r\n");
            if let Some(ct) = &part.content_type {
                buf.put_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
            }
            buf.put_slice(b"\r\n");
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(format!("--{}--\r\n", boundary).as_bytes());
        buf.freeze()
    }

    /// Parse an encoded form body.
    pub fn parse(body: &[u8], boundary: &str) -> std::result::Result<Self, DecodingError> {
        let delimiter = format!("--{}", boundary).into_bytes();
        let mut pos = find(body, &delimiter, 0).ok_or_else(|| malformed("opening boundary not found"))?
            + delimiter.len();
        let mut parts = Vec::new();

        loop {
            if body[pos..].starts_with(b"--") {
                break;
            }
            pos = skip_crlf(body, pos).ok_or_else(|| malformed("expected CRLF after boundary"))?;

            let headers_end =
                find(body, b"\r\n\r\n", pos).ok_or_else(|| malformed("unterminated part headers"))?;
            let headers = std::str::from_utf8(&body[pos..headers_end])
                .map_err(|_| malformed("part headers are not UTF-8"))?;
            let content_start = headers_end + 4;

            let mut closing = b"\r\n".to_vec();
            closing.extend_from_slice(&delimiter);
            let content_end = find(body, &closing, content_start)
                .ok_or_else(|| malformed("closing boundary not found"))?;

            parts.push(parse_part(
                headers,
                Bytes::copy_from_slice(&body[content_start..content_end]),
            )?);
            pos = content_end + closing.len();
        }

        Ok(Self { parts })
    }

    /// JSON form: object keyed by part name, repeated names collected into arrays.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        for part in &self.parts {
            push_repeated(&mut out, part.name.clone(), part.to_value());
        }
        Value::Object(out)
    }
}

fn parse_part(headers: &str, data: Bytes) -> std::result::Result<FormPart, DecodingError> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.eq_ignore_ascii_case("content-disposition") {
            for param in value.split(';').skip(1) {
                if let Some((k, v)) = param.split_once('=') {
                    let v = v.trim().trim_matches('"').to_string();
                    match k.trim().to_ascii_lowercase().as_str() {
                        "name" => name = Some(v),
                        "filename" => filename = Some(v),
                        _ => {}
                    }
                }
            }
        } else if key.eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim().to_string());
        }
    }

    Ok(FormPart {
        name: name.ok_or_else(|| malformed("part without a name"))?,
        filename,
        content_type,
        data,
    })
}

fn escape_quoted(raw: &str) -> String {
    raw.replace('"', "%22")
}

fn skip_crlf(body: &[u8], pos: usize) -> Option<usize> {
    body[pos..].starts_with(b"\r\n").then_some(pos + 2)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

fn malformed(reason: &str) -> DecodingError {
    DecodingError::Malformed {
        media: MEDIA,
        reason: reason.to_string(),
    }
}
