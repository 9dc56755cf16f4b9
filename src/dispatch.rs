//! Dispatching: before hooks → transport → after hooks → classify → decode.
//!
//! [`Dispatcher::send`] drives one request end to end. [`ResponseParser`] is the
//! response half on its own, for callers that perform the transport call themselves.

use crate::classify::{Classification, ParseMode, ResponseTable};
use crate::codec::{decode_buffered, decode_chunked, DecodingError};
use crate::interceptors::InterceptorChain;
use crate::request::RequestConfig;
use crate::response::RawResponse;
use crate::transport::Transport;
use crate::error::ErrorStream;
use crate::{ByteStream, Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Decoded body of a successful response.
pub enum Payload {
    /// Output of the buffered decoder.
    Buffered(Value),
    /// The live body, for variants declared with the chunked parser.
    Streaming(ByteStream),
}

impl Payload {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Payload::Buffered(v) => Some(v),
            Payload::Streaming(_) => None,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Payload::Buffered(v) => Some(v),
            Payload::Streaming(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<ByteStream> {
        match self {
            Payload::Streaming(s) => Some(s),
            Payload::Buffered(_) => None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Payload::Streaming(_))
    }

    /// Deserialize a buffered payload into `T`.
    pub fn deserialize<T: DeserializeOwned>(self) -> Result<T> {
        let target = std::any::type_name::<T>();
        match self {
            Payload::Buffered(v) => serde_json::from_value(v).map_err(|e| {
                DecodingError::Shape {
                    target,
                    reason: e.to_string(),
                }
                .into()
            }),
            Payload::Streaming(_) => Err(DecodingError::Shape {
                target,
                reason: "payload is a byte stream".into(),
            }
            .into()),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Buffered(v) => f.debug_tuple("Buffered").field(v).finish(),
            Payload::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Which variant a successful response was classified as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantTag {
    Declared { name: String },
    /// Undeclared status below 400.
    Fallback,
}

impl VariantTag {
    pub fn name(&self) -> Option<&str> {
        match self {
            VariantTag::Declared { name } => Some(name),
            VariantTag::Fallback => None,
        }
    }
}

/// A response classified as success.
#[derive(Debug)]
pub struct Success {
    pub status: StatusCode,
    pub variant: VariantTag,
    pub data: Payload,
}

impl Success {
    pub fn is_fallback(&self) -> bool {
        self.variant == VariantTag::Fallback
    }
}

/// Classify `raw` against `responses` and decode its body.
///
/// The body is decoded with the matched variant's parser before the outcome is
/// wrapped. A chunked error variant hands its live body back through
/// [`Error::into_body_stream`].
pub async fn parse_response(raw: RawResponse, responses: &ResponseTable) -> Result<Success> {
    let status = raw.status;
    let classification = responses.classify(status);

    let data = match classification.parse_mode() {
        ParseMode::Chunked => Payload::Streaming(decode_chunked(raw)),
        ParseMode::Buffered => Payload::Buffered(decode_buffered(raw).await?),
    };

    match classification {
        Classification::Declared(variant) if variant.kind == crate::VariantKind::Success => {
            Ok(Success {
                status,
                variant: VariantTag::Declared {
                    name: variant.name.clone(),
                },
                data,
            })
        }
        Classification::Declared(variant) => {
            let (data, stream) = match data {
                Payload::Buffered(v) => (v, None),
                Payload::Streaming(s) => (Value::Null, Some(ErrorStream::new(s))),
            };
            Err(Error::Protocol {
                status: status.as_u16(),
                variant: variant.name.clone(),
                data,
                stream,
            })
        }
        Classification::FallbackSuccess => Ok(Success {
            status,
            variant: VariantTag::Fallback,
            data,
        }),
        Classification::FallbackError => Err(Error::Unclassified {
            status: status.as_u16(),
            data: data.into_value().unwrap_or(Value::Null),
        }),
    }
}

/// The response half of a dispatch, detached from the transport call.
#[derive(Debug, Clone)]
pub struct ResponseParser {
    responses: ResponseTable,
    interceptors: InterceptorChain,
}

impl ResponseParser {
    pub fn new(responses: ResponseTable, interceptors: InterceptorChain) -> Self {
        Self {
            responses,
            interceptors,
        }
    }

    pub fn responses(&self) -> &ResponseTable {
        &self.responses
    }

    /// Run the `after` hooks in reverse order, then classify and decode.
    pub async fn parse(&self, raw: RawResponse) -> Result<Success> {
        let raw = self.interceptors.run_after(raw).await?;
        parse_response(raw, &self.responses).await
    }
}

/// Sends requests over an injected transport.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn send(
        &self,
        request: RequestConfig,
        interceptors: &InterceptorChain,
        responses: &ResponseTable,
        cancel: Option<CancellationToken>,
    ) -> Result<Success> {
        let request_id = Uuid::new_v4().to_string();
        let request = interceptors.run_before(request).await?;
        let method = request.method.clone();
        let url = request.url.clone();

        let start = Instant::now();
        let raw = match self.transport.send(request, cancel).await {
            Ok(raw) => raw,
            Err(e) => {
                info!(
                    request_id = request_id.as_str(),
                    method = %method,
                    url = %url,
                    duration_ms = start.elapsed().as_millis(),
                    error = %e,
                    "transport failed"
                );
                return Err(Error::Transport(e));
            }
        };

        let http_status = raw.status.as_u16();
        let raw = interceptors.run_after(raw).await?;
        let result = parse_response(raw, responses).await;

        let variant = match &result {
            Ok(s) => s.variant.name().unwrap_or("fallback"),
            Err(Error::Protocol { variant, .. }) => variant.as_str(),
            Err(_) => "-",
        };
        info!(
            request_id = request_id.as_str(),
            method = %method,
            url = %url,
            http_status,
            variant,
            duration_ms = start.elapsed().as_millis(),
            "request dispatched"
        );
        result
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}
