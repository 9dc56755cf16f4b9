//! # api-dispatch
//!
//! Typed dispatch core for HTTP/JSON services.
//!
//! ## Overview
//!
//! Every endpoint of a service is described as data: an HTTP method, a path template,
//! a field routing table (which input keys become headers, query pairs, body fields or
//! path parameters), an optional JSON Schema for its input, and an ordered list of
//! declared response variants. The runtime turns a validated input object into a wire
//! request, runs it through an interceptor chain, sends it over an injected transport,
//! classifies the response by status code and decodes the body by content type.
//!
//! ## Core Philosophy
//!
//! - **Endpoints are data**: the core only knows methods, path templates, field lists,
//!   MIME types and status codes; it never interprets business meaning
//! - **Pure request construction**: requests are built against the `local://` sentinel
//!   base and rewritten to the real base URL by an interceptor at dispatch time
//! - **Closed result taxonomy**: every failure is one of the [`Error`] variants
//! - **Streaming-aware**: a response variant may select the chunked decoder and hand the
//!   live byte stream to the caller
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use api_dispatch::{Client, Endpoint, EndpointRegistry, ResponseVariant};
//! use reqwest::Method;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> api_dispatch::Result<()> {
//!     let endpoint = Endpoint::builder(Method::POST, "/schedules/{team}")
//!         .json()
//!         .path(["team"])
//!         .body(["name", "cron"])
//!         .respond(ResponseVariant::success("Created", 201))
//!         .respond(ResponseVariant::error("BadRequest", 400))
//!         .build()?;
//!
//!     let registry = EndpointRegistry::new().with(endpoint)?;
//!     let client = Client::builder(registry)
//!         .base_url("https://api.example.com/v1")?
//!         .bearer_token("secret")
//!         .build()?;
//!
//!     let created = client
//!         .request(
//!             "POST /schedules/{team}",
//!             json!({ "team": "core", "name": "nightly", "cron": "0 3 * * *" }),
//!             Default::default(),
//!         )
//!         .await?;
//!     println!("{} {:?}", created.status, created.data.as_value());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`template`] | `{name}` path template substitution |
//! | [`endpoint`] | Endpoint definitions, field routing, input schemas, registry and manifests |
//! | [`serializer`] | JSON, URL-encoded, multipart and empty request strategies |
//! | [`codec`] | Content-type keyed body decoding (buffered and chunked) |
//! | [`classify`] | Status code to declared response variant lookup |
//! | [`interceptors`] | Before/after hook chain and the standard interceptors |
//! | [`transport`] | Transport trait and the reqwest-backed default |
//! | [`dispatch`] | The dispatcher and detached response parser |
//! | [`client`] | Client configuration, validation, `request` and `prepare` |

pub mod classify;
pub mod client;
pub mod codec;
pub mod dispatch;
pub mod endpoint;
pub mod interceptors;
pub mod request;
pub mod response;
pub mod serializer;
pub mod template;
pub mod transport;

// Re-export main types for convenience
pub use classify::{Classification, ParseMode, ResponseTable, ResponseVariant, VariantKind};
pub use client::{
    ApiEndpoint, Client, ClientBuilder, ClientConfig, PreparedRequest, RequestOptions,
    TokenResolver, Typed,
};
pub use codec::{DecodingError, MediaType};
pub use dispatch::{Dispatcher, Payload, ResponseParser, Success, VariantTag};
pub use endpoint::{Endpoint, EndpointBuilder, EndpointRegistry, FieldRouting, InputSchema};
pub use interceptors::{Interceptor, InterceptorChain};
pub use request::{RequestBody, RequestConfig, SENTINEL_PREFIX};
pub use response::RawResponse;
pub use serializer::Serialization;
pub use transport::{HttpTransport, Transport, TransportError};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// The live body of a response, read chunk by chunk.
pub type ByteStream = BoxStream<'static, bytes::Bytes>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext, ErrorStream, ValidationErrors, ValidationIssue};
