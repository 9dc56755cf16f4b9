//! Injected transports write bodies with the crate's own encoders

use api_dispatch::{
    Client, Endpoint, EndpointRegistry, RawResponse, RequestConfig, ResponseVariant, Transport,
    TransportError,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Answers every request with its own encoded body.
struct Echo;

#[async_trait]
impl Transport for Echo {
    async fn send(
        &self,
        request: RequestConfig,
        _cancel: Option<CancellationToken>,
    ) -> Result<RawResponse, TransportError> {
        let (content_type, body) = request.body.encode();
        let content_type = match content_type {
            Some(ct) => ct,
            None => request.header("content-type").unwrap_or_default().to_string(),
        };
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&content_type).map_err(|e| TransportError::Other(e.to_string()))?,
        );
        Ok(RawResponse::from_bytes(StatusCode::OK, headers, body))
    }
}

fn client() -> Client {
    let upload = Endpoint::builder(Method::POST, "/documents")
        .multipart()
        .body(["title", "tag", "file"])
        .respond(ResponseVariant::success("Echoed", 200))
        .build()
        .unwrap();
    let form = Endpoint::builder(Method::POST, "/login")
        .url_encoded()
        .body(["user"])
        .build()
        .unwrap();
    let registry = EndpointRegistry::new()
        .with(upload)
        .unwrap()
        .with(form)
        .unwrap();
    Client::builder(registry)
        .base_url("https://api.example.com")
        .unwrap()
        .transport(Arc::new(Echo))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_multipart_body_encoded_by_custom_transport() {
    let ok = client()
        .request(
            "POST /documents",
            json!({
                "title": "notes",
                "tag": ["a", "b"],
                "file": {
                    "$binary": "aGVsbG8gd29ybGQ=",
                    "filename": "notes.txt",
                    "contentType": "text/plain"
                }
            }),
            Default::default(),
        )
        .await
        .unwrap();

    assert_eq!(ok.variant.name(), Some("Echoed"));
    assert_eq!(
        ok.data.into_value().unwrap(),
        json!({
            "title": "notes",
            "tag": ["a", "b"],
            "file": {
                "filename": "notes.txt",
                "contentType": "text/plain",
                "$binary": "aGVsbG8gd29ybGQ="
            }
        })
    );
}

#[tokio::test]
async fn test_text_body_keeps_request_content_type() {
    let ok = client()
        .request("POST /login", json!({"user": "ops"}), Default::default())
        .await
        .unwrap();
    assert!(ok.is_fallback());
    assert_eq!(ok.data.into_value().unwrap(), json!({"user": "ops"}));
}
