//! Cancellation and transport failures surface as transport errors

use crate::mock_server::{init_tracing, MockServerFixture};
use api_dispatch::{
    Client, Endpoint, EndpointRegistry, Error, RequestOptions, ResponseVariant, TransportError,
};
use futures::StreamExt;
use reqwest::Method;
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn registry() -> EndpointRegistry {
    let endpoint = Endpoint::builder(Method::GET, "/slow")
        .respond(ResponseVariant::success("Ok", 200))
        .build()
        .unwrap();
    let feed = Endpoint::builder(Method::GET, "/feed")
        .respond(ResponseVariant::success("Feed", 200).streaming())
        .build()
        .unwrap();
    EndpointRegistry::new()
        .with(endpoint)
        .unwrap()
        .with(feed)
        .unwrap()
}

#[tokio::test]
async fn test_cancelled_token_aborts_before_response() {
    let mut fixture = MockServerFixture::new().await;
    let _mock = fixture.mock_json("GET", "/slow", 200, "{}").await;

    let token = CancellationToken::new();
    token.cancel();

    let err = fixture
        .client(registry())
        .request(
            "GET /slow",
            json!({}),
            RequestOptions::new().cancel_token(token),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(TransportError::Cancelled)));
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    init_tracing();
    // Nothing listens on port 9 (discard) in the test environment.
    let client = Client::builder(registry())
        .base_url("http://127.0.0.1:9")
        .unwrap()
        .build()
        .unwrap();

    let err = client
        .request("GET /slow", json!({}), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Transport(TransportError::Http(_))));
}

#[tokio::test]
async fn test_cancel_stops_chunked_body() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .server
        .mock("GET", "/feed")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_chunked_body(|w| {
            w.write_all(b"one\n")?;
            w.flush()?;
            std::thread::sleep(Duration::from_millis(800));
            w.write_all(b"two\n")
        })
        .create_async()
        .await;

    let token = CancellationToken::new();
    let ok = fixture
        .client(registry())
        .request(
            "GET /feed",
            json!({}),
            RequestOptions::new().cancel_token(token.clone()),
        )
        .await
        .unwrap();
    token.cancel();

    let mut stream = ok.data.into_stream().unwrap();
    let mut buf = Vec::new();
    let mut cancelled = false;
    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => buf.extend_from_slice(&bytes),
            Err(Error::Transport(TransportError::Cancelled)) => cancelled = true,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert!(cancelled);
    assert!(!String::from_utf8_lossy(&buf).contains("two"));
}
