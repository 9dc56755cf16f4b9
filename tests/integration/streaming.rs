//! Chunked response variants hand back the live body

use crate::mock_server::MockServerFixture;
use api_dispatch::{Endpoint, EndpointRegistry, Error, ResponseVariant};
use futures::StreamExt;
use reqwest::Method;
use serde_json::{json, Value};
use std::io::Write;

fn registry() -> EndpointRegistry {
    let endpoint = Endpoint::builder(Method::GET, "/events")
        .query(["since"])
        .respond(ResponseVariant::success("Events", 200).streaming())
        .respond(ResponseVariant::error("Gone", 410).streaming())
        .build()
        .unwrap();
    EndpointRegistry::new().with(endpoint).unwrap()
}

#[tokio::test]
async fn test_ndjson_stream_is_read_incrementally() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .server
        .mock("GET", "/events")
        .match_query(mockito::Matcher::UrlEncoded("since".into(), "5".into()))
        .with_status(200)
        .with_header("content-type", "application/x-ndjson")
        .with_chunked_body(|w| {
            w.write_all(b"{\"seq\":6}\n")?;
            w.write_all(b"{\"seq\":7}\n")?;
            w.write_all(b"{\"seq\":8}\n")
        })
        .create_async()
        .await;

    let ok = fixture
        .client(registry())
        .request("GET /events", json!({"since": 5}), Default::default())
        .await
        .unwrap();
    assert!(ok.data.is_streaming());

    let mut stream = ok.data.into_stream().unwrap();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk.unwrap());
    }
    let seqs: Vec<u64> = buf
        .split(|b| *b == b'\n')
        .filter(|line| !line.is_empty())
        .map(|line| serde_json::from_slice::<Value>(line).unwrap()["seq"].as_u64().unwrap())
        .collect();
    assert_eq!(seqs, vec![6, 7, 8]);
}

#[tokio::test]
async fn test_chunked_error_variant_hands_back_stream() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .server
        .mock("GET", "/events")
        .with_status(410)
        .with_header("content-type", "text/event-stream")
        .with_body("event: gone\ndata: expired\n\n")
        .create_async()
        .await;

    let err = fixture
        .client(registry())
        .request("GET /events", Value::Null, Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Protocol { status: 410, .. }));
    assert_eq!(err.body(), Some(&Value::Null));

    let mut stream = err.into_body_stream().unwrap();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(buf, b"event: gone\ndata: expired\n\n");
}
