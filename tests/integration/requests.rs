//! Wire shape of serialized requests as seen by a real HTTP server

use crate::mock_server::MockServerFixture;
use api_dispatch::{Client, Endpoint, EndpointRegistry, RequestOptions, ResponseVariant};
use mockito::Matcher;
use reqwest::Method;
use serde_json::json;

fn registry(endpoint: Endpoint) -> EndpointRegistry {
    EndpointRegistry::new().with(endpoint).unwrap()
}

#[tokio::test]
async fn test_json_request_routes_every_bucket() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("PUT", "/teams/core%2Fops/schedules/42")
        .match_query(Matcher::Exact("dry_run=true&tag=a&tag=b".into()))
        .match_header("x-request-source", "integration")
        .match_header("content-type", "application/json")
        .match_header("accept", "application/json")
        .match_body(Matcher::Json(json!({"name": "nightly", "cron": "0 3 * * *"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;

    let endpoint = Endpoint::builder(Method::PUT, "/teams/{team}/schedules/{id}")
        .json()
        .path(["team", "id"])
        .query(["dry_run", "tag"])
        .headers(["x-request-source"])
        .body(["name", "cron"])
        .respond(ResponseVariant::success("Updated", 200))
        .build()
        .unwrap();

    let ok = fixture
        .client(registry(endpoint))
        .request(
            "PUT /teams/{team}/schedules/{id}",
            json!({
                "team": "core/ops",
                "id": 42,
                "dry_run": true,
                "tag": ["a", "b"],
                "x-request-source": "integration",
                "name": "nightly",
                "cron": "0 3 * * *"
            }),
            RequestOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(ok.variant.name(), Some("Updated"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_url_encoded_request() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/oauth/token")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body("grant_type=client_credentials&scope=read+write")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token":"t"}"#)
        .create_async()
        .await;

    let endpoint = Endpoint::builder(Method::POST, "/oauth/token")
        .url_encoded()
        .body(["grant_type", "scope"])
        .default_value("grant_type", json!("client_credentials"))
        .build()
        .unwrap();

    let ok = fixture
        .client(registry(endpoint))
        .request("POST /oauth/token", json!({"scope": "read write"}), Default::default())
        .await
        .unwrap();

    assert!(ok.is_fallback());
    assert_eq!(ok.data.as_value(), Some(&json!({"access_token": "t"})));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_multipart_request() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/documents")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="title""#.into()),
            Matcher::Regex(r#"name="file"; filename="notes.txt""#.into()),
            Matcher::Regex("hello world".into()),
        ]))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"d1"}"#)
        .create_async()
        .await;

    let endpoint = Endpoint::builder(Method::POST, "/documents")
        .multipart()
        .body(["title", "file"])
        .respond(ResponseVariant::success("Created", 201))
        .build()
        .unwrap();

    let ok = fixture
        .client(registry(endpoint))
        .request(
            "POST /documents",
            json!({
                "title": "notes",
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

    assert_eq!(ok.variant.name(), Some("Created"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_auth_and_header_layers() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("DELETE", "/schedules/9")
        .match_header("authorization", "Bearer rotated-1")
        .match_header("x-tenant", "per-call")
        .match_header("x-api-version", "2")
        .match_header("user-agent", "dispatch-tests")
        .match_header("content-type", Matcher::Missing)
        .with_status(204)
        .create_async()
        .await;

    let endpoint = Endpoint::builder(Method::DELETE, "/schedules/{id}")
        .path(["id"])
        .default_header("x-api-version", "2")
        .default_header("x-tenant", "endpoint")
        .respond(ResponseVariant::success("Deleted", 204))
        .build()
        .unwrap();

    let client = Client::builder(registry(endpoint))
        .base_url(&fixture.base_url)
        .unwrap()
        .default_header("user-agent", "dispatch-tests")
        .unwrap()
        .default_header("x-api-version", "1")
        .unwrap()
        .token_resolver(api_dispatch::TokenResolver::from_fn(|| {
            Ok("rotated-1".to_string())
        }))
        .build()
        .unwrap();

    let ok = client
        .request(
            "DELETE /schedules/{id}",
            json!({"id": 9}),
            RequestOptions::new().header("x-tenant", "per-call").unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(ok.data.as_value(), Some(&serde_json::Value::Null));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_raw_body_is_sent_verbatim() {
    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/bulk")
        .match_body(Matcher::Json(json!([{"id": 1}, {"id": 2}])))
        .with_status(202)
        .with_header("content-type", "text/plain")
        .with_body("queued")
        .create_async()
        .await;

    let endpoint = Endpoint::builder(Method::POST, "/bulk")
        .json()
        .body(["$body"])
        .build()
        .unwrap();

    let ok = fixture
        .client(registry(endpoint))
        .request(
            "POST /bulk",
            json!({"$body": [{"id": 1}, {"id": 2}]}),
            Default::default(),
        )
        .await
        .unwrap();

    assert_eq!(ok.data.as_value(), Some(&json!("queued")));
    mock.assert_async().await;
}
