//! Registries loaded from manifest files drive real requests

use crate::mock_server::MockServerFixture;
use api_dispatch::{EndpointRegistry, Error};
use serde_json::json;

const MANIFEST: &str = r#"
endpoints:
  - method: POST
    path: /teams/{team}/schedules
    serialization: json
    routing:
      path: [team]
      body: [name, cron]
    schema:
      type: object
      required: [team, name]
      properties:
        name: { type: string, minLength: 1 }
    defaults:
      cron: "0 0 * * *"
    headers:
      x-api-version: "2"
    responses:
      - { name: Created, status: 201, kind: success }
      - { name: Conflict, status: 409, kind: error }
"#;

async fn write_manifest(ext: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("manifest-{}.{}", uuid::Uuid::new_v4(), ext));
    tokio::fs::write(&path, content).await.unwrap();
    path
}

#[tokio::test]
async fn test_yaml_manifest_file_end_to_end() {
    let path = write_manifest("yaml", MANIFEST).await;
    let registry = EndpointRegistry::load_from_file(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.ok();

    let mut fixture = MockServerFixture::new().await;
    let mock = fixture
        .server
        .mock("POST", "/teams/core/schedules")
        .match_header("x-api-version", "2")
        .match_body(mockito::Matcher::Json(json!({"name": "nightly", "cron": "0 0 * * *"})))
        .with_status(201)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id":"s1"}"#)
        .create_async()
        .await;

    let client = fixture.client(registry);
    let ok = client
        .request(
            "POST /teams/{team}/schedules",
            json!({"team": "core", "name": "nightly"}),
            Default::default(),
        )
        .await
        .unwrap();
    assert_eq!(ok.variant.name(), Some("Created"));
    mock.assert_async().await;

    let err = client
        .request(
            "POST /teams/{team}/schedules",
            json!({"team": "core", "name": ""}),
            Default::default(),
        )
        .await
        .unwrap_err();
    assert!(err.validation_errors().unwrap().by_field().contains_key("name"));
}

#[tokio::test]
async fn test_json_manifest_file() {
    let path = write_manifest(
        "json",
        r#"{"endpoints":[{"method":"GET","path":"/health"}]}"#,
    )
    .await;
    let registry = EndpointRegistry::load_from_file(&path).await.unwrap();
    tokio::fs::remove_file(&path).await.ok();
    assert_eq!(registry.keys(), vec!["GET /health"]);
}

#[tokio::test]
async fn test_missing_manifest_file() {
    let err = EndpointRegistry::load_from_file("/definitely/not/here.yaml")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}
