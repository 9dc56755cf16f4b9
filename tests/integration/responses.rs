//! Classification and decoding of real HTTP responses

use crate::mock_server::MockServerFixture;
use api_dispatch::{
    DecodingError, Endpoint, EndpointRegistry, Error, ResponseVariant, VariantTag,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

const KEY: &str = "POST /schedules";

fn registry() -> EndpointRegistry {
    let endpoint = Endpoint::builder(Method::POST, "/schedules")
        .json()
        .body(["name"])
        .respond(ResponseVariant::success("Created", 201))
        .respond(ResponseVariant::error("BadRequest", 400))
        .respond(ResponseVariant::error("Unauthorized", 401))
        .build()
        .unwrap();
    EndpointRegistry::new().with(endpoint).unwrap()
}

#[tokio::test]
async fn test_declared_success_variant() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_json("POST", "/schedules", 201, r#"{"id":"abc"}"#)
        .await;

    let ok = fixture
        .client(registry())
        .request(KEY, json!({"name": "n"}), Default::default())
        .await
        .unwrap();

    assert_eq!(ok.status.as_u16(), 201);
    assert_eq!(
        ok.variant,
        VariantTag::Declared {
            name: "Created".into()
        }
    );
    assert_eq!(ok.data.as_value(), Some(&json!({"id": "abc"})));
}

#[tokio::test]
async fn test_undeclared_success_uses_generic_wrapper() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_json("POST", "/schedules", 200, r#"{"id":"abc"}"#)
        .await;

    let ok = fixture
        .client(registry())
        .request(KEY, json!({"name": "n"}), Default::default())
        .await
        .unwrap();

    assert_eq!(ok.variant, VariantTag::Fallback);
    assert_eq!(ok.data.as_value(), Some(&json!({"id": "abc"})));
}

#[tokio::test]
async fn test_declared_error_variant() {
    #[derive(Deserialize)]
    struct Problem {
        field: String,
    }

    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_json("POST", "/schedules", 400, r#"{"field":"name"}"#)
        .await;

    let err = fixture
        .client(registry())
        .request(KEY, json!({"name": ""}), Default::default())
        .await
        .unwrap_err();

    match &err {
        Error::Protocol {
            status, variant, ..
        } => {
            assert_eq!(*status, 400);
            assert_eq!(variant, "BadRequest");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let problem: Problem = err.body_as().unwrap().unwrap();
    assert_eq!(problem.field, "name");
}

#[tokio::test]
async fn test_undeclared_error_is_unclassified() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .mock_json("POST", "/schedules", 404, r#"{"message":"not here"}"#)
        .await;

    let err = fixture
        .client(registry())
        .request(KEY, json!({"name": "n"}), Default::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Unclassified { status: 404, .. }));
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.body(), Some(&json!({"message": "not here"})));
}

#[tokio::test]
async fn test_no_content_decodes_to_null_regardless_of_type() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .server
        .mock("POST", "/schedules")
        .with_status(204)
        .with_header("content-type", "application/octet-stream")
        .create_async()
        .await;

    let ok = fixture
        .client(registry())
        .request(KEY, json!({"name": "n"}), Default::default())
        .await
        .unwrap();

    assert_eq!(ok.data.into_value(), Some(serde_json::Value::Null));
}

#[tokio::test]
async fn test_unsupported_content_type() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .server
        .mock("POST", "/schedules")
        .with_status(201)
        .with_header("content-type", "application/octet-stream")
        .with_body([0u8, 1, 2])
        .create_async()
        .await;

    let err = fixture
        .client(registry())
        .request(KEY, json!({"name": "n"}), Default::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Decoding(DecodingError::UnsupportedContentType(ref mime)) if mime == "application/octet-stream"
    ));
}

#[tokio::test]
async fn test_form_and_text_bodies() {
    let mut fixture = MockServerFixture::new().await;
    fixture
        .server
        .mock("POST", "/schedules")
        .with_status(201)
        .with_header("content-type", "application/x-www-form-urlencoded; charset=utf-8")
        .with_body("id=1&tag=a&tag=b")
        .create_async()
        .await;

    let ok = fixture
        .client(registry())
        .request(KEY, json!({"name": "n"}), Default::default())
        .await
        .unwrap();
    assert_eq!(
        ok.data.as_value(),
        Some(&json!({"id": "1", "tag": ["a", "b"]}))
    );
}

#[tokio::test]
async fn test_malformed_json_is_decoding_error() {
    let mut fixture = MockServerFixture::new().await;
    fixture.mock_json("POST", "/schedules", 201, "{not json").await;

    let err = fixture
        .client(registry())
        .request(KEY, json!({"name": "n"}), Default::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Decoding(DecodingError::Malformed { .. })
    ));
}
