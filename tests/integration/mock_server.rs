//! Mock HTTP server setup for integration tests

use api_dispatch::{Client, EndpointRegistry};
use mockito::{Mock, Server, ServerGuard};
use std::sync::Once;

static TRACING: Once = Once::new();

/// Route library logs through the test writer so they show up on failures only.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("api_dispatch=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Test fixture that owns a mockito server
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        init_tracing();
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    /// Client pointed at the mock server, default reqwest transport
    pub fn client(&self, registry: EndpointRegistry) -> Client {
        Client::builder(registry)
            .base_url(&self.base_url)
            .expect("mock server URL parses")
            .build()
            .expect("client builds")
    }

    /// Mock a JSON response for `method path`
    pub async fn mock_json(&mut self, method: &str, path: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock(method, path)
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }
}
