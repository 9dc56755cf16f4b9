//! Integration tests against a mock HTTP server

mod cancellation;
mod custom_transport;
mod manifest;
mod mock_server;
mod requests;
mod responses;
mod streaming;
