//! Client surface: configuration, input validation, `request` and `prepare`.

mod builder;
mod config;
mod core;
mod options;
mod typed;

pub use builder::ClientBuilder;
pub use config::{ClientConfig, TokenResolver};
pub use core::{Client, PreparedRequest};
pub use options::RequestOptions;
pub use typed::{ApiEndpoint, Typed};
