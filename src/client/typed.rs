//! Statically typed calls on top of the data-driven registry.

use super::core::Client;
use super::options::RequestOptions;
use crate::dispatch::VariantTag;
use crate::{Error, ErrorContext, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Binds a registry key to Rust input and output types.
///
/// ```rust,ignore
/// struct CreateSchedule;
///
/// impl ApiEndpoint for CreateSchedule {
///     const KEY: &'static str = "POST /teams/{team}/schedules";
///     type Input = NewSchedule;
///     type Output = Schedule;
/// }
///
/// let created = client.call::<CreateSchedule>(&input, Default::default()).await?;
/// ```
pub trait ApiEndpoint {
    const KEY: &'static str;
    type Input: Serialize + Sync;
    type Output: DeserializeOwned;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Typed<T> {
    pub status: StatusCode,
    pub variant: VariantTag,
    pub data: T,
}

impl Client {
    /// [`request`](Client::request) with a serialized input and a deserialized body.
    pub async fn call<E: ApiEndpoint>(
        &self,
        input: &E::Input,
        options: RequestOptions,
    ) -> Result<Typed<E::Output>> {
        let input = serde_json::to_value(input).map_err(|e| {
            Error::serialization_with_context(
                format!("cannot serialize input: {}", e),
                ErrorContext::new()
                    .with_field_path(E::KEY)
                    .with_source("typed_call"),
            )
        })?;
        let ok = self.request(E::KEY, input, options).await?;
        Ok(Typed {
            status: ok.status,
            variant: ok.variant,
            data: ok.data.deserialize()?,
        })
    }
}
