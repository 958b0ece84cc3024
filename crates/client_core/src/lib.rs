use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{greet_route, GreetRequest, GreetResponse},
};
use tracing::{debug, warn};

pub mod config;
pub mod error;
pub mod submission;

pub use config::{GreeterConfig, DEFAULT_SERVER_URL};
pub use error::{ConfigError, GreetError};
pub use submission::{
    FormSurface, SubmissionController, SubmissionState, SubmitEvent, SubmitOutcome,
};

/// The one remote operation the front ends depend on.
///
/// Implementations do not validate `name` and do not impose a timeout.
#[async_trait]
pub trait RemoteGreeter: Send + Sync {
    async fn greet(&self, name: &str) -> Result<String, GreetError>;
}

#[async_trait]
impl<G> RemoteGreeter for Arc<G>
where
    G: RemoteGreeter + ?Sized,
{
    async fn greet(&self, name: &str) -> Result<String, GreetError> {
        (**self).greet(name).await
    }
}

#[async_trait]
impl<G> RemoteGreeter for &G
where
    G: RemoteGreeter + ?Sized,
{
    async fn greet(&self, name: &str) -> Result<String, GreetError> {
        (**self).greet(name).await
    }
}

/// `RemoteGreeter` over the greeting service's JSON HTTP API.
#[derive(Clone)]
pub struct HttpGreeter {
    http: Client,
    server_url: String,
}

impl HttpGreeter {
    pub fn new(config: &GreeterConfig) -> Result<Self, ConfigError> {
        let http = Client::builder().build()?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: Client, config: &GreeterConfig) -> Self {
        Self {
            http,
            server_url: config.server_url().to_string(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[async_trait]
impl RemoteGreeter for HttpGreeter {
    async fn greet(&self, name: &str) -> Result<String, GreetError> {
        let res = self
            .http
            .post(format!("{}{}", self.server_url, greet_route()))
            .json(&GreetRequest {
                name: name.to_string(),
            })
            .send()
            .await
            .map_err(GreetError::transport)?;

        let status = res.status();
        if status.is_success() {
            let body: GreetResponse = res.json().await.map_err(|err| {
                if err.is_decode() {
                    GreetError::remote(
                        ErrorCode::Internal,
                        format!("malformed greeting response: {err}"),
                    )
                } else {
                    GreetError::transport(err)
                }
            })?;
            debug!(status = status.as_u16(), "greet call succeeded");
            return Ok(body.greeting);
        }

        let raw = res.bytes().await.map_err(GreetError::transport)?;
        let err = match serde_json::from_slice::<ApiError>(&raw) {
            Ok(api) => GreetError::from(api),
            Err(_) => GreetError::remote(code_for_status(status), status.to_string()),
        };
        warn!(status = status.as_u16(), "greet call rejected by service: {err}");
        Err(err)
    }
}

fn code_for_status(status: StatusCode) -> ErrorCode {
    match status {
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
            ErrorCode::Unavailable
        }
        s if s.is_client_error() => ErrorCode::Validation,
        _ => ErrorCode::Internal,
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
