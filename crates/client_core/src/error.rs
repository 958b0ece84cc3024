use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Failure of a single `greet` call.
///
/// Both variants are opaque to the greeter itself; callers decide how they are
/// surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GreetError {
    /// The call could not reach the service or its answer never arrived.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service answered, but with an error.
    #[error("remote fault ({code:?}): {message}")]
    RemoteFault { code: ErrorCode, message: String },
}

impl GreetError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn remote(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::RemoteFault {
            code,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_remote_fault(&self) -> bool {
        matches!(self, Self::RemoteFault { .. })
    }
}

impl From<ApiError> for GreetError {
    fn from(value: ApiError) -> Self {
        Self::RemoteFault {
            code: value.code,
            message: value.message,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server url '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("unsupported url scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { scheme: String },
    #[error("failed to build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
