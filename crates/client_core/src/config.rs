use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8443";

/// Where the greeting service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreeterConfig {
    server_url: String,
}

impl GreeterConfig {
    pub fn new(server_url: &str) -> Result<Self, ConfigError> {
        let raw = server_url.trim();
        let parsed = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConfigError::UnsupportedScheme {
                    scheme: other.to_string(),
                })
            }
        }

        Ok(Self {
            server_url: raw.trim_end_matches('/').to_string(),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

impl Default for GreeterConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}
