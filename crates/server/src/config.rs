use std::{collections::HashMap, fs};

use serde::Deserialize;
use tracing::warn;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub max_name_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8443".into(),
            max_name_bytes: 256,
        }
    }
}

/// Defaults, then `server.toml` in the working directory, then the environment.
pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(SETTINGS_FILE).ok();
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

pub(crate) fn load_settings_from(
    file_contents: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file_contents {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("bind_addr").and_then(|v| v.as_str()) {
                    settings.server_bind = v.to_string();
                }
                if let Some(v) = file_cfg
                    .get("max_name_bytes")
                    .and_then(|v| v.as_integer())
                    .and_then(|v| usize::try_from(v).ok())
                {
                    settings.max_name_bytes = v;
                }
            }
            Err(err) => warn!("ignoring unreadable {SETTINGS_FILE}: {err}"),
        }
    }

    if let Some(v) = env("GREET_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__MAX_NAME_BYTES") {
        match v.parse::<usize>() {
            Ok(parsed) => settings.max_name_bytes = parsed,
            Err(err) => warn!(value = %v, "ignoring APP__MAX_NAME_BYTES: {err}"),
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
