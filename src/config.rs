//! Process configuration from the environment

use std::time::Duration;
use thiserror::Error;

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:3001";
const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the remote up-level/chat service
    pub service_url: String,
    /// Port for the local HTTP surface
    pub port: u16,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            port: DEFAULT_PORT,
            request_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("MAGIC_PROMPT_SERVICE_URL").filter(|u| !u.trim().is_empty()) {
            config.service_url = url;
        }

        if let Some(port) = lookup("MAGIC_PROMPT_PORT") {
            config.port = port.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "MAGIC_PROMPT_PORT",
                expected: "a port number",
                value: port.clone(),
            })?;
        }

        if let Some(secs) = lookup("MAGIC_PROMPT_REQUEST_TIMEOUT_SECS") {
            let parsed: u64 = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "MAGIC_PROMPT_REQUEST_TIMEOUT_SECS",
                expected: "a whole number of seconds",
                value: secs.clone(),
            })?;
            config.request_timeout = (parsed > 0).then(|| Duration::from_secs(parsed));
        }

        Ok(config)
    }
}
