//! Client configuration module.

use std::time::Duration;

use super::server::DEFAULT_PORT;
use super::{ConfigResult, Validate};
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Settings for the reference client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server host to connect to
    pub host: String,

    /// Server port to connect to
    pub port: u16,

    /// Name sent in `clientInfo`
    pub client_name: String,

    /// Version sent in `clientInfo`
    pub client_version: String,

    /// TCP connect timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            client_name: "KaulaClient".to_string(),
            client_version: "1.0.0".to_string(),
            connect_timeout_ms: 10_000,
        }
    }
}

impl ClientConfig {
    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Client host cannot be empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConfigError::ValidationError(
                "Client port must be greater than 0".to_string(),
            ));
        }
        if self.client_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "client_name cannot be empty".to_string(),
            ));
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
