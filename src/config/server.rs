//! Server configuration module.
//!
//! This module defines configuration related to the MCP server endpoint:
//! identity reported during the handshake, transport selection and
//! connection limits.

use super::ConfigResult;
use super::Validate;
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};

/// Default TCP port for the server.
pub const DEFAULT_PORT: u16 = 8080;

/// Transport type for the MCP server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportType {
    /// Accept TCP connections
    #[default]
    Tcp,
    /// Serve a single session over stdin/stdout
    Stdio,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Name reported in `serverInfo`
    pub name: String,

    /// Version reported in `serverInfo`
    pub version: String,

    /// Transport to use for communication
    pub transport: TransportType,

    /// Address to bind to for the TCP transport
    pub address: SocketAddr,

    /// Number of runtime worker threads
    pub worker_threads: usize,

    /// Maximum number of concurrent TCP sessions
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "SimpleTcpServer".to_string(),
            version: "1.0.0".to_string(),
            transport: TransportType::default(),
            address: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            worker_threads: num_cpus::get(),
            max_connections: 64,
        }
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Server name cannot be empty".to_string(),
            ));
        }

        if self.version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Server version cannot be empty".to_string(),
            ));
        }

        if self.worker_threads == 0 {
            return Err(ConfigError::ValidationError(
                "worker_threads must be greater than 0".to_string(),
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
