//! Error module for the Kaula MCP engine.
//!
//! Each concern owns a `thiserror` enum (configuration, protocol, transport);
//! [`KaulaError`] aggregates them for callers that cross layers, such as the
//! client facade and the binaries.

use thiserror::Error;

pub mod config;
pub mod protocol;
pub mod transport;

pub use self::config::ConfigError;
pub use self::protocol::ProtocolError;
pub use self::transport::TransportError;

/// Result type alias used throughout the Kaula MCP engine.
pub type KaulaResult<T> = Result<T, KaulaError>;

/// Core error enum for the Kaula MCP engine.
#[derive(Error, Debug)]
pub enum KaulaError {
    /// Errors occurring during configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to JSON-RPC and MCP protocol handling.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Errors related to transport endpoints (TCP, subprocess, stdio).
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// IO errors that may occur during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/Deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Custom error with message for cases where specific error types are not defined.
    #[error("{0}")]
    Custom(String),
}

impl KaulaError {
    /// Returns the protocol error if this is one.
    pub fn as_protocol(&self) -> Option<&ProtocolError> {
        match self {
            KaulaError::Protocol(err) => Some(err),
            _ => None,
        }
    }
}
