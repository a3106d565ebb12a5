//! Session engine configuration module.
//!
//! Limits and timeouts applied to every JSON-RPC session, on either side.

use std::time::Duration;

use super::{ConfigResult, Validate};
use crate::error::config::ConfigError;
use serde::{Deserialize, Serialize};

/// Per-session engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Largest inbound record accepted, in bytes
    pub max_frame_bytes: usize,

    /// Outbound records that may be queued before senders wait
    pub outbound_queue_capacity: usize,

    /// Default deadline for outbound requests, in milliseconds
    pub request_timeout_ms: u64,

    /// How long a timed-out or cancelled id stays reserved, in milliseconds
    pub late_response_grace_ms: u64,

    /// Size of a single transport read, in bytes
    pub read_chunk_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: 16 * 1024 * 1024, // 16 MiB
            outbound_queue_capacity: 1024,
            request_timeout_ms: 30_000,
            late_response_grace_ms: 1_000,
            read_chunk_bytes: 8192,
        }
    }
}

impl SessionConfig {
    /// Default request deadline.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Late-response grace window.
    pub fn late_response_grace(&self) -> Duration {
        Duration::from_millis(self.late_response_grace_ms)
    }
}

impl Validate for SessionConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.max_frame_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "max_frame_bytes must be greater than 0".to_string(),
            ));
        }

        if self.outbound_queue_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "outbound_queue_capacity must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.read_chunk_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "read_chunk_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
