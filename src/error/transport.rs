//! Transport error module.
//!
//! This module defines error types that may occur in the TCP, subprocess and
//! stdio transport implementations.

use std::io;
use thiserror::Error;

/// Errors that can occur during transport operations.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The endpoint was closed, locally or by the peer.
    #[error("Transport closed")]
    Closed,

    /// Low-level read or write failure.
    #[error("Transport I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error when connecting to a TCP endpoint.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        /// The address that was dialed
        address: String,
        /// The underlying socket error
        #[source]
        source: io::Error,
    },

    /// The TCP connect did not complete in time.
    #[error("Connect to {address} timed out after {timeout_ms} milliseconds")]
    ConnectTimeout {
        /// The address that was dialed
        address: String,
        /// The configured timeout
        timeout_ms: u64,
    },

    /// Error when spawning a child process.
    #[error("Failed to spawn child process: {0}")]
    Spawn(String),
}

impl TransportError {
    /// Classifies an I/O error, folding peer-initiated disconnects into [`TransportError::Closed`].
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => TransportError::Closed,
            _ => TransportError::Io(err),
        }
    }

    /// Returns true for an orderly close rather than a failure.
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}
