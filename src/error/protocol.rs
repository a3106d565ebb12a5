//! Protocol error module.
//!
//! [`ProtocolError`] is the failure half of every outstanding call: correlation
//! waiters resolve with it, and the client facade surfaces it unchanged. It is
//! `Clone` because draining a closed session hands the same error to every waiter.

use thiserror::Error;

use super::transport::TransportError;
use crate::protocol::jsonrpc::{Id, JsonRpcError, SessionState};

/// Errors that can occur during protocol operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The peer answered with a JSON-RPC error object.
    #[error("Remote error {}: {}", .0.code, .0.message)]
    Remote(JsonRpcError),

    /// No response arrived before the request deadline.
    #[error("Request timed out waiting for response")]
    Timeout,

    /// The caller cancelled the request.
    #[error("Request was cancelled")]
    Cancelled,

    /// The session closed before a response arrived.
    #[error("Transport closed")]
    TransportClosed,

    /// The session failed on a transport read or write.
    #[error("Transport I/O failure: {0}")]
    TransportIo(String),

    /// An id was registered while another request with it was outstanding.
    #[error("Duplicate request id: {0}")]
    DuplicateId(Id),

    /// An inbound record exceeded the configured frame limit.
    #[error("Frame size exceeds maximum allowed: {size} > {max_size}")]
    FrameTooLarge {
        /// Bytes buffered when the limit was hit
        size: usize,
        /// The configured maximum
        max_size: usize,
    },

    /// The handshake state machine forbids the operation right now.
    #[error("Cannot {operation} while session is {state}")]
    NotReady {
        /// The rejected operation
        operation: &'static str,
        /// The state the session was in
        state: SessionState,
    },

    /// Server capabilities were requested before `initialize` succeeded.
    #[error("Session has not completed initialization")]
    NotInitialized,

    /// Arguments failed a local precondition.
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// The peer answered with a result of the wrong shape.
    #[error("Unexpected result: {0}")]
    UnexpectedResult(String),

    /// An outbound message could not be serialized or framed.
    #[error("Failed to encode message: {0}")]
    Encode(String),
}

impl From<TransportError> for ProtocolError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Closed => ProtocolError::TransportClosed,
            other => ProtocolError::TransportIo(other.to_string()),
        }
    }
}

impl ProtocolError {
    /// Returns the remote error object, if the peer sent one.
    pub fn remote(&self) -> Option<&JsonRpcError> {
        match self {
            ProtocolError::Remote(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if the error ends the session rather than a single call.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ProtocolError::TransportClosed
                | ProtocolError::TransportIo(_)
                | ProtocolError::FrameTooLarge { .. }
        )
    }
}
