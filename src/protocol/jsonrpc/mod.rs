// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Bidirectional JSON-RPC 2.0 engine over a newline-delimited byte stream.
//!
//! Either endpoint may send requests and notifications and answer the peer's.
//! Data flows through the layers as:
//!
//! bytes ↔ [`framing`] ↔ [`codec`] ↔ dispatch ↔ {[`correlation`], [`handler`]} ↔ [`Session`]
//!
//! # Features
//!
//! - One record per `\n`-terminated line, with a configurable size limit
//! - Classification into requests, responses and notifications, with `-32600`
//!   replies for malformed messages that carry an id
//! - Concurrent outbound requests correlated by id, with timeouts and cancellation
//! - Request handlers run off the reader task; panics become `-32603`
//! - A bounded outbound queue with back-pressure
//!
//! # Example
//!
//! ```
//! use kaula_mcp_lib::protocol::jsonrpc::{codec, Decoded, Id, Message};
//!
//! let decoded = codec::decode(br#"{"jsonrpc":"2.0","id":7,"method":"ping","params":{}}"#);
//! match decoded {
//!     Decoded::Message(Message::Request(request)) => {
//!         assert_eq!(request.id, Id::Number(7));
//!         assert_eq!(request.method, "ping");
//!     }
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod codec;
pub mod correlation;
mod dispatch;
pub mod error;
pub mod framing;
pub mod handler;
pub mod id;
pub mod session;
pub mod types;

// Re-exports
pub use codec::Decoded;
pub use correlation::{Completion, CorrelationTable, Outcome, Waiter};
pub use error::{ErrorCode, JsonRpcError};
pub use framing::{encode_frame, LineFramer, DEFAULT_MAX_FRAME_BYTES};
pub use handler::{
    Handler, HandlerKind, HandlerRegistry, MethodContext, MethodResult, NotificationHandler,
    NotificationResult, RequestHandler,
};
pub use id::IdAllocator;
pub use session::{Session, SessionRole, SessionState};
pub use types::{Id, Message, Notification, Request, Response, JSONRPC_VERSION};

#[cfg(test)]
mod tests;
