// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Transport endpoints.
//!
//! A transport is a duplex byte stream with no knowledge of framing or
//! JSON-RPC. The session is the only user: its reader task calls
//! [`Transport::recv`], its writer task calls [`Transport::send`], and either may
//! call [`Transport::close`].
//!
//! Concrete transports:
//!
//! - [`StreamTransport`]: any `AsyncRead`/`AsyncWrite` pair, including stdio and
//!   in-memory duplex pipes
//! - [`TcpTransport`]: a connected TCP socket
//! - [`ProcessTransport`]: a child process's stdin and stdout

use async_trait::async_trait;

use crate::error::TransportError;

pub mod process;
pub mod stream;
pub mod tcp;

pub use process::ProcessTransport;
pub use stream::{MemoryTransport, StdioTransport, StreamTransport, DEFAULT_READ_CHUNK_BYTES};
pub use tcp::TcpTransport;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// A duplex byte-stream endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Writes the whole byte sequence.
    ///
    /// Fails with [`TransportError::Closed`] once the endpoint is closed.
    async fn send(&self, bytes: &[u8]) -> TransportResult<()>;

    /// Returns the next non-empty chunk, or `None` once the stream is closed.
    ///
    /// Chunk boundaries carry no meaning; byte order is preserved.
    async fn recv(&self) -> TransportResult<Option<Vec<u8>>>;

    /// Closes the endpoint. Idempotent; a pending `recv` returns `None`.
    async fn close(&self) -> TransportResult<()>;

    /// Human-readable description of the remote end, for logs.
    fn peer(&self) -> String;
}
