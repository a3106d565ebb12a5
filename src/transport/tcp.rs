// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! TCP transport.

use std::time::Duration;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use super::stream::StreamTransport;
use super::TransportResult;
use crate::error::TransportError;

/// Transport over a connected TCP socket.
pub type TcpTransport = StreamTransport<OwnedReadHalf, OwnedWriteHalf>;

impl TcpTransport {
    /// Connects to `host:port`, giving up after `timeout`.
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> TransportResult<Self> {
        let address = format!("{host}:{port}");
        debug!(%address, "Connecting");

        let stream = match tokio::time::timeout(timeout, TcpStream::connect(address.as_str())).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => return Err(TransportError::Connect { address, source }),
            Err(_) => {
                return Err(TransportError::ConnectTimeout {
                    address,
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                })
            }
        };
        Ok(Self::from_stream(stream))
    }

    /// Wraps an accepted or connected socket.
    pub fn from_stream(stream: TcpStream) -> Self {
        if let Err(err) = stream.set_nodelay(true) {
            warn!(error = %err, "Failed to set TCP_NODELAY");
        }
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "tcp:unknown".to_string());
        let (reader, writer) = stream.into_split();
        Self::new(reader, writer, peer)
    }
}
