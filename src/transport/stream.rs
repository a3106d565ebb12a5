// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Transport over any pair of async byte streams.

use async_trait::async_trait;
use tokio::io::{
    self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadHalf, Stdin,
    Stdout, WriteHalf,
};
use tokio::sync::{watch, Mutex};
use tracing::trace;

use super::{Transport, TransportResult};
use crate::error::TransportError;

/// Default size of a single read from the underlying stream.
pub const DEFAULT_READ_CHUNK_BYTES: usize = 8192;

/// Transport over the current process's stdin and stdout.
pub type StdioTransport = StreamTransport<Stdin, Stdout>;

/// One end of an in-memory pipe.
pub type MemoryTransport = StreamTransport<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// Duplex transport built from a reader and a writer.
///
/// Sending and receiving lock independent halves, so the session's reader and
/// writer tasks never contend.
#[derive(Debug)]
pub struct StreamTransport<R, W> {
    reader: Mutex<R>,
    /// `None` once the write side has been shut down.
    writer: Mutex<Option<W>>,
    closed: watch::Sender<bool>,
    chunk_size: usize,
    peer: String,
}

impl<R, W> StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps a reader and writer.
    pub fn new(reader: R, writer: W, peer: impl Into<String>) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(Some(writer)),
            closed,
            chunk_size: DEFAULT_READ_CHUNK_BYTES,
            peer: peer.into(),
        }
    }

    /// Sets the maximum number of bytes returned by one `recv`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    async fn write_locked(&self, bytes: &[u8]) -> TransportResult<()> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(TransportError::Closed)?;
        writer.write_all(bytes).await.map_err(TransportError::from_io)?;
        writer.flush().await.map_err(TransportError::from_io)
    }
}

impl StdioTransport {
    /// Transport over stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(io::stdin(), io::stdout(), "stdio")
    }
}

impl MemoryTransport {
    /// Two connected in-memory endpoints; `buffer` bytes may be in flight per direction.
    pub fn pair(buffer: usize) -> (Self, Self) {
        let (a, b) = io::duplex(buffer);
        let (a_read, a_write) = io::split(a);
        let (b_read, b_write) = io::split(b);
        (
            Self::new(a_read, a_write, "memory:a"),
            Self::new(b_read, b_write, "memory:b"),
        )
    }
}

async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    let _ = closed.wait_for(|c| *c).await;
}

#[async_trait]
impl<R, W> Transport for StreamTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&self, bytes: &[u8]) -> TransportResult<()> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Err(TransportError::Closed);
        }

        // A peer that stops reading must not keep `close` waiting on the writer lock.
        tokio::select! {
            _ = wait_closed(&mut closed) => Err(TransportError::Closed),
            written = self.write_locked(bytes) => {
                written?;
                trace!(peer = %self.peer, bytes = bytes.len(), "Wrote frame");
                Ok(())
            }
        }
    }

    async fn recv(&self) -> TransportResult<Option<Vec<u8>>> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow() {
            return Ok(None);
        }

        let mut reader = self.reader.lock().await;
        let mut buf = vec![0u8; self.chunk_size];
        tokio::select! {
            _ = wait_closed(&mut closed) => Ok(None),
            read = reader.read(&mut buf) => match read {
                Ok(0) => Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    Ok(Some(buf))
                }
                Err(err) => match TransportError::from_io(err) {
                    TransportError::Closed => Ok(None),
                    other => Err(other),
                },
            },
        }
    }

    async fn close(&self) -> TransportResult<()> {
        if self.closed.send_replace(true) {
            return Ok(());
        }
        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer {
            match writer.shutdown().await.map_err(TransportError::from_io) {
                Ok(()) | Err(TransportError::Closed) => {}
                Err(other) => return Err(other),
            }
        }
        trace!(peer = %self.peer, "Transport closed");
        Ok(())
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}
