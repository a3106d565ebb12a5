// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Newline-delimited framing.
//!
//! Inbound bytes arrive in arbitrary chunks; [`LineFramer`] buffers them and
//! yields one record per `\n`-terminated line. Outbound records are terminated
//! with [`encode_frame`].

use crate::error::ProtocolError;

/// Default upper bound on a single record, in bytes.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Record terminator.
const DELIMITER: u8 = b'\n';

/// Splits a byte stream into newline-terminated records.
#[derive(Debug)]
pub struct LineFramer {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to contain no delimiter.
    scanned: usize,
    max_frame_bytes: usize,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_BYTES)
    }
}

impl LineFramer {
    /// Creates a framer that rejects records longer than `max_frame_bytes`.
    pub fn new(max_frame_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_frame_bytes,
        }
    }

    /// Appends a chunk received from the transport.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Returns the next complete record, without its terminator.
    ///
    /// Empty and whitespace-only records are skipped. `Ok(None)` means more
    /// bytes are needed; any partial record stays buffered.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        loop {
            let Some(offset) = self.buffer[self.scanned..]
                .iter()
                .position(|b| *b == DELIMITER)
            else {
                self.scanned = self.buffer.len();
                return if self.buffer.len() > self.max_frame_bytes {
                    Err(self.too_large(self.buffer.len()))
                } else {
                    Ok(None)
                };
            };

            let end = self.scanned + offset;
            if end > self.max_frame_bytes {
                return Err(self.too_large(end));
            }

            let mut record: Vec<u8> = self.buffer.drain(..=end).collect();
            record.pop();
            self.scanned = 0;

            if record.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(record));
        }
    }

    /// Number of bytes held for an incomplete record.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Discards any partial record at end of stream, returning its length.
    pub fn finish(&mut self) -> Option<usize> {
        let pending = self.buffer.len();
        self.buffer.clear();
        self.scanned = 0;
        (pending > 0).then_some(pending)
    }

    fn too_large(&self, size: usize) -> ProtocolError {
        ProtocolError::FrameTooLarge {
            size,
            max_size: self.max_frame_bytes,
        }
    }
}

/// Terminates a serialized record for the wire.
///
/// Fails if the record carries an embedded newline, which would split it in two
/// on the receiving side.
pub fn encode_frame(record: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if record.contains(&DELIMITER) {
        return Err(ProtocolError::Encode(
            "record contains an embedded newline".to_string(),
        ));
    }
    let mut frame = Vec::with_capacity(record.len() + 1);
    frame.extend_from_slice(record);
    frame.push(DELIMITER);
    Ok(frame)
}
