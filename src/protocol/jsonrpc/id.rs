// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Outbound request id allocation.

use std::sync::atomic::{AtomicI64, Ordering};

use super::types::Id;

/// Per-session source of numeric request ids, starting at 1.
///
/// Ids are never reused within the allocator's lifetime.
#[derive(Debug)]
pub struct IdAllocator {
    next: AtomicI64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    /// Creates an allocator whose first id is 1.
    pub fn new() -> Self {
        Self {
            next: AtomicI64::new(1),
        }
    }

    /// Returns the next id.
    pub fn next_id(&self) -> Id {
        Id::Number(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
