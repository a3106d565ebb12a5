// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Engine-level tests for the JSON-RPC 2.0 implementation.
//!
//! - `integration_tests`: two sessions talking over an in-memory pipe
//! - `wire_tests`: a session driven by raw bytes from a scripted peer
//! - `property_tests`: codec and framer properties under proptest

mod integration_tests;
