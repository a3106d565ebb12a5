// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Protocol module for the Kaula MCP engine.
//!
//! [`jsonrpc`] is the transport-agnostic JSON-RPC 2.0 engine: framing, codec,
//! correlation, dispatch and the session state machine. [`mcp`] layers the
//! Model Context Protocol handshake and method surface on top of it.

pub mod jsonrpc;
pub mod mcp;
