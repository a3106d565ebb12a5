// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! The `ping` request, answered identically by clients and servers.

use serde_json::{json, Value};

use crate::protocol::jsonrpc::{HandlerRegistry, MethodContext, MethodResult};
use crate::protocol::mcp::types::method;

/// Registers the ping handler.
pub fn register_ping_method(registry: &HandlerRegistry) {
    registry.register_request(method::PING, handle_ping);
}

async fn handle_ping(_params: Option<Value>, _context: MethodContext) -> MethodResult {
    Ok(json!({}))
}
