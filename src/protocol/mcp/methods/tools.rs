// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! `tools/list` and `tools/call`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::parse_params;
use crate::protocol::jsonrpc::{HandlerRegistry, JsonRpcError, MethodContext, MethodResult};
use crate::protocol::mcp::tools::ToolSet;
use crate::protocol::mcp::types::method;

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

/// Registers the tool handlers.
pub fn register_tool_methods(registry: &HandlerRegistry, tools: Arc<ToolSet>) {
    let listed = Arc::clone(&tools);
    registry.register_request(method::TOOLS_LIST, move |params, ctx| {
        handle_tools_list(Arc::clone(&listed), params, ctx)
    });
    registry.register_request(method::TOOLS_CALL, move |params, ctx| {
        handle_tools_call(Arc::clone(&tools), params, ctx)
    });
}

async fn handle_tools_list(
    tools: Arc<ToolSet>,
    _params: Option<Value>,
    _context: MethodContext,
) -> MethodResult {
    Ok(json!({ "tools": tools.descriptors() }))
}

async fn handle_tools_call(
    tools: Arc<ToolSet>,
    params: Option<Value>,
    context: MethodContext,
) -> MethodResult {
    let CallToolParams { name, arguments } = parse_params(params)?;
    debug!(peer = %context.session.peer(), tool = %name, "Calling tool");

    let result = tools.call(&name, arguments).await?;
    serde_json::to_value(result).map_err(JsonRpcError::internal_error)
}
