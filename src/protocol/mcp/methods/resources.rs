// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! `resources/list` and `resources/read`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use super::parse_params;
use crate::protocol::jsonrpc::{HandlerRegistry, MethodContext, MethodResult};
use crate::protocol::mcp::resources::ResourceSet;
use crate::protocol::mcp::types::method;

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// Registers the resource handlers.
pub fn register_resource_methods(registry: &HandlerRegistry, resources: Arc<ResourceSet>) {
    let listed = Arc::clone(&resources);
    registry.register_request(method::RESOURCES_LIST, move |params, ctx| {
        handle_resources_list(Arc::clone(&listed), params, ctx)
    });
    registry.register_request(method::RESOURCES_READ, move |params, ctx| {
        handle_resources_read(Arc::clone(&resources), params, ctx)
    });
}

async fn handle_resources_list(
    resources: Arc<ResourceSet>,
    _params: Option<Value>,
    _context: MethodContext,
) -> MethodResult {
    Ok(json!({ "resources": resources.descriptors() }))
}

async fn handle_resources_read(
    resources: Arc<ResourceSet>,
    params: Option<Value>,
    _context: MethodContext,
) -> MethodResult {
    let ReadResourceParams { uri } = parse_params(params)?;
    let contents = resources.read(&uri).await?;
    Ok(json!({ "contents": [contents] }))
}
