// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! MCP method handlers.
//!
//! Each submodule registers its handlers on a [`HandlerRegistry`]; see
//! [`crate::protocol::mcp::setup`] for the full server surface.
//!
//! [`HandlerRegistry`]: crate::protocol::jsonrpc::HandlerRegistry

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::protocol::jsonrpc::JsonRpcError;

pub mod initialize;
pub mod ping;
pub mod resources;
pub mod tools;

pub use initialize::register_initialize_methods;
pub use ping::register_ping_method;
pub use resources::register_resource_methods;
pub use tools::register_tool_methods;

/// Deserializes request params, mapping absence and shape errors to `-32602`.
pub(crate) fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    match params {
        None | Some(Value::Null) => Err(JsonRpcError::invalid_params("missing params")),
        Some(value) => serde_json::from_value(value).map_err(JsonRpcError::invalid_params),
    }
}
