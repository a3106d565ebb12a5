// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Tool catalog served through `tools/list` and `tools/call`.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{json, Map, Value};

use super::types::{CallToolResult, ToolDescriptor};
use crate::protocol::jsonrpc::JsonRpcError;

/// Arguments passed to a tool.
pub type ToolArguments = Map<String, Value>;

/// Outcome of a tool invocation.
pub type ToolResult = Result<CallToolResult, JsonRpcError>;

/// Implementation of a single tool.
pub trait ToolHandler: Send + Sync {
    /// Runs the tool.
    fn call(&self, arguments: ToolArguments) -> BoxFuture<'static, ToolResult>;
}

impl<F, Fut> ToolHandler for F
where
    F: Send + Sync + 'static + Fn(ToolArguments) -> Fut,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    fn call(&self, arguments: ToolArguments) -> BoxFuture<'static, ToolResult> {
        Box::pin((self)(arguments))
    }
}

#[derive(Clone)]
struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

/// Ordered set of tools. Listing preserves registration order.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<RegisteredTool>,
}

impl ToolSet {
    /// Creates an empty tool set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tool set holding the built-in `echo` and `time` tools.
    pub fn with_builtins() -> Self {
        let mut tools = Self::new();
        tools.register(echo_descriptor(), echo);
        tools.register(time_descriptor(), time);
        tools
    }

    /// Adds a tool, replacing any tool of the same name.
    pub fn register<H: ToolHandler + 'static>(&mut self, descriptor: ToolDescriptor, handler: H) {
        let tool = RegisteredTool {
            descriptor,
            handler: Arc::new(handler),
        };
        match self
            .tools
            .iter_mut()
            .find(|t| t.descriptor.name == tool.descriptor.name)
        {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Descriptors of every tool, in registration order.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor.clone()).collect()
    }

    /// Number of tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns true if no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Invokes a tool by name.
    ///
    /// Unknown names fail with `-32601`. Arguments must be an object (or absent)
    /// and must contain every property the schema lists as required; either
    /// violation fails with `-32602`.
    pub async fn call(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        let tool = self
            .tools
            .iter()
            .find(|t| t.descriptor.name == name)
            .ok_or_else(|| JsonRpcError::method_not_found(name))?;

        let arguments = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => return Err(JsonRpcError::invalid_params("arguments must be an object")),
        };

        if let Some(required) = tool.descriptor.input_schema.get("required").and_then(Value::as_array) {
            if let Some(missing) = required
                .iter()
                .filter_map(Value::as_str)
                .find(|key| !arguments.contains_key(*key))
            {
                return Err(JsonRpcError::invalid_params(format!(
                    "missing required argument: {missing}"
                )));
            }
        }

        tool.handler.call(arguments).await
    }
}

fn echo_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "echo".to_string(),
        description: "Echo the input text".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {"type": "string", "description": "Text to echo"}
            },
            "required": ["text"]
        }),
    }
}

async fn echo(arguments: ToolArguments) -> ToolResult {
    match arguments.get("text") {
        Some(Value::String(text)) => Ok(CallToolResult::text(format!("Echo: {text}"))),
        _ => Err(JsonRpcError::invalid_params("text must be a string")),
    }
}

fn time_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: "time".to_string(),
        description: "Get current time".to_string(),
        input_schema: json!({"type": "object", "properties": {}}),
    }
}

async fn time(_arguments: ToolArguments) -> ToolResult {
    let now = chrono::Local::now().format("%a %b %e %H:%M:%S %Y");
    Ok(CallToolResult::text(now.to_string()))
}
