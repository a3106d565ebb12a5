// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Model Context Protocol message shapes carried over the JSON-RPC engine.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The protocol revision spoken by both endpoints.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Method names of the MCP surface.
pub mod method {
    /// Handshake request
    pub const INITIALIZE: &str = "initialize";
    /// Handshake completion notification
    pub const INITIALIZED: &str = "initialized";
    /// Handshake completion notification, namespaced form used by newer peers
    pub const NOTIFICATIONS_INITIALIZED: &str = "notifications/initialized";
    /// Liveness check, valid in either direction
    pub const PING: &str = "ping";
    /// Tool catalog
    pub const TOOLS_LIST: &str = "tools/list";
    /// Tool invocation
    pub const TOOLS_CALL: &str = "tools/call";
    /// Resource catalog
    pub const RESOURCES_LIST: &str = "resources/list";
    /// Resource contents
    pub const RESOURCES_READ: &str = "resources/read";
}

/// Name and version of an endpoint implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Implementation name
    pub name: String,
    /// Implementation version
    pub version: String,
}

impl Implementation {
    /// Creates an implementation descriptor.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Parameters of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Protocol revision requested by the client
    pub protocol_version: String,
    /// Client identity
    pub client_info: Implementation,
    /// Client capabilities
    #[serde(default)]
    pub capabilities: Value,
}

impl InitializeParams {
    /// Parameters for a client with no advertised capabilities.
    pub fn new(client_info: Implementation) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            client_info,
            capabilities: json!({}),
        }
    }
}

/// Result of the `initialize` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Protocol revision the server speaks
    pub protocol_version: String,
    /// Server capabilities, kept verbatim
    #[serde(default)]
    pub capabilities: Value,
    /// Server identity
    pub server_info: Implementation,
}

/// A tool as listed by `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name, used in `tools/call`
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// JSON schema of the `arguments` object
    #[serde(alias = "input_schema", default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    json!({"type": "object", "properties": {}})
}

/// A resource as listed by `resources/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Resource address
    pub uri: String,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// MIME type of the contents
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "mime_type")]
    pub mime_type: Option<String>,
}

/// One item of a tool result's `content` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    /// Plain text
    Text {
        /// The text
        text: String,
    },
}

/// Result of `tools/call`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    /// Content produced by the tool
    pub content: Vec<ToolContent>,
    /// Set when the tool ran but reports failure
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    /// A successful result carrying one text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }
}

/// Contents of one resource, as returned by `resources/read`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    /// Resource address
    pub uri: String,
    /// MIME type of `text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Textual contents
    pub text: String,
}
