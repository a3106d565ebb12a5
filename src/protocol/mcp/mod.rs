// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Model Context Protocol layer.
//!
//! Built on the JSON-RPC engine in [`crate::protocol::jsonrpc`]:
//!
//! - [`types`]: message shapes and method names
//! - [`McpClient`]: typed client operations and the client side of the handshake
//! - [`McpServer`]: connection handling and the server side of the handshake
//! - [`ToolSet`] and [`ResourceSet`]: the catalogs a server exposes

pub mod client;
pub mod methods;
pub mod resources;
pub mod server;
pub mod setup;
pub mod tools;
pub mod types;

pub use client::McpClient;
pub use resources::{ResourceReader, ResourceSet, SERVER_INFO_URI};
pub use server::McpServer;
pub use setup::{create_registry, register_standard_methods, ServerCatalog};
pub use tools::{ToolArguments, ToolHandler, ToolResult, ToolSet};
pub use types::{
    CallToolResult, Implementation, InitializeParams, InitializeResult, ResourceContents,
    ResourceDescriptor, ToolContent, ToolDescriptor, PROTOCOL_VERSION,
};
