//! Kaula MCP Library
//!
//! A bidirectional JSON-RPC 2.0 engine over newline-delimited byte streams, and
//! the Model Context Protocol client and server built on it.
//!
//! # Architecture
//!
//! - [`transport`]: duplex byte streams (TCP, subprocess, stdio, in-memory)
//! - [`protocol::jsonrpc`]: framing, codec, correlation, dispatch and sessions
//! - [`protocol::mcp`]: the MCP handshake, client facade and server facade
//! - [`config`], [`error`] and [`logging`]: the ambient stack shared by both binaries
//!
//! ```no_run
//! use kaula_mcp_lib::config::KaulaConfig;
//! use kaula_mcp_lib::protocol::mcp::McpClient;
//!
//! # async fn demo() -> kaula_mcp_lib::error::KaulaResult<()> {
//! let config = KaulaConfig::default();
//! let client = McpClient::connect_tcp(&config.client, &config.session).await?;
//! client.initialize("demo", "0.1.0").await?;
//! for tool in client.list_tools().await? {
//!     println!("{}: {}", tool.name, tool.description);
//! }
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod transport;

// Internal modules that are not part of the public API
#[cfg(test)]
pub(crate) mod tests;

/// Version information for the Kaula MCP engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
