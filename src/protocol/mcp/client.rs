// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Client facade: typed MCP operations over a client-role [`Session`].

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::methods::register_ping_method;
use super::types::{method, Implementation, InitializeParams, InitializeResult, ToolDescriptor};
use crate::config::{ClientConfig, SessionConfig};
use crate::error::{KaulaResult, ProtocolError};
use crate::protocol::jsonrpc::{HandlerRegistry, Session, SessionRole, SessionState};
use crate::transport::{ProcessTransport, TcpTransport, Transport};

/// An MCP client bound to one server connection.
///
/// The client owns the handshake: [`McpClient::initialize`] must succeed before
/// any other call crosses the wire. Dropping the client shuts its session down.
pub struct McpClient {
    session: Session,
    server: Mutex<Option<InitializeResult>>,
}

impl McpClient {
    /// Starts a client session over an open transport.
    ///
    /// The session answers `ping` requests from the server.
    pub fn new(transport: Arc<dyn Transport>, config: &SessionConfig) -> Self {
        let registry = HandlerRegistry::new();
        register_ping_method(&registry);
        let session = Session::spawn(transport, Arc::new(registry), SessionRole::Client, config);
        Self {
            session,
            server: Mutex::new(None),
        }
    }

    /// Connects to a server over TCP.
    pub async fn connect_tcp(client: &ClientConfig, config: &SessionConfig) -> KaulaResult<Self> {
        let transport = TcpTransport::connect(&client.host, client.port, client.connect_timeout())
            .await?
            .with_chunk_size(config.read_chunk_bytes);
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Spawns a server process and talks to it over its stdin and stdout.
    pub fn spawn_process<S: AsRef<str>>(argv: &[S], config: &SessionConfig) -> KaulaResult<Self> {
        let transport = ProcessTransport::spawn(argv)?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Performs the handshake.
    ///
    /// Sends `initialize`, moves the session to `Ready`, then sends the
    /// `initialized` notification. The returned capabilities are cached. On
    /// failure the session returns to `Connected` and the call may be retried.
    pub async fn initialize(
        &self,
        client_name: &str,
        client_version: &str,
    ) -> KaulaResult<InitializeResult> {
        self.session
            .transition(&[SessionState::Connected], SessionState::Initializing)
            .map_err(|state| ProtocolError::NotReady {
                operation: "initialize",
                state,
            })?;

        let result = match self.handshake(client_name, client_version).await {
            Ok(result) => result,
            Err(err) => {
                let _ = self
                    .session
                    .transition(&[SessionState::Initializing], SessionState::Connected);
                return Err(err.into());
            }
        };

        self.session
            .transition(&[SessionState::Initializing], SessionState::Ready)
            .map_err(|state| ProtocolError::NotReady {
                operation: "complete initialization",
                state,
            })?;
        *self.server.lock() = Some(result.clone());
        self.session.notify(method::INITIALIZED, Some(json!({}))).await?;

        info!(
            peer = %self.session.peer(),
            server = %result.server_info.name,
            version = %result.server_info.version,
            protocol = %result.protocol_version,
            "Initialized"
        );
        Ok(result)
    }

    async fn handshake(
        &self,
        client_name: &str,
        client_version: &str,
    ) -> Result<InitializeResult, ProtocolError> {
        let params = InitializeParams::new(Implementation::new(client_name, client_version));
        let params = serde_json::to_value(params).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        let value = self.session.request(method::INITIALIZE, Some(params)).await?;
        serde_json::from_value(value).map_err(|e| ProtocolError::UnexpectedResult(e.to_string()))
    }

    /// Checks liveness of the server.
    ///
    /// Returns false on timeout, remote error or transport failure. Fails only
    /// if the handshake has not completed.
    pub async fn ping(&self) -> KaulaResult<bool> {
        match self.session.state() {
            SessionState::Ready => {}
            state if state.is_terminating() => return Ok(false),
            state => {
                return Err(ProtocolError::NotReady {
                    operation: "ping",
                    state,
                }
                .into())
            }
        }

        match self.session.request(method::PING, Some(json!({}))).await {
            Ok(_) => Ok(true),
            Err(err @ ProtocolError::NotReady { .. }) => Err(err.into()),
            Err(err) => {
                debug!(peer = %self.session.peer(), error = %err, "Ping failed");
                Ok(false)
            }
        }
    }

    /// Capabilities reported by the server, as received.
    pub fn server_capabilities(&self) -> KaulaResult<Value> {
        self.server
            .lock()
            .as_ref()
            .map(|result| result.capabilities.clone())
            .ok_or_else(|| ProtocolError::NotInitialized.into())
    }

    /// Identity reported by the server, once initialized.
    pub fn server_info(&self) -> Option<Implementation> {
        self.server.lock().as_ref().map(|result| result.server_info.clone())
    }

    /// Lists the server's tools. A result without `tools` yields an empty list.
    pub async fn list_tools(&self) -> KaulaResult<Vec<ToolDescriptor>> {
        let mut result = self.request("list tools", method::TOOLS_LIST, Some(json!({}))).await?;
        match result.get_mut("tools").map(Value::take) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(tools) => serde_json::from_value(tools)
                .map_err(|e| ProtocolError::UnexpectedResult(e.to_string()).into()),
        }
    }

    /// Calls a tool and returns its result verbatim.
    ///
    /// `arguments` must be a JSON object.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> KaulaResult<Value> {
        self.ensure_ready("call tool")?;
        if !arguments.is_object() {
            return Err(ProtocolError::InvalidParams("tool arguments must be an object".to_string()).into());
        }
        self.request(
            "call tool",
            method::TOOLS_CALL,
            Some(json!({"name": name, "arguments": arguments})),
        )
        .await
    }

    /// Lists the server's resources and returns the raw result.
    pub async fn list_resources(&self) -> KaulaResult<Value> {
        self.request("list resources", method::RESOURCES_LIST, Some(json!({})))
            .await
    }

    /// Reads a resource and returns the raw result.
    pub async fn read_resource(&self, uri: &str) -> KaulaResult<Value> {
        self.request("read resource", method::RESOURCES_READ, Some(json!({"uri": uri})))
            .await
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Shuts the session down and waits for the transport to close.
    pub async fn close(&self) {
        self.session.close().await;
    }

    async fn request(
        &self,
        operation: &'static str,
        method: &str,
        params: Option<Value>,
    ) -> KaulaResult<Value> {
        self.ensure_ready(operation)?;
        Ok(self.session.request(method, params).await?)
    }

    fn ensure_ready(&self, operation: &'static str) -> Result<(), ProtocolError> {
        match self.session.state() {
            SessionState::Ready => Ok(()),
            state => Err(ProtocolError::NotReady { operation, state }),
        }
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        self.session.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KaulaError;
    use crate::protocol::jsonrpc::ErrorCode;
    use crate::protocol::mcp::setup::{create_registry, ServerCatalog};
    use crate::transport::MemoryTransport;

    fn connected_pair() -> (McpClient, Session) {
        let (client_end, server_end) = MemoryTransport::pair(64 * 1024);
        let config = SessionConfig::default();
        let catalog = ServerCatalog::new(Implementation::new("SimpleTcpServer", "1.0.0"));
        let server = Session::spawn(
            Arc::new(server_end),
            create_registry(&catalog),
            SessionRole::Server,
            &config,
        );
        (McpClient::new(Arc::new(client_end), &config), server)
    }

    fn protocol_error(err: KaulaError) -> ProtocolError {
        match err {
            KaulaError::Protocol(err) => err,
            other => panic!("expected a protocol error, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_calls_before_initialize_fail_locally() {
        let (client, server) = connected_pair();

        let err = protocol_error(client.list_tools().await.unwrap_err());
        assert!(matches!(
            err,
            ProtocolError::NotReady {
                state: SessionState::Connected,
                ..
            }
        ));
        assert!(matches!(
            protocol_error(client.ping().await.unwrap_err()),
            ProtocolError::NotReady { .. }
        ));
        assert_eq!(
            protocol_error(client.server_capabilities().unwrap_err()),
            ProtocolError::NotInitialized
        );
        assert_eq!(client.session().correlation().pending_count(), 0);
        server.close().await;
    }

    #[tokio::test]
    async fn test_full_session() {
        let (client, server) = connected_pair();

        let result = client.initialize("X", "1").await.unwrap();
        assert_eq!(result.protocol_version, "2024-11-05");
        assert_eq!(result.server_info, Implementation::new("SimpleTcpServer", "1.0.0"));
        assert_eq!(
            client.server_capabilities().unwrap(),
            json!({"tools": {}, "resources": {}})
        );
        assert!(client.session().is_ready());

        assert!(client.ping().await.unwrap());

        let tools = client.list_tools().await.unwrap();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["echo", "time"]);

        let echoed = client.call_tool("echo", json!({"text": "Hello"})).await.unwrap();
        assert_eq!(echoed, json!({"content": [{"type": "text", "text": "Echo: Hello"}]}));

        let resources = client.list_resources().await.unwrap();
        let uri = resources["resources"][0]["uri"].as_str().unwrap().to_string();
        let read = client.read_resource(&uri).await.unwrap();
        assert_eq!(read["contents"][0]["uri"], uri.as_str());

        client.close().await;
        server.closed().await;
        assert_eq!(server.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_second_initialize_rejected() {
        let (client, _server) = connected_pair();
        client.initialize("X", "1").await.unwrap();

        let err = protocol_error(client.initialize("X", "1").await.unwrap_err());
        assert!(matches!(
            err,
            ProtocolError::NotReady {
                state: SessionState::Ready,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_call_tool_rejects_non_object_arguments() {
        let (client, _server) = connected_pair();
        client.initialize("X", "1").await.unwrap();

        let err = protocol_error(client.call_tool("echo", json!("Hello")).await.unwrap_err());
        assert!(matches!(err, ProtocolError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn test_unknown_tool_surfaces_remote_error() {
        let (client, _server) = connected_pair();
        client.initialize("X", "1").await.unwrap();

        let err = protocol_error(client.call_tool("nope", json!({})).await.unwrap_err());
        let remote = err.remote().unwrap();
        assert_eq!(remote.error_code(), Some(ErrorCode::MethodNotFound));
        assert_eq!(remote.message, "Method not found: nope");
    }

    #[tokio::test]
    async fn test_failed_initialize_returns_to_connected() {
        let (client_end, server_end) = MemoryTransport::pair(4096);
        let config = SessionConfig::default();
        // A peer with no handlers answers initialize with -32601.
        let _server = Session::spawn(
            Arc::new(server_end),
            Arc::new(HandlerRegistry::new()),
            SessionRole::Client,
            &config,
        );
        let client = McpClient::new(Arc::new(client_end), &config);

        let err = protocol_error(client.initialize("X", "1").await.unwrap_err());
        assert_eq!(err.remote().unwrap().code, -32601);
        assert_eq!(client.session().state(), SessionState::Connected);
        assert!(client.server_info().is_none());
    }

    #[tokio::test]
    async fn test_ping_after_close_is_false() {
        let (client, server) = connected_pair();
        client.initialize("X", "1").await.unwrap();

        server.close().await;
        client.session().closed().await;
        assert!(!client.ping().await.unwrap());
    }

    #[tokio::test]
    async fn test_server_can_ping_client() {
        let (client, server) = connected_pair();
        client.initialize("X", "1").await.unwrap();

        let mut state = server.subscribe_state();
        state.wait_for(|s| *s == SessionState::Ready).await.unwrap();
        assert_eq!(server.request("ping", Some(json!({}))).await.unwrap(), json!({}));
    }
}
