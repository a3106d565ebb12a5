// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Server facade: accepts connections and serves the MCP surface on each.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::setup::{create_registry, ServerCatalog};
use crate::config::{KaulaConfig, ServerConfig, SessionConfig};
use crate::error::KaulaResult;
use crate::protocol::jsonrpc::{HandlerRegistry, Session, SessionRole};
use crate::transport::{StdioTransport, TcpTransport, Transport};

/// An MCP server. Every connection gets its own [`Session`] over one shared
/// handler registry.
#[derive(Clone)]
pub struct McpServer {
    registry: Arc<HandlerRegistry>,
    server: ServerConfig,
    session: SessionConfig,
}

impl McpServer {
    /// A server with the built-in tools and resources.
    pub fn new(config: &KaulaConfig) -> Self {
        Self::with_catalog(config, &ServerCatalog::from_config(&config.server))
    }

    /// A server serving `catalog`.
    pub fn with_catalog(config: &KaulaConfig, catalog: &ServerCatalog) -> Self {
        Self {
            registry: create_registry(catalog),
            server: config.server.clone(),
            session: config.session.clone(),
        }
    }

    /// The shared handler registry. Handlers added here are visible to later dispatches.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    /// Starts a server session on an open transport.
    pub fn accept_session(&self, transport: Arc<dyn Transport>) -> Session {
        Session::spawn(
            transport,
            Arc::clone(&self.registry),
            SessionRole::Server,
            &self.session,
        )
    }

    /// Serves one transport until it closes.
    pub async fn serve_transport(&self, transport: Arc<dyn Transport>) {
        self.accept_session(transport).closed().await;
    }

    /// Accepts connections until the listener fails.
    ///
    /// At most `max_connections` sessions run at once; further connections wait
    /// in the listener backlog.
    pub async fn serve(&self, listener: TcpListener) -> KaulaResult<()> {
        let permits = Arc::new(Semaphore::new(self.server.max_connections.max(1)));
        loop {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                return Ok(());
            };
            let (stream, address) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(error = %err, "Failed to accept client connection");
                    continue;
                }
            };

            info!(peer = %address, "Client connected");
            let transport =
                TcpTransport::from_stream(stream).with_chunk_size(self.session.read_chunk_bytes);
            let server = self.clone();
            tokio::spawn(async move {
                server.serve_transport(Arc::new(transport)).await;
                info!(peer = %address, "Client disconnected");
                drop(permit);
            });
        }
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn run(&self) -> KaulaResult<()> {
        let listener = TcpListener::bind(self.server.address).await?;
        info!(
            address = %listener.local_addr()?,
            name = %self.server.name,
            version = %self.server.version,
            "Server listening"
        );

        tokio::select! {
            result = self.serve(listener) => result,
            signal = tokio::signal::ctrl_c() => {
                signal?;
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }

    /// Serves a single session over stdin and stdout.
    pub async fn serve_stdio(&self) -> KaulaResult<()> {
        let transport = StdioTransport::stdio().with_chunk_size(self.session.read_chunk_bytes);
        debug!("Serving over stdio");
        self.serve_transport(Arc::new(transport)).await;
        Ok(())
    }
}
