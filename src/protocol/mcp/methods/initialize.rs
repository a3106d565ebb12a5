// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Handshake handlers: the `initialize` request and the `initialized` notification.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::parse_params;
use crate::protocol::jsonrpc::{
    HandlerRegistry, JsonRpcError, MethodContext, MethodResult, NotificationResult, SessionState,
};
use crate::protocol::mcp::setup::ServerCatalog;
use crate::protocol::mcp::types::{method, InitializeParams, InitializeResult, PROTOCOL_VERSION};

/// Registers the handshake handlers.
pub fn register_initialize_methods(registry: &HandlerRegistry, catalog: Arc<ServerCatalog>) {
    registry.register_request(method::INITIALIZE, move |params, ctx| {
        handle_initialize(Arc::clone(&catalog), params, ctx)
    });
    registry.register_notification(method::INITIALIZED, handle_initialized);
    registry.register_notification(method::NOTIFICATIONS_INITIALIZED, handle_initialized);
}

/// Handles the initialize method call.
///
/// Only valid while the session is `Connected`. On success the session becomes
/// `Ready` immediately, without waiting for the `initialized` notification, so
/// clients that never send it are still served.
async fn handle_initialize(
    catalog: Arc<ServerCatalog>,
    params: Option<Value>,
    context: MethodContext,
) -> MethodResult {
    let session = &context.session;
    if let Err(state) = session.transition(&[SessionState::Connected], SessionState::Initializing) {
        return Err(JsonRpcError::invalid_request(format!(
            "initialize is not permitted while the session is {state}"
        )));
    }

    let params: InitializeParams = match parse_params(params) {
        Ok(params) => params,
        Err(err) => {
            let _ = session.transition(&[SessionState::Initializing], SessionState::Connected);
            return Err(err);
        }
    };

    if params.protocol_version != PROTOCOL_VERSION {
        warn!(
            peer = %session.peer(),
            requested = %params.protocol_version,
            supported = PROTOCOL_VERSION,
            "Client requested a different protocol version"
        );
    }

    let result = InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: catalog.capabilities.clone(),
        server_info: catalog.info.clone(),
    };
    let value = serde_json::to_value(result).map_err(JsonRpcError::internal_error)?;

    session.set_state(SessionState::Ready);
    info!(
        peer = %session.peer(),
        client = %params.client_info.name,
        client_version = %params.client_info.version,
        "Client initialized"
    );
    Ok(value)
}

async fn handle_initialized(_params: Option<Value>, context: MethodContext) -> NotificationResult {
    let session = &context.session;
    match session.transition(
        &[SessionState::Initializing, SessionState::Ready],
        SessionState::Ready,
    ) {
        Ok(()) => debug!(peer = %session.peer(), "Handshake complete"),
        Err(state) => warn!(
            peer = %session.peer(),
            %state,
            "Ignoring initialized notification outside the handshake"
        ),
    }
    Ok(())
}
