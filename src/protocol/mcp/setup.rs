// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Setup and initialization utilities for MCP server endpoints.
//!
//! This module assembles the handler registry every server session shares:
//! the handshake, `ping`, and the tool and resource catalogs.

use std::sync::Arc;

use serde_json::{json, Value};

use super::methods::{
    register_initialize_methods, register_ping_method, register_resource_methods,
    register_tool_methods,
};
use super::resources::ResourceSet;
use super::tools::ToolSet;
use super::types::Implementation;
use crate::config::ServerConfig;
use crate::protocol::jsonrpc::HandlerRegistry;

/// Everything a server advertises and serves.
#[derive(Clone)]
pub struct ServerCatalog {
    /// Reported as `serverInfo` during the handshake
    pub info: Implementation,
    /// Reported verbatim as `capabilities` during the handshake
    pub capabilities: Value,
    /// Tools served by `tools/list` and `tools/call`
    pub tools: Arc<ToolSet>,
    /// Resources served by `resources/list` and `resources/read`
    pub resources: Arc<ResourceSet>,
}

impl ServerCatalog {
    /// A catalog with the built-in tools and resources.
    pub fn new(info: Implementation) -> Self {
        let resources = ResourceSet::with_builtins(&info);
        Self::with_sets(info, ToolSet::with_builtins(), resources)
    }

    /// A catalog with caller-supplied tools and resources.
    pub fn with_sets(info: Implementation, tools: ToolSet, resources: ResourceSet) -> Self {
        Self {
            info,
            capabilities: json!({"tools": {}, "resources": {}}),
            tools: Arc::new(tools),
            resources: Arc::new(resources),
        }
    }

    /// The default catalog for a configured server.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(Implementation::new(&config.name, &config.version))
    }
}

/// Registers all standard method handlers on `registry`.
pub fn register_standard_methods(registry: &HandlerRegistry, catalog: &ServerCatalog) {
    register_initialize_methods(registry, Arc::new(catalog.clone()));
    register_ping_method(registry);
    register_tool_methods(registry, Arc::clone(&catalog.tools));
    register_resource_methods(registry, Arc::clone(&catalog.resources));
}

/// Creates a registry with all standard methods pre-registered.
pub fn create_registry(catalog: &ServerCatalog) -> Arc<HandlerRegistry> {
    let registry = HandlerRegistry::new();
    register_standard_methods(&registry, catalog);
    Arc::new(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::jsonrpc::HandlerKind;

    #[test]
    fn test_standard_methods_registered() {
        let catalog = ServerCatalog::new(Implementation::new("SimpleTcpServer", "1.0.0"));
        let registry = create_registry(&catalog);

        assert_eq!(
            registry.methods(),
            vec![
                "initialize",
                "initialized",
                "notifications/initialized",
                "ping",
                "resources/list",
                "resources/read",
                "tools/call",
                "tools/list",
            ]
        );
        assert_eq!(
            registry.lookup("initialized").map(|h| h.kind()),
            Some(HandlerKind::Notification)
        );
        assert_eq!(
            registry.lookup("tools/call").map(|h| h.kind()),
            Some(HandlerKind::Request)
        );
    }

    #[test]
    fn test_catalog_from_config() {
        let catalog = ServerCatalog::from_config(&ServerConfig::default());
        assert_eq!(catalog.info, Implementation::new("SimpleTcpServer", "1.0.0"));
        assert_eq!(catalog.tools.len(), 2);
        assert_eq!(catalog.resources.len(), 1);
    }
}
