// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Resource catalog served through `resources/list` and `resources/read`.

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::json;

use super::types::{Implementation, ResourceContents, ResourceDescriptor, PROTOCOL_VERSION};
use crate::protocol::jsonrpc::JsonRpcError;

/// URI of the built-in server description resource.
pub const SERVER_INFO_URI: &str = "kaula://server/info";

/// Produces the textual contents of a resource.
pub trait ResourceReader: Send + Sync {
    /// Reads the resource at `uri`.
    fn read(&self, uri: String) -> BoxFuture<'static, Result<String, JsonRpcError>>;
}

impl<F, Fut> ResourceReader for F
where
    F: Send + Sync + 'static + Fn(String) -> Fut,
    Fut: Future<Output = Result<String, JsonRpcError>> + Send + 'static,
{
    fn read(&self, uri: String) -> BoxFuture<'static, Result<String, JsonRpcError>> {
        Box::pin((self)(uri))
    }
}

#[derive(Clone)]
struct RegisteredResource {
    descriptor: ResourceDescriptor,
    reader: Arc<dyn ResourceReader>,
}

/// Ordered set of readable resources, keyed by URI.
#[derive(Clone, Default)]
pub struct ResourceSet {
    resources: Vec<RegisteredResource>,
}

impl ResourceSet {
    /// Creates an empty resource set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resource set holding the built-in server description.
    pub fn with_builtins(server: &Implementation) -> Self {
        let text = json!({
            "name": server.name,
            "version": server.version,
            "protocolVersion": PROTOCOL_VERSION,
        })
        .to_string();

        let mut resources = Self::new();
        resources.register(
            ResourceDescriptor {
                uri: SERVER_INFO_URI.to_string(),
                name: Some("Server information".to_string()),
                description: Some("Name and version of this server".to_string()),
                mime_type: Some("application/json".to_string()),
            },
            move |_uri: String| {
                let text = text.clone();
                async move { Ok(text) }
            },
        );
        resources
    }

    /// Adds a resource, replacing any resource with the same URI.
    pub fn register<R: ResourceReader + 'static>(&mut self, descriptor: ResourceDescriptor, reader: R) {
        let resource = RegisteredResource {
            descriptor,
            reader: Arc::new(reader),
        };
        match self
            .resources
            .iter_mut()
            .find(|r| r.descriptor.uri == resource.descriptor.uri)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    /// Descriptors of every resource, in registration order.
    pub fn descriptors(&self) -> Vec<ResourceDescriptor> {
        self.resources.iter().map(|r| r.descriptor.clone()).collect()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Reads a resource. Unknown URIs fail with `-32602`.
    pub async fn read(&self, uri: &str) -> Result<ResourceContents, JsonRpcError> {
        let resource = self
            .resources
            .iter()
            .find(|r| r.descriptor.uri == uri)
            .ok_or_else(|| JsonRpcError::invalid_params(format!("unknown resource: {uri}")))?;

        let text = resource.reader.read(uri.to_string()).await?;
        Ok(ResourceContents {
            uri: uri.to_string(),
            mime_type: resource.descriptor.mime_type.clone(),
            text,
        })
    }
}
