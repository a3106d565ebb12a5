// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Handler registry for inbound JSON-RPC calls.
//!
//! Every method name maps to a [`Handler`], which is either a request handler
//! (its outcome becomes the response) or a notification handler (its outcome is
//! only logged). Plain async closures implement both handler traits.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use super::error::JsonRpcError;
use super::session::Session;
use super::types::Id;

/// Information passed to every handler invocation.
#[derive(Debug, Clone)]
pub struct MethodContext {
    /// The session the call arrived on. Handlers may issue their own requests
    /// or notifications through it, or change its state.
    pub session: Session,

    /// Id of the inbound request; `None` for notifications.
    pub request_id: Option<Id>,
}

/// Type alias for request handler response.
pub type MethodResult = Result<Value, JsonRpcError>;

/// Type alias for a request handler's future.
pub type MethodHandlerFuture = BoxFuture<'static, MethodResult>;

/// Type alias for notification handler outcome.
pub type NotificationResult = Result<(), JsonRpcError>;

/// Type alias for a notification handler's future.
pub type NotificationHandlerFuture = BoxFuture<'static, NotificationResult>;

/// Handles calls that expect a response.
pub trait RequestHandler: Send + Sync {
    /// Handle a method call asynchronously.
    ///
    /// # Parameters
    /// * `params` - The parameters passed to the method.
    /// * `context` - The session and request id.
    fn handle(&self, params: Option<Value>, context: MethodContext) -> MethodHandlerFuture;
}

impl<F, Fut> RequestHandler for F
where
    F: Send + Sync + 'static + Fn(Option<Value>, MethodContext) -> Fut,
    Fut: Future<Output = MethodResult> + Send + 'static,
{
    fn handle(&self, params: Option<Value>, context: MethodContext) -> MethodHandlerFuture {
        Box::pin((self)(params, context))
    }
}

/// Handles calls that never receive a response.
pub trait NotificationHandler: Send + Sync {
    /// Handle a notification asynchronously. Errors are logged by the caller.
    fn handle(&self, params: Option<Value>, context: MethodContext) -> NotificationHandlerFuture;
}

impl<F, Fut> NotificationHandler for F
where
    F: Send + Sync + 'static + Fn(Option<Value>, MethodContext) -> Fut,
    Fut: Future<Output = NotificationResult> + Send + 'static,
{
    fn handle(&self, params: Option<Value>, context: MethodContext) -> NotificationHandlerFuture {
        Box::pin((self)(params, context))
    }
}

/// Which kind of call a handler serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Serves requests
    Request,
    /// Serves notifications
    Notification,
}

/// A registered handler.
#[derive(Clone)]
pub enum Handler {
    /// Produces the response for a request
    Request(Arc<dyn RequestHandler>),
    /// Consumes a notification
    Notification(Arc<dyn NotificationHandler>),
}

impl Handler {
    /// Returns the kind of call this handler serves.
    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Request(_) => HandlerKind::Request,
            Handler::Notification(_) => HandlerKind::Notification,
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler::{:?}", self.kind())
    }
}

/// Method name to handler mapping, shared by every session bound to it.
///
/// Registration takes `&self` and may happen at any time; a dispatch already
/// in flight keeps the handler it looked up.
#[derive(Default)]
pub struct HandlerRegistry {
    methods: DashMap<String, Handler>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler, replacing any previous one for the method.
    pub fn register(&self, method: impl Into<String>, handler: Handler) {
        self.methods.insert(method.into(), handler);
    }

    /// Registers a request handler function.
    pub fn register_request<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Send + Sync + 'static + Fn(Option<Value>, MethodContext) -> Fut,
        Fut: Future<Output = MethodResult> + Send + 'static,
    {
        self.register(method, Handler::Request(Arc::new(handler)));
    }

    /// Registers a notification handler function.
    pub fn register_notification<F, Fut>(&self, method: impl Into<String>, handler: F)
    where
        F: Send + Sync + 'static + Fn(Option<Value>, MethodContext) -> Fut,
        Fut: Future<Output = NotificationResult> + Send + 'static,
    {
        self.register(method, Handler::Notification(Arc::new(handler)));
    }

    /// Removes the handler for a method, returning it.
    pub fn unregister(&self, method: &str) -> Option<Handler> {
        self.methods.remove(method).map(|(_, handler)| handler)
    }

    /// Looks up the handler for a method.
    pub fn lookup(&self, method: &str) -> Option<Handler> {
        self.methods.get(method).map(|entry| entry.value().clone())
    }

    /// Returns true if a handler is registered for the method.
    pub fn contains(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Registered method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_lookup() {
        let registry = HandlerRegistry::new();
        registry.register_request("ping", |_params, _ctx| async { Ok(json!({})) });
        registry.register_notification("initialized", |_params, _ctx| async { Ok(()) });

        assert_eq!(registry.lookup("ping").map(|h| h.kind()), Some(HandlerKind::Request));
        assert_eq!(
            registry.lookup("initialized").map(|h| h.kind()),
            Some(HandlerKind::Notification)
        );
        assert!(registry.lookup("nope").is_none());
        assert_eq!(registry.methods(), vec!["initialized".to_string(), "ping".to_string()]);
    }

    #[test]
    fn test_reregistration_replaces_handler() {
        let registry = HandlerRegistry::new();
        registry.register_request("x", |_params, _ctx| async { Ok(json!(1)) });
        registry.register_notification("x", |_params, _ctx| async { Ok(()) });

        assert_eq!(registry.lookup("x").map(|h| h.kind()), Some(HandlerKind::Notification));
        assert!(registry.unregister("x").is_some());
        assert!(!registry.contains("x"));
    }
}
