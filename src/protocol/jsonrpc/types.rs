// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Types for the JSON-RPC 2.0 protocol.
//!
//! This module defines the message variants exchanged over a session. Messages
//! are serialized directly with serde; decoding goes through
//! [`codec::decode`](super::codec::decode), which classifies a record by the
//! fields it carries before building one of these types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::error::JsonRpcError;

/// The only protocol version this engine speaks.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request identifier.
///
/// Responses echo the identifier verbatim, so a string id `"7"` and a numeric
/// id `7` are different ids. `Null` only appears in responses to messages whose
/// id could not be recovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier
    Number(i64),

    /// String identifier
    String(String),

    /// Null identifier
    Null,
}

impl Id {
    /// Reads an id from a raw JSON value.
    ///
    /// Returns `None` for values that are not valid identifiers: fractional or
    /// out-of-range numbers, booleans, arrays and objects.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Id::Number),
            Value::String(s) => Some(Id::String(s.clone())),
            Value::Null => Some(Id::Null),
            _ => None,
        }
    }

    /// Returns true for the null id.
    pub fn is_null(&self) -> bool {
        matches!(self, Id::Null)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "{s:?}"),
            Id::Number(n) => write!(f, "{n}"),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<i64> for Id {
    fn from(n: i64) -> Self {
        Id::Number(n)
    }
}

impl From<&str> for Id {
    fn from(s: &str) -> Self {
        Id::String(s.to_string())
    }
}

impl From<String> for Id {
    fn from(s: String) -> Self {
        Id::String(s)
    }
}

/// A JSON-RPC 2.0 request: a call that expects exactly one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// JSON-RPC protocol version, always "2.0"
    pub jsonrpc: String,

    /// Request identifier, echoed by the response
    pub id: Id,

    /// Name of the method to be invoked
    pub method: String,

    /// Method parameters, positional (array) or named (object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    /// Creates a new JSON-RPC 2.0 request.
    pub fn new(id: impl Into<Id>, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: id.into(),
            method: method.into(),
            params: params.filter(|p| !p.is_null()),
        }
    }
}

/// A JSON-RPC 2.0 notification: a call that never receives a response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    /// JSON-RPC protocol version, always "2.0"
    pub jsonrpc: String,

    /// Name of the method to be invoked
    pub method: String,

    /// Method parameters, positional (array) or named (object)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Creates a new JSON-RPC 2.0 notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: params.filter(|p| !p.is_null()),
        }
    }
}

/// A JSON-RPC 2.0 response object.
///
/// Exactly one of `result` and `error` is present. A successful call whose
/// result is JSON `null` carries `Some(Value::Null)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// JSON-RPC protocol version, always "2.0"
    pub jsonrpc: String,

    /// Same identifier as the request this is responding to
    pub id: Id,

    /// The result of the method invocation, if successful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// The error object, if an error occurred
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl Response {
    /// Creates a new successful JSON-RPC 2.0 response.
    pub fn success(id: Id, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Creates a new error JSON-RPC 2.0 response.
    pub fn error(id: Id, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Packages a handler outcome under the given id.
    pub fn from_outcome(id: Id, outcome: Result<Value, JsonRpcError>) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(error) => Self::error(id, error),
        }
    }

    /// Returns true if this response contains a successful result.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Returns true if this response contains an error.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Splits the response into its outcome.
    pub fn into_outcome(self) -> Result<Value, JsonRpcError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Any well-formed JSON-RPC 2.0 message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A call expecting a response
    Request(Request),

    /// A reply to an earlier request
    Response(Response),

    /// A call expecting no response
    Notification(Notification),
}

impl Message {
    /// Returns the method name for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            Message::Request(r) => Some(&r.method),
            Message::Notification(n) => Some(&n.method),
            Message::Response(_) => None,
        }
    }

    /// Returns the id carried by requests and responses.
    pub fn id(&self) -> Option<&Id> {
        match self {
            Message::Request(r) => Some(&r.id),
            Message::Response(r) => Some(&r.id),
            Message::Notification(_) => None,
        }
    }
}

impl From<Request> for Message {
    fn from(r: Request) -> Self {
        Message::Request(r)
    }
}

impl From<Response> for Message {
    fn from(r: Response) -> Self {
        Message::Response(r)
    }
}

impl From<Notification> for Message {
    fn from(n: Notification) -> Self {
        Message::Notification(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::jsonrpc::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let request = Request::new(
            1,
            "initialize",
            Some(json!({"protocolVersion": "2024-11-05"})),
        );

        let json_str = serde_json::to_string(&request).unwrap();
        let expected = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05"}}"#;
        assert_eq!(json_str, expected);
    }

    #[test]
    fn test_notification_serialization() {
        let notification = Notification::new("initialized", Some(json!({})));

        let json_str = serde_json::to_string(&notification).unwrap();
        assert_eq!(json_str, r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#);
    }

    #[test]
    fn test_null_params_are_dropped() {
        let request = Request::new(3, "ping", Some(Value::Null));
        assert!(request.params.is_none());
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#
        );
    }

    #[test]
    fn test_response_serialization() {
        let success = Response::success(Id::Number(2), json!({}));
        assert_eq!(
            serde_json::to_string(&success).unwrap(),
            r#"{"jsonrpc":"2.0","id":2,"result":{}}"#
        );

        let error = Response::error(
            Id::String("abc".to_string()),
            JsonRpcError::new(ErrorCode::MethodNotFound, "Method not found: nope"),
        );
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"jsonrpc":"2.0","id":"abc","error":{"code":-32601,"message":"Method not found: nope"}}"#
        );
    }

    #[test]
    fn test_null_result_is_still_a_result() {
        let response = Response::success(Id::Number(9), Value::Null);
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"jsonrpc":"2.0","id":9,"result":null}"#
        );
        assert_eq!(response.into_outcome(), Ok(Value::Null));
    }

    #[test]
    fn test_id_from_value() {
        assert_eq!(Id::from_value(&json!(5)), Some(Id::Number(5)));
        assert_eq!(Id::from_value(&json!("5")), Some(Id::String("5".into())));
        assert_eq!(Id::from_value(&Value::Null), Some(Id::Null));
        assert_eq!(Id::from_value(&json!(1.5)), None);
        assert_eq!(Id::from_value(&json!({"id": 1})), None);
        assert_ne!(Id::from_value(&json!(7)), Id::from_value(&json!("7")));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("abc".to_string()).to_string(), "\"abc\"");
        assert_eq!(Id::Number(123).to_string(), "123");
        assert_eq!(Id::Null.to_string(), "null");
    }
}
