// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Error objects for the JSON-RPC 2.0 wire format.
//!
//! This module defines error codes and the error object carried in failed
//! responses, as described by the
//! [JSON-RPC 2.0 specification](https://www.jsonrpc.org/specification#error_object).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Standard JSON-RPC 2.0 error codes, plus the application codes this engine emits.
///
/// The error codes from -32768 to -32000 are reserved for pre-defined errors.
/// Codes -32099..=-32000 are available for implementation-defined server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Parse error (-32700)
    /// Invalid JSON was received.
    ParseError = -32700,

    /// Invalid Request (-32600)
    /// The JSON sent is not a valid Request object.
    InvalidRequest = -32600,

    /// Method not found (-32601)
    /// The method does not exist / is not available.
    MethodNotFound = -32601,

    /// Invalid params (-32602)
    /// Invalid method parameter(s).
    InvalidParams = -32602,

    /// Internal error (-32603)
    /// A handler failed unexpectedly.
    InternalError = -32603,

    /// Session not ready (-32002)
    /// A request other than `initialize` arrived before the handshake completed.
    SessionNotReady = -32002,

    /// Server error (-32000 to -32099)
    /// Reserved for implementation-defined server errors.
    ServerError = -32000,
}

impl ErrorCode {
    /// Returns a string description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::ParseError => "Parse error",
            ErrorCode::InvalidRequest => "Invalid Request",
            ErrorCode::MethodNotFound => "Method not found",
            ErrorCode::InvalidParams => "Invalid params",
            ErrorCode::InternalError => "Internal error",
            ErrorCode::SessionNotReady => "Session not ready",
            ErrorCode::ServerError => "Server error",
        }
    }

    /// Create an ErrorCode from a raw integer value.
    ///
    /// Returns None if the code is not a valid predefined error code.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -32700 => Some(ErrorCode::ParseError),
            -32600 => Some(ErrorCode::InvalidRequest),
            -32601 => Some(ErrorCode::MethodNotFound),
            -32602 => Some(ErrorCode::InvalidParams),
            -32603 => Some(ErrorCode::InternalError),
            -32002 => Some(ErrorCode::SessionNotReady),
            c if (-32099..=-32000).contains(&c) => Some(ErrorCode::ServerError),
            _ => None,
        }
    }

    /// Returns the integer error code.
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> i32 {
        code as i32
    }
}

/// JSON-RPC error object as defined in the specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// The error code
    pub code: i32,

    /// A short description of the error
    pub message: String,

    /// Additional information about the error (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Creates a new JSON-RPC error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: None,
        }
    }

    /// Creates a new JSON-RPC error with additional data.
    pub fn with_data(code: ErrorCode, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            code: code as i32,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Creates a parse error naming what the JSON parser rejected.
    pub fn parse_error<S: fmt::Display>(detail: S) -> Self {
        Self::new(ErrorCode::ParseError, format!("Parse error: {detail}"))
    }

    /// Creates an invalid request error.
    pub fn invalid_request<S: fmt::Display>(detail: S) -> Self {
        Self::new(ErrorCode::InvalidRequest, format!("Invalid Request: {detail}"))
    }

    /// Creates a standard method not found error.
    pub fn method_not_found<S: fmt::Display>(method: S) -> Self {
        Self::new(ErrorCode::MethodNotFound, format!("Method not found: {method}"))
    }

    /// Creates a standard invalid params error.
    pub fn invalid_params<S: fmt::Display>(msg: S) -> Self {
        Self::new(ErrorCode::InvalidParams, format!("Invalid params: {msg}"))
    }

    /// Creates a standard internal error.
    pub fn internal_error<S: fmt::Display>(msg: S) -> Self {
        Self::new(ErrorCode::InternalError, format!("Internal error: {msg}"))
    }

    /// Returns the typed code, if it is one this engine knows.
    pub fn error_code(&self) -> Option<ErrorCode> {
        ErrorCode::from_code(self.code)
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_descriptions() {
        assert_eq!(ErrorCode::ParseError.description(), "Parse error");
        assert_eq!(ErrorCode::InvalidRequest.description(), "Invalid Request");
        assert_eq!(ErrorCode::MethodNotFound.description(), "Method not found");
        assert_eq!(ErrorCode::InvalidParams.description(), "Invalid params");
        assert_eq!(ErrorCode::InternalError.description(), "Internal error");
    }

    #[test]
    fn test_error_code_from_code() {
        assert_eq!(ErrorCode::from_code(-32700), Some(ErrorCode::ParseError));
        assert_eq!(ErrorCode::from_code(-32600), Some(ErrorCode::InvalidRequest));
        assert_eq!(ErrorCode::from_code(-32601), Some(ErrorCode::MethodNotFound));
        assert_eq!(ErrorCode::from_code(-32602), Some(ErrorCode::InvalidParams));
        assert_eq!(ErrorCode::from_code(-32603), Some(ErrorCode::InternalError));
        assert_eq!(ErrorCode::from_code(-32002), Some(ErrorCode::SessionNotReady));

        // Server error range
        assert_eq!(ErrorCode::from_code(-32000), Some(ErrorCode::ServerError));
        assert_eq!(ErrorCode::from_code(-32099), Some(ErrorCode::ServerError));
        assert_eq!(ErrorCode::from_code(-32050), Some(ErrorCode::ServerError));

        // Invalid codes
        assert_eq!(ErrorCode::from_code(0), None);
        assert_eq!(ErrorCode::from_code(-1), None);
        assert_eq!(ErrorCode::from_code(-32100), None);
    }

    #[test]
    fn test_jsonrpc_error_creation() {
        let error = JsonRpcError::new(ErrorCode::ParseError, "Invalid JSON");
        assert_eq!(error.code, -32700);
        assert_eq!(error.message, "Invalid JSON");
        assert!(error.data.is_none());

        let error_with_data = JsonRpcError::with_data(
            ErrorCode::InvalidParams,
            "Invalid parameters",
            serde_json::json!({"field": "text", "issue": "required"}),
        );
        assert_eq!(error_with_data.code, -32602);
        assert_eq!(
            error_with_data.data,
            Some(serde_json::json!({"field": "text", "issue": "required"}))
        );
    }

    #[test]
    fn test_standard_errors() {
        let method_not_found = JsonRpcError::method_not_found("nope");
        assert_eq!(method_not_found.code, -32601);
        assert_eq!(method_not_found.message, "Method not found: nope");

        let parse = JsonRpcError::parse_error("expected value at line 1 column 1");
        assert_eq!(parse.code, -32700);
        assert!(parse.message.starts_with("Parse error: "));

        let invalid_params = JsonRpcError::invalid_params("missing required argument: text");
        assert_eq!(invalid_params.error_code(), Some(ErrorCode::InvalidParams));
        assert!(invalid_params.message.contains("text"));
    }

    #[test]
    fn test_data_is_omitted_when_absent() {
        let json = serde_json::to_string(&JsonRpcError::internal_error("boom")).unwrap();
        assert_eq!(json, r#"{"code":-32603,"message":"Internal error: boom"}"#);
    }
}
