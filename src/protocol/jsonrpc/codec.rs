// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Message codec for the JSON-RPC 2.0 wire format.
//!
//! Decoding turns one framed record into a [`Decoded`] value. The record is
//! parsed into a generic JSON value first and then classified by the fields it
//! carries, so that a response whose result is `null` is still recognized as a
//! response and a malformed message can still yield the id needed to reply.

use serde_json::{Map, Value};

use super::error::JsonRpcError;
use super::framing::encode_frame;
use super::types::{Id, Message, Notification, Request, Response, JSONRPC_VERSION};
use crate::error::ProtocolError;

/// Result of decoding a single inbound record.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A well-formed request, response or notification.
    Message(Message),

    /// The record was not valid JSON. Answered with `-32700` and a null id.
    ParseError(JsonRpcError),

    /// Valid JSON that is not a valid JSON-RPC 2.0 message.
    ///
    /// `reply_to` holds the id to answer under when one could be recovered;
    /// without it the record is logged and dropped.
    Invalid {
        /// Id to echo in the `-32600` reply, if any
        reply_to: Option<Id>,
        /// The error to send
        error: JsonRpcError,
    },
}

impl Decoded {
    fn invalid(reply_to: Option<Id>, detail: &str) -> Self {
        Decoded::Invalid {
            reply_to,
            error: JsonRpcError::invalid_request(detail),
        }
    }
}

/// Decodes one framed record (without its terminator).
pub fn decode(record: &[u8]) -> Decoded {
    match serde_json::from_slice::<Value>(record) {
        Ok(value) => classify(value),
        Err(e) => Decoded::ParseError(JsonRpcError::parse_error(e)),
    }
}

/// Classifies a parsed JSON value as a JSON-RPC message.
pub fn classify(value: Value) -> Decoded {
    match value {
        Value::Object(map) => classify_object(map),
        Value::Array(_) => Decoded::invalid(Some(Id::Null), "batch requests are not supported"),
        _ => Decoded::invalid(None, "message must be a JSON object"),
    }
}

fn classify_object(mut map: Map<String, Value>) -> Decoded {
    // Id to answer under if the message turns out to be malformed.
    let reply_to = map
        .get("id")
        .map(|raw| Id::from_value(raw).unwrap_or(Id::Null));

    if map.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Decoded::invalid(reply_to, "jsonrpc must be \"2.0\"");
    }

    if let Some(method) = map.remove("method") {
        let method = match method {
            Value::String(m) if !m.is_empty() => m,
            _ => return Decoded::invalid(reply_to, "method must be a non-empty string"),
        };

        let params = match map.remove("params") {
            None | Some(Value::Null) => None,
            Some(p @ (Value::Object(_) | Value::Array(_))) => Some(p),
            Some(_) => return Decoded::invalid(reply_to, "params must be an object or an array"),
        };

        let message = match map.get("id") {
            None => Message::Notification(Notification {
                jsonrpc: JSONRPC_VERSION.to_string(),
                method,
                params,
            }),
            Some(raw) => match Id::from_value(raw) {
                Some(id) if !id.is_null() => Message::Request(Request {
                    jsonrpc: JSONRPC_VERSION.to_string(),
                    id,
                    method,
                    params,
                }),
                _ => {
                    return Decoded::invalid(
                        Some(Id::Null),
                        "request id must be an integer or a string",
                    )
                }
            },
        };
        return Decoded::Message(message);
    }

    let result = map.remove("result");
    let error = map.remove("error");
    if result.is_none() && error.is_none() {
        return Decoded::invalid(reply_to, "message has neither method nor result or error");
    }
    if result.is_some() && error.is_some() {
        return Decoded::invalid(reply_to, "response must not carry both result and error");
    }

    let id = match map.get("id").map(Id::from_value) {
        Some(Some(id)) => id,
        Some(None) => return Decoded::invalid(Some(Id::Null), "response id must be an integer, a string or null"),
        None => return Decoded::invalid(None, "response is missing id"),
    };

    let error = match error.map(serde_json::from_value::<JsonRpcError>) {
        Some(Ok(e)) => Some(e),
        Some(Err(_)) => return Decoded::invalid(Some(id), "error must be an object with code and message"),
        None => None,
    };

    Decoded::Message(Message::Response(Response {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result,
        error,
    }))
}

/// Serializes a message into a newline-terminated frame.
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let record = serde_json::to_vec(message).map_err(|e| ProtocolError::Encode(e.to_string()))?;
    encode_frame(&record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::jsonrpc::error::ErrorCode;
    use serde_json::json;
    use test_case::test_case;

    fn decode_str(s: &str) -> Decoded {
        decode(s.as_bytes())
    }

    #[test]
    fn test_decode_request() {
        let decoded = decode_str(r#"{"jsonrpc":"2.0","id":1,"method":"ping","params":{}}"#);
        assert_eq!(
            decoded,
            Decoded::Message(Message::Request(Request::new(1, "ping", Some(json!({})))))
        );
    }

    #[test]
    fn test_decode_notification() {
        let decoded = decode_str(r#"{"jsonrpc":"2.0","method":"initialized","params":{}}"#);
        assert_eq!(
            decoded,
            Decoded::Message(Message::Notification(Notification::new(
                "initialized",
                Some(json!({}))
            )))
        );
    }

    #[test]
    fn test_decode_null_result_response() {
        let decoded = decode_str(r#"{"jsonrpc":"2.0","id":"a","result":null}"#);
        assert_eq!(
            decoded,
            Decoded::Message(Message::Response(Response::success(Id::from("a"), Value::Null)))
        );
    }

    #[test]
    fn test_decode_error_response() {
        let decoded = decode_str(
            r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error: x"}}"#,
        );
        let Decoded::Message(Message::Response(response)) = decoded else {
            panic!("expected a response, got {decoded:?}");
        };
        assert_eq!(response.id, Id::Null);
        assert_eq!(response.error.unwrap().error_code(), Some(ErrorCode::ParseError));
    }

    #[test]
    fn test_decode_parse_error() {
        let Decoded::ParseError(error) = decode_str("not json") else {
            panic!("expected a parse error");
        };
        assert_eq!(error.code, -32700);
        assert!(error.message.starts_with("Parse error: "));

        assert!(matches!(decode(&[0xff, 0xfe]), Decoded::ParseError(_)));
    }

    #[test_case(r#"{"id":3,"method":"ping"}"#, Some(Id::Number(3)) ; "missing version")]
    #[test_case(r#"{"jsonrpc":"1.0","id":"x","method":"ping"}"#, Some(Id::from("x")) ; "wrong version")]
    #[test_case(r#"{"jsonrpc":"2.0","id":4,"method":7}"#, Some(Id::Number(4)) ; "numeric method")]
    #[test_case(r#"{"jsonrpc":"2.0","id":4,"method":""}"#, Some(Id::Number(4)) ; "empty method")]
    #[test_case(r#"{"jsonrpc":"2.0","id":5,"method":"x","params":3}"#, Some(Id::Number(5)) ; "scalar params")]
    #[test_case(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#, Some(Id::Null) ; "null request id")]
    #[test_case(r#"{"jsonrpc":"2.0","id":1.5,"method":"ping"}"#, Some(Id::Null) ; "fractional request id")]
    #[test_case(r#"{"jsonrpc":"2.0","id":6}"#, Some(Id::Number(6)) ; "no method no outcome")]
    #[test_case(r#"{"jsonrpc":"2.0","id":6,"result":1,"error":{"code":1,"message":"m"}}"#, Some(Id::Number(6)) ; "both outcomes")]
    #[test_case(r#"{"jsonrpc":"2.0","id":7,"error":"bad"}"#, Some(Id::Number(7)) ; "error not an object")]
    #[test_case(r#"{"jsonrpc":"2.0","result":{}}"#, None ; "response without id")]
    #[test_case(r#"[{"jsonrpc":"2.0","id":1,"method":"ping"}]"#, Some(Id::Null) ; "batch")]
    #[test_case(r#""hello""#, None ; "bare string")]
    #[test_case(r#"{"method":"ping"}"#, None ; "notification without version")]
    fn test_decode_invalid(record: &str, expected_reply: Option<Id>) {
        match decode_str(record) {
            Decoded::Invalid { reply_to, error } => {
                assert_eq!(reply_to, expected_reply);
                assert_eq!(error.error_code(), Some(ErrorCode::InvalidRequest));
            }
            other => panic!("expected Invalid for {record}, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_appends_terminator() {
        let frame = encode(&Response::success(Id::Number(2), json!({})).into()).unwrap();
        assert_eq!(frame, b"{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{}}\n".to_vec());
    }

    #[test]
    fn test_encoded_strings_keep_newlines_escaped() {
        let message: Message = Notification::new("log", Some(json!({"text": "a\nb"}))).into();
        let frame = encode(&message).unwrap();
        assert_eq!(frame.iter().filter(|b| **b == b'\n').count(), 1);
        assert_eq!(decode(&frame[..frame.len() - 1]), Decoded::Message(message));
    }
}
