// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Integration tests for JSON-RPC sessions.
//! These tests join a client and a server session over an in-memory pipe and
//! exercise correlation, dispatch and teardown together.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_test::{assert_err, assert_ok};

use crate::config::SessionConfig;
use crate::error::ProtocolError;
use crate::protocol::jsonrpc::{
    ErrorCode, HandlerRegistry, JsonRpcError, Session, SessionRole, SessionState,
};
use crate::tests::{ready_pair, session_pair};
use crate::transport::MemoryTransport;

/// Server-side handlers shared by most tests.
fn service_registry() -> Arc<HandlerRegistry> {
    let registry = HandlerRegistry::new();
    registry.register_request("add", |params: Option<Value>, _ctx| async move {
        match serde_json::from_value::<Vec<i64>>(params.unwrap_or(Value::Null)) {
            Ok(numbers) => Ok(json!(numbers.iter().sum::<i64>())),
            Err(err) => Err(JsonRpcError::invalid_params(err)),
        }
    });
    registry.register_request("sleep", |params: Option<Value>, _ctx| async move {
        let ms = params
            .as_ref()
            .and_then(|p| p.get("ms"))
            .and_then(Value::as_u64)
            .unwrap_or(0);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(json!({ "slept": ms }))
    });
    registry.register_request("hang", |_params, _ctx| futures::future::pending());
    registry.register_request("boom", |_params, _ctx| async move {
        if true {
            panic!("boom");
        }
        Ok(Value::Null)
    });
    Arc::new(registry)
}

fn client_registry() -> Arc<HandlerRegistry> {
    Arc::new(HandlerRegistry::new())
}

#[tokio::test]
async fn test_request_response() {
    let (client, server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let sum = assert_ok!(client.request("add", Some(json!([1, 2, 3]))).await);
    assert_eq!(sum, json!(6));

    let err = assert_err!(client.request("add", Some(json!({"a": 1}))).await);
    assert_eq!(err.remote().unwrap().error_code(), Some(ErrorCode::InvalidParams));

    client.close().await;
    server.closed().await;
}

#[tokio::test]
async fn test_unknown_method() {
    let (client, _server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let err = assert_err!(client.request("missing", None).await);
    let remote = err.remote().unwrap();
    assert_eq!(remote.code, -32601);
    assert_eq!(remote.message, "Method not found: missing");
}

/// Responses are routed by id even when they arrive in a different order.
#[tokio::test]
async fn test_concurrent_requests_complete_out_of_order() {
    let (client, _server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let delays = [80u64, 10, 40, 0, 60];
    let calls = delays
        .iter()
        .map(|ms| client.request("sleep", Some(json!({ "ms": ms }))));
    let results = join_all(calls).await;

    for (ms, result) in delays.iter().zip(results) {
        assert_eq!(result.unwrap(), json!({ "slept": ms }));
    }
    assert_eq!(client.correlation().pending_count(), 0);
}

#[tokio::test]
async fn test_handler_panic_becomes_internal_error() {
    let (client, _server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let err = client.request("boom", None).await.unwrap_err();
    let remote = err.remote().unwrap();
    assert_eq!(remote.error_code(), Some(ErrorCode::InternalError));
    assert!(remote.message.contains("boom"));

    // The session survives the panic.
    assert_eq!(client.request("add", Some(json!([2, 2]))).await.unwrap(), json!(4));
}

#[tokio::test]
async fn test_notifications_run_in_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = HandlerRegistry::new();
    registry.register_notification("log", move |params: Option<Value>, _ctx| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(params.unwrap_or(Value::Null));
            Ok(())
        }
    });
    let (client, _server) = ready_pair(client_registry(), Arc::new(registry), &SessionConfig::default());

    for n in 0..20 {
        client.notify("log", Some(json!({ "n": n }))).await.unwrap();
    }
    for n in 0..20 {
        assert_eq!(rx.recv().await.unwrap(), json!({ "n": n }));
    }
    assert_eq!(client.correlation().pending_count(), 0);
}

#[tokio::test]
async fn test_cancel_resolves_waiter() {
    let (client, _server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let waiter = client.start_request("hang", None).await.unwrap();
    let id = waiter.id().clone();
    assert_eq!(client.correlation().pending_count(), 1);

    assert!(client.cancel(&id));
    assert!(!client.cancel(&id));
    assert_eq!(waiter.wait().await, Err(ProtocolError::Cancelled));
    assert_eq!(client.correlation().pending_count(), 0);
}

#[tokio::test]
async fn test_dropped_waiter_releases_entry() {
    let (client, _server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let waiter = client.start_request("hang", None).await.unwrap();
    assert_eq!(client.correlation().pending_count(), 1);
    drop(waiter);
    assert_eq!(client.correlation().pending_count(), 0);
}

#[tokio::test]
async fn test_timeout_then_late_response_dropped() {
    let (client, _server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let outcome = client
        .request_with_timeout("sleep", Some(json!({"ms": 100})), Duration::from_millis(10))
        .await;
    assert_eq!(outcome, Err(ProtocolError::Timeout));

    // The response still arrives, inside the grace window, and is discarded.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(client.correlation().late_responses(), 1);
    assert_eq!(client.correlation().pending_count(), 0);
    assert!(client.is_ready());
}

#[tokio::test]
async fn test_unbounded_timeout_completes_normally() {
    let (client, _server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let sum = assert_ok!(
        client
            .request_with_timeout("add", Some(json!([20, 22])), Duration::MAX)
            .await
    );
    assert_eq!(sum, json!(42));
    assert_eq!(client.correlation().pending_count(), 0);
}

#[tokio::test]
async fn test_peer_close_drains_waiters() {
    let (client, server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    let first = client.start_request("hang", None).await.unwrap();
    let second = client.start_request("hang", None).await.unwrap();

    server.close().await;
    assert_eq!(first.wait().await, Err(ProtocolError::TransportClosed));
    assert_eq!(second.wait().await, Err(ProtocolError::TransportClosed));

    client.closed().await;
    assert_eq!(client.state(), SessionState::Closed);
    assert_eq!(
        client.request("add", Some(json!([1]))).await,
        Err(ProtocolError::TransportClosed)
    );
}

#[tokio::test]
async fn test_outbound_calls_rejected_before_ready() {
    let (client, _server) = session_pair(client_registry(), service_registry(), &SessionConfig::default());

    let err = client.request("add", Some(json!([1]))).await.unwrap_err();
    assert_eq!(
        err,
        ProtocolError::NotReady {
            operation: "send request",
            state: SessionState::Connected,
        }
    );
    assert!(matches!(
        client.notify("log", None).await,
        Err(ProtocolError::NotReady { .. })
    ));
    assert_eq!(client.correlation().pending_count(), 0);
}

/// A server session answers `-32002` until its handshake completes.
#[tokio::test]
async fn test_server_rejects_requests_before_ready() {
    let (client, server) = session_pair(client_registry(), service_registry(), &SessionConfig::default());
    client.set_state(SessionState::Ready);

    let err = client.request("add", Some(json!([1]))).await.unwrap_err();
    let remote = err.remote().unwrap();
    assert_eq!(remote.error_code(), Some(ErrorCode::SessionNotReady));
    assert_eq!(remote.code, -32002);

    server.set_state(SessionState::Ready);
    assert_eq!(client.request("add", Some(json!([1]))).await.unwrap(), json!(1));
}

#[tokio::test]
async fn test_server_can_call_client() {
    let registry = HandlerRegistry::new();
    registry.register_request("whoami", |_params, ctx: crate::protocol::jsonrpc::MethodContext| async move {
        Ok(json!({ "role": format!("{:?}", ctx.session.role()) }))
    });
    let (_client, server) = ready_pair(Arc::new(registry), service_registry(), &SessionConfig::default());

    let answer = server.request("whoami", None).await.unwrap();
    assert_eq!(answer, json!({ "role": "Client" }));
}

/// A tiny outbound queue blocks producers instead of dropping frames.
#[tokio::test]
async fn test_backpressure_preserves_every_request() {
    let config = SessionConfig {
        outbound_queue_capacity: 1,
        ..SessionConfig::default()
    };
    let (client, _server) = ready_pair(client_registry(), service_registry(), &config);

    let calls = (0..200i64).map(|n| {
        let client = client.clone();
        async move { client.request("add", Some(json!([n, 1]))).await }
    });
    let results = join_all(calls).await;

    for (n, result) in results.into_iter().enumerate() {
        assert_eq!(result.unwrap(), json!(n as i64 + 1));
    }
}

#[tokio::test]
async fn test_shutdown_is_idempotent() {
    let (client, server) = ready_pair(client_registry(), service_registry(), &SessionConfig::default());

    client.shutdown();
    client.shutdown();
    client.closed().await;
    server.closed().await;
    assert_eq!(client.state(), SessionState::Closed);
    assert_eq!(server.state(), SessionState::Closed);
    assert!(!client.set_state(SessionState::Ready));
}

/// A peer that never reads must not keep the session from closing.
#[tokio::test]
async fn test_close_with_stalled_peer() {
    let (_stalled, local) = MemoryTransport::pair(64);
    let session = Session::spawn(
        Arc::new(local),
        client_registry(),
        SessionRole::Client,
        &SessionConfig::default(),
    );
    session.set_state(SessionState::Ready);

    for n in 0..50 {
        session.notify("log", Some(json!({ "n": n }))).await.unwrap();
    }

    let closed = tokio::time::timeout(Duration::from_secs(5), session.close()).await;
    assert!(closed.is_ok(), "close blocked while the peer was not reading");
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_failing_notification_handlers_send_nothing() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let registry = HandlerRegistry::new();
    registry.register_notification("reject", |_params, _ctx| async {
        Err(JsonRpcError::invalid_params("rejected"))
    });
    registry.register_notification("explode", |_params, _ctx| async {
        if true {
            panic!("explode");
        }
        Ok(())
    });
    registry.register_notification("log", move |params: Option<Value>, _ctx| {
        let tx = tx.clone();
        async move {
            let _ = tx.send(params.unwrap_or(Value::Null));
            Ok(())
        }
    });
    let (client, _server) = ready_pair(client_registry(), Arc::new(registry), &SessionConfig::default());

    client.notify("reject", None).await.unwrap();
    client.notify("explode", None).await.unwrap();
    client.notify("log", Some(json!("after"))).await.unwrap();

    // The server kept reading after both failures.
    assert_eq!(rx.recv().await.unwrap(), json!("after"));
    assert!(client.is_ready());
    assert_eq!(client.correlation().late_responses(), 0);
}
