// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Reader and writer tasks of a session.
//!
//! The reader is the only consumer of the transport's inbound side. It frames and
//! decodes records, routes responses to the correlation table, and runs handlers.
//! Request handlers run on their own tasks so a slow handler never stalls the
//! reader. Notification handlers and a server's `initialize` handler run inline,
//! in arrival order, and should stay short.
//!
//! The writer is the only producer on the transport's outbound side. Every frame,
//! whether from the facade or from a handler, goes through the bounded queue it
//! drains, so records never interleave on the wire.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use super::codec::{self, Decoded};
use super::correlation::Completion;
use super::error::{ErrorCode, JsonRpcError};
use super::framing::LineFramer;
use super::handler::{Handler, MethodContext, RequestHandler};
use super::session::{Session, SessionRole, SessionState, HANDSHAKE_METHOD};
use super::types::{Id, Message, Notification, Request, Response};
use crate::error::ProtocolError;

/// How long teardown waits for queued frames to reach the transport.
const WRITER_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

async fn wait_terminating(state: &mut watch::Receiver<SessionState>) {
    let _ = state.wait_for(|s| s.is_terminating()).await;
}

pub(super) async fn run_reader(session: Session) {
    let inner = &session.inner;
    let mut framer = LineFramer::new(inner.config.max_frame_bytes);
    let mut state = inner.state.subscribe();

    let reason = loop {
        let received = tokio::select! {
            biased;
            _ = wait_terminating(&mut state) => break ProtocolError::TransportClosed,
            received = inner.transport.recv() => received,
        };

        match received {
            Ok(Some(chunk)) => {
                framer.extend(&chunk);
                if let Err(err) = dispatch_frames(&session, &mut framer).await {
                    break err;
                }
            }
            Ok(None) => {
                if let Some(bytes) = framer.finish() {
                    debug!(peer = %inner.peer, bytes, "Discarding partial record at end of stream");
                }
                break ProtocolError::TransportClosed;
            }
            Err(err) => break ProtocolError::from(err),
        }
    };

    finish(&session, reason).await;
}

async fn dispatch_frames(session: &Session, framer: &mut LineFramer) -> Result<(), ProtocolError> {
    loop {
        match framer.next_frame() {
            Ok(Some(record)) => dispatch_record(session, &record).await,
            Ok(None) => return Ok(()),
            Err(err) => {
                warn!(peer = %session.peer(), error = %err, "Inbound frame rejected, closing session");
                let reply = Response::error(Id::Null, JsonRpcError::parse_error(&err));
                let _ = session.send_message(reply.into()).await;
                return Err(err);
            }
        }
    }
}

async fn dispatch_record(session: &Session, record: &[u8]) {
    match codec::decode(record) {
        Decoded::Message(Message::Response(response)) => route_response(session, response),
        Decoded::Message(Message::Request(request)) => handle_request(session, request).await,
        Decoded::Message(Message::Notification(notification)) => {
            handle_notification(session, notification).await
        }
        Decoded::ParseError(error) => {
            warn!(peer = %session.peer(), %error, "Failed to parse inbound record");
            reply(session, Id::Null, Err(error)).await;
        }
        Decoded::Invalid {
            reply_to: Some(id),
            error,
        } => {
            warn!(peer = %session.peer(), %id, %error, "Invalid inbound message");
            reply(session, id, Err(error)).await;
        }
        Decoded::Invalid {
            reply_to: None,
            error,
        } => {
            warn!(peer = %session.peer(), %error, "Dropping invalid message without id");
        }
    }
}

fn route_response(session: &Session, response: Response) {
    let id = response.id.clone();
    let outcome = response.into_outcome().map_err(ProtocolError::Remote);
    match session.correlation().complete(&id, outcome) {
        Completion::Delivered => trace!(peer = %session.peer(), %id, "Response delivered"),
        Completion::Late => debug!(peer = %session.peer(), %id, "Dropped late response"),
        Completion::Unknown => {
            warn!(peer = %session.peer(), %id, "Response for unknown request id")
        }
    }
}

async fn handle_request(session: &Session, request: Request) {
    let Request {
        id, method, params, ..
    } = request;
    debug!(peer = %session.peer(), %id, %method, "Received request");

    let state = session.state();
    if session.role() == SessionRole::Server
        && method != HANDSHAKE_METHOD
        && state != SessionState::Ready
    {
        let error = JsonRpcError::new(
            ErrorCode::SessionNotReady,
            format!("Session not ready: {method} received while {state}"),
        );
        reply(session, id, Err(error)).await;
        return;
    }

    let handler = match session.registry().lookup(&method) {
        Some(Handler::Request(handler)) => handler,
        Some(Handler::Notification(_)) | None => {
            reply(session, id, Err(JsonRpcError::method_not_found(&method))).await;
            return;
        }
    };

    let context = MethodContext {
        session: session.clone(),
        request_id: Some(id.clone()),
    };
    let call = PendingCall {
        session: session.clone(),
        id,
        method,
        params,
        handler,
        context,
    };

    // The handshake changes the session state, so records behind it must see its effect.
    if session.role() == SessionRole::Server && call.method == HANDSHAKE_METHOD {
        call.run().await;
    } else {
        tokio::spawn(call.run());
    }
}

/// An inbound request bound to its handler, ready to run.
struct PendingCall {
    session: Session,
    id: Id,
    method: String,
    params: Option<serde_json::Value>,
    handler: Arc<dyn RequestHandler>,
    context: MethodContext,
}

impl PendingCall {
    async fn run(self) {
        let PendingCall {
            session,
            id,
            method,
            params,
            handler,
            context,
        } = self;
        let call = async move { handler.handle(params, context).await };
        let outcome = match AssertUnwindSafe(call).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(peer = %session.peer(), %id, %method, panic = %message, "Request handler panicked");
                Err(JsonRpcError::internal_error(message))
            }
        };
        if let Err(err) = &outcome {
            debug!(peer = %session.peer(), %id, %method, error = %err, "Request failed");
        }
        reply(&session, id, outcome).await;
    }
}

async fn handle_notification(session: &Session, notification: Notification) {
    let Notification { method, params, .. } = notification;
    debug!(peer = %session.peer(), %method, "Received notification");

    let handler = match session.registry().lookup(&method) {
        Some(Handler::Notification(handler)) => handler,
        Some(Handler::Request(_)) => {
            debug!(peer = %session.peer(), %method, "Ignoring notification for a request method");
            return;
        }
        None => {
            debug!(peer = %session.peer(), %method, "Ignoring unhandled notification");
            return;
        }
    };

    let context = MethodContext {
        session: session.clone(),
        request_id: None,
    };
    let call = async move { handler.handle(params, context).await };
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            warn!(peer = %session.peer(), %method, %error, "Notification handler failed")
        }
        Err(panic) => {
            error!(peer = %session.peer(), %method, panic = %panic_message(panic.as_ref()), "Notification handler panicked")
        }
    }
}

async fn reply(session: &Session, id: Id, outcome: Result<serde_json::Value, JsonRpcError>) {
    if let Err(err) = session.respond(id.clone(), outcome).await {
        debug!(peer = %session.peer(), %id, error = %err, "Could not send response");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// Tears the session down: drains waiters, flushes the writer, closes the
/// transport and publishes `Closed`.
async fn finish(session: &Session, reason: ProtocolError) {
    let inner = &session.inner;
    let reason = inner.failure.lock().clone().unwrap_or(reason);
    session.set_state(SessionState::Closing);

    let drained = inner.correlation.drain(reason.clone());

    let writer = inner.writer.lock().take();
    if let Some(mut writer) = writer {
        let joined = match tokio::time::timeout(WRITER_FLUSH_TIMEOUT, &mut writer).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(peer = %inner.peer, "Peer is not reading, abandoning queued frames");
                // Closing the transport fails the blocked write.
                if let Err(err) = inner.transport.close().await {
                    debug!(peer = %inner.peer, error = %err, "Error closing transport");
                }
                writer.await
            }
        };
        if let Err(err) = joined {
            error!(peer = %inner.peer, error = %err, "Writer task failed");
        }
    }

    if let Err(err) = inner.transport.close().await {
        debug!(peer = %inner.peer, error = %err, "Error closing transport");
    }
    session.set_state(SessionState::Closed);

    match reason {
        ProtocolError::TransportClosed => {
            info!(peer = %inner.peer, drained, "Session closed")
        }
        other => warn!(peer = %inner.peer, drained, error = %other, "Session closed after failure"),
    }
}

pub(super) async fn run_writer(session: Session, mut outbound: mpsc::Receiver<Vec<u8>>) {
    let inner = &session.inner;
    let mut state = inner.state.subscribe();

    loop {
        tokio::select! {
            biased;
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                if !write_frame(&session, &frame).await {
                    break;
                }
            }
            _ = wait_terminating(&mut state) => {
                while let Ok(frame) = outbound.try_recv() {
                    if !write_frame(&session, &frame).await {
                        break;
                    }
                }
                break;
            }
        }
    }
    outbound.close();
    trace!(peer = %inner.peer, "Writer stopped");
}

async fn write_frame(session: &Session, frame: &[u8]) -> bool {
    let inner = &session.inner;
    match inner.transport.send(frame).await {
        Ok(()) => true,
        Err(err) => {
            let err = ProtocolError::from(err);
            if err == ProtocolError::TransportClosed {
                debug!(peer = %inner.peer, "Peer closed while writing");
            } else {
                error!(peer = %inner.peer, error = %err, "Transport write failed");
            }
            inner.failure.lock().get_or_insert(err);
            // Unblocks the reader so the session is torn down.
            let _ = inner.transport.close().await;
            false
        }
    }
}
