// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! Per-endpoint session: state machine plus the handle used to talk to the peer.
//!
//! A [`Session`] owns everything bound to one transport: the correlation table,
//! the id allocator, the outbound queue and the reader and writer tasks. Handles
//! are cheap to clone; the tasks keep the session alive until the transport
//! closes, at which point every outstanding waiter is drained.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use super::codec;
use super::correlation::{CorrelationTable, Outcome, Waiter};
use super::dispatch;
use super::error::JsonRpcError;
use super::handler::HandlerRegistry;
use super::id::IdAllocator;
use super::types::{Id, Message, Notification, Request, Response};
use crate::config::SessionConfig;
use crate::error::ProtocolError;
use crate::transport::Transport;

/// The one request permitted before a session is ready.
pub const HANDSHAKE_METHOD: &str = "initialize";

/// Stand-in deadline for timeouts too large to represent, about thirty years.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

/// Deadline `timeout` from now, saturating for very large timeouts.
fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Lifecycle of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No transport yet
    Unconnected,
    /// Transport open, handshake not started
    Connected,
    /// `initialize` in flight
    Initializing,
    /// Handshake complete
    Ready,
    /// Shutting down; no new outbound traffic
    Closing,
    /// Transport closed and all waiters drained
    Closed,
}

impl SessionState {
    /// Returns true for `Closing` and `Closed`.
    pub fn is_terminating(self) -> bool {
        matches!(self, SessionState::Closing | SessionState::Closed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unconnected => "unconnected",
            SessionState::Connected => "connected",
            SessionState::Initializing => "initializing",
            SessionState::Ready => "ready",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Which side of the handshake this endpoint plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Sends `initialize`
    Client,
    /// Answers `initialize`; refuses other requests until ready
    Server,
}

pub(super) struct SessionInner {
    pub(super) role: SessionRole,
    pub(super) transport: Arc<dyn Transport>,
    pub(super) registry: Arc<HandlerRegistry>,
    pub(super) correlation: CorrelationTable,
    pub(super) ids: IdAllocator,
    pub(super) outbound: mpsc::Sender<Vec<u8>>,
    pub(super) state: watch::Sender<SessionState>,
    /// First fatal error seen by the writer; reported to drained waiters.
    pub(super) failure: Mutex<Option<ProtocolError>>,
    pub(super) writer: Mutex<Option<JoinHandle<()>>>,
    pub(super) config: SessionConfig,
    pub(super) peer: String,
}

/// Handle on one JSON-RPC endpoint.
#[derive(Clone)]
pub struct Session {
    pub(super) inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.inner.role)
            .field("peer", &self.inner.peer)
            .field("state", &self.state())
            .finish()
    }
}

impl Session {
    /// Binds a session to an open transport and starts its reader and writer
    /// tasks. Must be called from within a Tokio runtime.
    ///
    /// The session starts in [`SessionState::Connected`].
    pub fn spawn(
        transport: Arc<dyn Transport>,
        registry: Arc<HandlerRegistry>,
        role: SessionRole,
        config: &SessionConfig,
    ) -> Session {
        let (outbound, outbound_rx) = mpsc::channel(config.outbound_queue_capacity.max(1));
        let (state, _) = watch::channel(SessionState::Connected);
        let peer = transport.peer();

        let session = Session {
            inner: Arc::new(SessionInner {
                role,
                transport,
                registry,
                correlation: CorrelationTable::new(config.late_response_grace()),
                ids: IdAllocator::new(),
                outbound,
                state,
                failure: Mutex::new(None),
                writer: Mutex::new(None),
                config: config.clone(),
                peer,
            }),
        };

        let writer = tokio::spawn(dispatch::run_writer(session.clone(), outbound_rx));
        *session.inner.writer.lock() = Some(writer);
        tokio::spawn(dispatch::run_reader(session.clone()));

        debug!(peer = %session.inner.peer, ?role, "Session started");
        session
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        *self.inner.state.borrow()
    }

    /// Returns true once the handshake has completed.
    pub fn is_ready(&self) -> bool {
        self.state() == SessionState::Ready
    }

    /// Subscribes to state changes.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Moves to `to` if the current state is one of `from`.
    ///
    /// On failure returns the state that was observed instead.
    pub fn transition(&self, from: &[SessionState], to: SessionState) -> Result<(), SessionState> {
        let mut observed = None;
        self.inner.state.send_if_modified(|current| {
            if from.contains(current) {
                *current = to;
                true
            } else {
                observed = Some(*current);
                false
            }
        });
        match observed {
            Some(state) => Err(state),
            None => Ok(()),
        }
    }

    /// Sets the state unconditionally, except that a terminating session never
    /// becomes live again and `Closed` is final. Returns true if the state changed.
    pub fn set_state(&self, to: SessionState) -> bool {
        self.inner.state.send_if_modified(|current| {
            let allowed = match *current {
                SessionState::Closed => false,
                SessionState::Closing => to == SessionState::Closed,
                _ => true,
            };
            if allowed && *current != to {
                *current = to;
                true
            } else {
                false
            }
        })
    }

    /// Which side of the handshake this session plays.
    pub fn role(&self) -> SessionRole {
        self.inner.role
    }

    /// Description of the remote endpoint.
    pub fn peer(&self) -> &str {
        &self.inner.peer
    }

    /// Handlers serving inbound calls on this session.
    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.inner.registry
    }

    /// The session's correlation table.
    pub fn correlation(&self) -> &CorrelationTable {
        &self.inner.correlation
    }

    /// Settings the session was started with.
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Sends a request and waits for its outcome under the default timeout.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Outcome {
        self.request_with_timeout(method, params, self.inner.config.request_timeout())
            .await
    }

    /// Sends a request and waits for its outcome under `timeout`.
    pub async fn request_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Outcome {
        self.start_request_with_timeout(method, params, timeout)
            .await?
            .wait()
            .await
    }

    /// Sends a request and returns its waiter without awaiting the outcome.
    ///
    /// The waiter's id can be passed to [`Session::cancel`].
    pub async fn start_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Waiter, ProtocolError> {
        self.start_request_with_timeout(method, params, self.inner.config.request_timeout())
            .await
    }

    /// Like [`Session::start_request`] with an explicit timeout.
    pub async fn start_request_with_timeout(
        &self,
        method: &str,
        params: Option<Value>,
        timeout: Duration,
    ) -> Result<Waiter, ProtocolError> {
        self.check_outbound("send request", method)?;

        let id = self.inner.ids.next_id();
        let frame = codec::encode(&Request::new(id.clone(), method, params).into())?;
        let waiter = self
            .inner
            .correlation
            .register(id.clone(), deadline_after(timeout))?;

        if let Err(err) = self.enqueue(frame).await {
            self.inner.correlation.forget(&id);
            return Err(err);
        }
        debug!(peer = %self.inner.peer, %id, method, "Sent request");
        Ok(waiter)
    }

    /// Resolves an outstanding request with [`ProtocolError::Cancelled`].
    ///
    /// Returns false if the request is not pending. Nothing is sent to the peer;
    /// a response that still arrives is dropped as late.
    pub fn cancel(&self, id: &Id) -> bool {
        self.inner.correlation.cancel(id)
    }

    /// Sends a notification.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), ProtocolError> {
        self.check_outbound("send notification", method)?;
        let frame = codec::encode(&Notification::new(method, params).into())?;
        self.enqueue(frame).await
    }

    /// Sends the response for an inbound request.
    pub async fn respond(&self, id: Id, outcome: Result<Value, JsonRpcError>) -> Result<(), ProtocolError> {
        self.send_message(Response::from_outcome(id, outcome).into())
            .await
    }

    pub(super) async fn send_message(&self, message: Message) -> Result<(), ProtocolError> {
        let frame = match codec::encode(&message) {
            Ok(frame) => frame,
            Err(err) => {
                // Encoding a response can only fail on a non-serializable result.
                let id = message.id().cloned().unwrap_or(Id::Null);
                codec::encode(&Response::error(id, JsonRpcError::internal_error(&err)).into())?
            }
        };
        self.enqueue(frame).await
    }

    /// Begins an orderly shutdown without waiting for it to finish.
    pub fn shutdown(&self) {
        if self.set_state(SessionState::Closing) {
            debug!(peer = %self.inner.peer, "Session shutdown requested");
        }
    }

    /// Waits until the session is [`SessionState::Closed`].
    pub async fn closed(&self) {
        let mut state = self.inner.state.subscribe();
        let _ = state.wait_for(|s| *s == SessionState::Closed).await;
    }

    /// Shuts the session down and waits for the transport to close.
    pub async fn close(&self) {
        self.shutdown();
        self.closed().await;
    }

    /// The error outstanding calls fail with once the session is terminating.
    pub(super) fn closed_error(&self) -> ProtocolError {
        self.inner
            .failure
            .lock()
            .clone()
            .unwrap_or(ProtocolError::TransportClosed)
    }

    fn check_outbound(&self, operation: &'static str, method: &str) -> Result<(), ProtocolError> {
        let state = self.state();
        if state.is_terminating() {
            return Err(self.closed_error());
        }
        let permitted = match state {
            SessionState::Ready => method != HANDSHAKE_METHOD,
            SessionState::Initializing => method == HANDSHAKE_METHOD,
            _ => false,
        };
        if permitted {
            Ok(())
        } else {
            Err(ProtocolError::NotReady { operation, state })
        }
    }

    async fn enqueue(&self, frame: Vec<u8>) -> Result<(), ProtocolError> {
        if self.state().is_terminating() {
            return Err(self.closed_error());
        }
        self.inner
            .outbound
            .send(frame)
            .await
            .map_err(|_| self.closed_error())
    }
}
