// Copyright (c) 2025 Kaula MCP Authors
//
// Licensed under dual license:
// - MIT License (LICENSE-MIT or https://opensource.org/licenses/MIT)
// - Apache License, Version 2.0 (LICENSE-APACHE or https://www.apache.org/licenses/LICENSE-2.0)

//! JSON-RPC 2.0 request/response correlation.
//!
//! The [`CorrelationTable`] owns one single-shot channel per outstanding request
//! id. A [`Waiter`] is the receiving half handed to the caller; it resolves
//! exactly once with the response outcome, `Timeout`, `Cancelled` or the error
//! the session was drained with.
//!
//! Ids that time out or are cancelled stay reserved for a short grace window so
//! that a response arriving just too late is recognized and counted rather than
//! reported as unknown.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::{timeout_at, Instant};
use tracing::trace;

use super::types::Id;
use crate::error::ProtocolError;

/// Default grace window for late responses.
pub const DEFAULT_LATE_RESPONSE_GRACE: Duration = Duration::from_millis(1000);

/// What a waiter resolves with.
pub type Outcome = Result<Value, ProtocolError>;

/// Result of routing an inbound response to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A waiter received the outcome.
    Delivered,
    /// The id had timed out or been cancelled within the grace window.
    Late,
    /// No request with this id is known.
    Unknown,
}

#[derive(Debug)]
enum Slot {
    Pending(oneshot::Sender<Outcome>),
    Reserved { until: Instant },
}

#[derive(Debug, Default)]
struct Slots {
    entries: HashMap<Id, Slot>,
    /// Set once the table has been drained; later registrations fail with it.
    closed: Option<ProtocolError>,
}

impl Slots {
    fn prune_reservations(&mut self, now: Instant) {
        self.entries.retain(|_, slot| match slot {
            Slot::Reserved { until } => *until > now,
            Slot::Pending(_) => true,
        });
    }

    /// Removes the pending entry for `id` if its waiter has gone away.
    fn take_abandoned(&mut self, id: &Id) -> bool {
        match self.entries.get(id) {
            Some(Slot::Pending(sender)) if sender.is_closed() => {
                self.entries.remove(id);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug)]
struct TableInner {
    slots: Mutex<Slots>,
    late_responses: AtomicU64,
    grace: Duration,
}

/// Maps outstanding request ids to their waiters.
///
/// Cloning yields another handle to the same table.
#[derive(Debug, Clone)]
pub struct CorrelationTable {
    inner: Arc<TableInner>,
}

impl Default for CorrelationTable {
    fn default() -> Self {
        Self::new(DEFAULT_LATE_RESPONSE_GRACE)
    }
}

impl CorrelationTable {
    /// Creates an empty table with the given late-response grace window.
    pub fn new(grace: Duration) -> Self {
        Self {
            inner: Arc::new(TableInner {
                slots: Mutex::new(Slots::default()),
                late_responses: AtomicU64::new(0),
                grace,
            }),
        }
    }

    /// Registers an outstanding request and returns its waiter.
    ///
    /// Fails with [`ProtocolError::DuplicateId`] if the id is pending or still
    /// reserved, and with the drain error once the table has been drained.
    pub fn register(&self, id: Id, deadline: Instant) -> Result<Waiter, ProtocolError> {
        let mut slots = self.inner.slots.lock();
        if let Some(err) = &slots.closed {
            return Err(err.clone());
        }

        slots.prune_reservations(Instant::now());
        if slots.entries.contains_key(&id) {
            return Err(ProtocolError::DuplicateId(id));
        }

        let (tx, rx) = oneshot::channel();
        slots.entries.insert(id.clone(), Slot::Pending(tx));
        trace!(%id, "Registered pending request");

        Ok(Waiter {
            id,
            deadline,
            rx,
            table: self.clone(),
        })
    }

    /// Routes a response outcome to the waiter registered under `id`.
    pub fn complete(&self, id: &Id, outcome: Outcome) -> Completion {
        let mut slots = self.inner.slots.lock();
        match slots.entries.remove(id) {
            Some(Slot::Pending(sender)) => {
                if sender.send(outcome).is_ok() {
                    Completion::Delivered
                } else {
                    Completion::Unknown
                }
            }
            Some(Slot::Reserved { until }) if until > Instant::now() => {
                self.inner.late_responses.fetch_add(1, Ordering::Relaxed);
                Completion::Late
            }
            Some(Slot::Reserved { .. }) | None => Completion::Unknown,
        }
    }

    /// Resolves the waiter for `id` with [`ProtocolError::Cancelled`].
    ///
    /// Returns false if no request with this id is pending.
    pub fn cancel(&self, id: &Id) -> bool {
        let mut slots = self.inner.slots.lock();
        let Some(Slot::Pending(sender)) = slots.entries.remove(id) else {
            return false;
        };
        let _ = sender.send(Err(ProtocolError::Cancelled));
        slots.entries.insert(
            id.clone(),
            Slot::Reserved {
                until: Instant::now() + self.inner.grace,
            },
        );
        true
    }

    /// Resolves every outstanding waiter with `error` and refuses new registrations.
    ///
    /// Returns the number of waiters resolved.
    pub fn drain(&self, error: ProtocolError) -> usize {
        let mut slots = self.inner.slots.lock();
        let mut resolved = 0;
        for (_, slot) in slots.entries.drain() {
            if let Slot::Pending(sender) = slot {
                if sender.send(Err(error.clone())).is_ok() {
                    resolved += 1;
                }
            }
        }
        if slots.closed.is_none() {
            slots.closed = Some(error);
        }
        resolved
    }

    /// Removes the entry of a request that will never be sent or awaited.
    pub fn forget(&self, id: &Id) -> bool {
        let mut slots = self.inner.slots.lock();
        matches!(slots.entries.remove(id), Some(Slot::Pending(_)))
    }

    /// Turns an abandoned pending entry into a grace-window reservation.
    fn expire(&self, id: &Id) -> bool {
        let mut slots = self.inner.slots.lock();
        if !slots.take_abandoned(id) {
            return false;
        }
        slots.entries.insert(
            id.clone(),
            Slot::Reserved {
                until: Instant::now() + self.inner.grace,
            },
        );
        true
    }

    fn release(&self, id: &Id) {
        self.inner.slots.lock().take_abandoned(id);
    }

    /// Number of requests awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.inner
            .slots
            .lock()
            .entries
            .values()
            .filter(|slot| matches!(slot, Slot::Pending(_)))
            .count()
    }

    /// Number of responses dropped because they arrived inside the grace window.
    pub fn late_responses(&self) -> u64 {
        self.inner.late_responses.load(Ordering::Relaxed)
    }

    /// Returns true once the table has been drained.
    pub fn is_closed(&self) -> bool {
        self.inner.slots.lock().closed.is_some()
    }
}

/// The caller's handle on one outstanding request.
///
/// Dropping a waiter before it resolves removes its correlation entry.
#[derive(Debug)]
pub struct Waiter {
    id: Id,
    deadline: Instant,
    rx: oneshot::Receiver<Outcome>,
    table: CorrelationTable,
}

impl Waiter {
    /// The request id this waiter is correlated with.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// When the request times out.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the outcome, resolving with [`ProtocolError::Timeout`] at the deadline.
    pub async fn wait(mut self) -> Outcome {
        match timeout_at(self.deadline, &mut self.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(ProtocolError::TransportClosed),
            Err(_) => {
                // A response may have been delivered between the timer firing and
                // the channel closing; it wins over the timeout.
                self.rx.close();
                if self.table.expire(&self.id) {
                    trace!(id = %self.id, "Request timed out");
                    return Err(ProtocolError::Timeout);
                }
                self.rx.try_recv().unwrap_or(Err(ProtocolError::Timeout))
            }
        }
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.rx.close();
        self.table.release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(30)
    }

    #[tokio::test]
    async fn test_complete_delivers_outcome() {
        let table = CorrelationTable::default();
        let waiter = table.register(Id::Number(42), far_deadline()).unwrap();
        assert_eq!(table.pending_count(), 1);

        assert_eq!(
            table.complete(&Id::Number(42), Ok(json!({"ok": true}))),
            Completion::Delivered
        );
        assert_eq!(waiter.wait().await, Ok(json!({"ok": true})));
        assert_eq!(table.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let table = CorrelationTable::default();
        let _waiter = table.register(Id::from("a"), far_deadline()).unwrap();
        assert_eq!(
            table.register(Id::from("a"), far_deadline()).unwrap_err(),
            ProtocolError::DuplicateId(Id::from("a"))
        );
        // A numeric id with the same digits is a different id.
        assert!(table.register(Id::Number(1), far_deadline()).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_response_is_ignored() {
        let table = CorrelationTable::default();
        assert_eq!(table.complete(&Id::Number(7), Ok(Value::Null)), Completion::Unknown);
        assert_eq!(table.late_responses(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_late_response() {
        let table = CorrelationTable::new(Duration::from_secs(1));
        let deadline = Instant::now() + Duration::from_millis(100);
        let waiter = table.register(Id::Number(1), deadline).unwrap();

        assert_eq!(waiter.wait().await, Err(ProtocolError::Timeout));
        assert_eq!(table.pending_count(), 0);

        assert_eq!(table.complete(&Id::Number(1), Ok(Value::Null)), Completion::Late);
        assert_eq!(table.late_responses(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reservation_expires_after_grace() {
        let table = CorrelationTable::new(Duration::from_secs(1));
        let waiter = table
            .register(Id::Number(1), Instant::now() + Duration::from_millis(10))
            .unwrap();
        assert_eq!(waiter.wait().await, Err(ProtocolError::Timeout));

        // Reserved ids cannot be reused inside the grace window.
        assert!(matches!(
            table.register(Id::Number(1), far_deadline()),
            Err(ProtocolError::DuplicateId(_))
        ));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(table.complete(&Id::Number(1), Ok(Value::Null)), Completion::Unknown);
        assert_eq!(table.late_responses(), 0);
        assert!(table.register(Id::Number(1), far_deadline()).is_ok());
    }

    #[tokio::test]
    async fn test_cancel() {
        let table = CorrelationTable::default();
        let waiter = table.register(Id::Number(3), far_deadline()).unwrap();

        assert!(table.cancel(&Id::Number(3)));
        assert!(!table.cancel(&Id::Number(3)));
        assert_eq!(waiter.wait().await, Err(ProtocolError::Cancelled));

        assert_eq!(table.complete(&Id::Number(3), Ok(Value::Null)), Completion::Late);
    }

    #[tokio::test]
    async fn test_drain_resolves_all_and_closes() {
        let table = CorrelationTable::default();
        let waiters: Vec<_> = (1..=3)
            .map(|n| table.register(Id::Number(n), far_deadline()).unwrap())
            .collect();

        assert_eq!(table.drain(ProtocolError::TransportClosed), 3);
        for waiter in waiters {
            assert_eq!(waiter.wait().await, Err(ProtocolError::TransportClosed));
        }

        assert!(table.is_closed());
        assert_eq!(
            table.register(Id::Number(9), far_deadline()).unwrap_err(),
            ProtocolError::TransportClosed
        );
    }

    #[tokio::test]
    async fn test_dropped_waiter_releases_entry() {
        let table = CorrelationTable::default();
        let waiter = table.register(Id::Number(5), far_deadline()).unwrap();
        drop(waiter);
        assert_eq!(table.pending_count(), 0);
        assert_eq!(table.complete(&Id::Number(5), Ok(Value::Null)), Completion::Unknown);
    }

    #[tokio::test]
    async fn test_dropping_stale_waiter_keeps_newer_entry() {
        let table = CorrelationTable::default();
        let first = table.register(Id::Number(8), far_deadline()).unwrap();
        table.complete(&Id::Number(8), Ok(json!(1)));

        let second = table.register(Id::Number(8), far_deadline()).unwrap();
        drop(first);
        assert_eq!(table.pending_count(), 1);

        table.complete(&Id::Number(8), Ok(json!(2)));
        assert_eq!(second.wait().await, Ok(json!(2)));
    }
}
