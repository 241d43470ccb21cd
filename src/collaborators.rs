//! Typed interfaces to the external collaborators the core calls out to.
//!
//! The broker/ledger publish, wall clock, and id service implementations
//! live outside the core; this module defines the traits the matching
//! engine is generic over and ships minimal in-crate defaults so the crate
//! is usable standalone and in tests without a network layer.

use crate::trade::Trade;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;
use tracing::warn;

/// Opaque failure from a collaborator call. Never mutates core state; a
/// publish failure is logged and the trades that were already produced
/// remain authoritative.
#[derive(Debug, Clone)]
pub struct EventSinkError(pub String);

impl fmt::Display for EventSinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event sink error: {}", self.0)
    }
}

impl std::error::Error for EventSinkError {}

/// Publishes trades (or other events) to a downstream system. Called after
/// the book lock is released, never while inside the book's critical
/// section.
pub trait EventSink: Send + Sync {
    /// Publishes `trades` under `topic`. Errors are opaque to the core and
    /// never roll back the fills they describe.
    fn publish(&self, topic: &str, trades: &[Trade]) -> Result<(), EventSinkError>;
}

/// An `EventSink` that drops everything. Useful for tests and for embedding
/// the engine without a downstream system wired up yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn publish(&self, _topic: &str, _trades: &[Trade]) -> Result<(), EventSinkError> {
        Ok(())
    }
}

/// An `EventSink` that logs each publish via `tracing` instead of sending it
/// anywhere. Useful for local development and for observing what the core
/// would have published.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn publish(&self, topic: &str, trades: &[Trade]) -> Result<(), EventSinkError> {
        for trade in trades {
            tracing::debug!(topic, trade_id = %trade.id, price = %trade.price, qty = %trade.quantity, "publish trade");
        }
        Ok(())
    }
}

/// Monotonic wall clock, used for breaker timeouts and trade timestamps.
pub trait Clock: Send + Sync {
    /// The current time.
    fn now(&self) -> DateTime<Utc>;
}

/// `Clock` backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Generates unique identifiers for trades.
pub trait IdGen: Send + Sync {
    /// A fresh unique id.
    fn new_id(&self) -> Uuid;
}

/// `IdGen` backed by random UUIDv4s.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn new_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Formats a timestamp as RFC-3339 with nanosecond precision, the wire
/// representation used for trade timestamps.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

/// Swallows and logs an `EventSink` failure: logged, never rolled back.
pub fn publish_best_effort(sink: &dyn EventSink, topic: &str, trades: &[Trade]) {
    if let Err(e) = sink.publish(topic, trades) {
        warn!(topic, error = %e, "event sink publish failed; trades remain authoritative");
    }
}
