//! Three-state circuit breaker guarding every outbound call the core makes.
//!
//! State lives in a single atomic integer for the fast admit/reject path;
//! the compound reset of `(state, last_failure_time, counters)` on each
//! transition is guarded by a short `std::sync::Mutex` so the transition is
//! observable as one atomic unit. `on_state_change` is invoked after that
//! mutex is released — callbacks are untrusted and must not call back into
//! the breaker.

mod group;

pub use group::{BreakerConfig, BreakerGroup};

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Observable state of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CircuitState {
    /// Requests are admitted normally.
    Closed,
    /// Requests fail fast until `open_timeout` elapses.
    Open,
    /// A bounded number of probe requests are admitted to test recovery.
    HalfOpen,
}

impl CircuitState {
    fn from_tag(tag: u8) -> Self {
        match tag {
            0 => CircuitState::Closed,
            1 => CircuitState::Open,
            _ => CircuitState::HalfOpen,
        }
    }

    fn tag(self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

/// Errors returned by [`CircuitBreaker::execute`] itself (not by the wrapped
/// call). Both propagate out of `execute` as-is so callers can distinguish
/// "downstream tripped" from "downstream failed".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BreakerError {
    /// The breaker is open and `open_timeout` has not yet elapsed.
    #[error("circuit open")]
    CircuitOpen,
    /// The breaker is half-open and its probe budget is exhausted.
    #[error("too many requests")]
    TooManyRequests,
}

/// Outcome of [`CircuitBreaker::execute`]: either the breaker itself
/// rejected the call, or the wrapped call ran and failed on its own terms.
#[derive(Debug)]
pub enum ExecuteError<E> {
    /// The breaker rejected the call without invoking it.
    Breaker(BreakerError),
    /// The wrapped call ran and returned an error.
    Inner(E),
}

impl<E> ExecuteError<E> {
    /// The breaker error, if this rejection happened before the call ran.
    pub fn as_breaker(&self) -> Option<BreakerError> {
        match self {
            ExecuteError::Breaker(e) => Some(*e),
            ExecuteError::Inner(_) => None,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for ExecuteError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecuteError::Breaker(e) => write!(f, "breaker rejected call: {e}"),
            ExecuteError::Inner(e) => write!(f, "wrapped call failed: {e}"),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for ExecuteError<E> {}

struct BreakerInner {
    last_failure_time: Option<Instant>,
}

/// A named, independently-tripping failure gate.
///
/// Construct via [`BreakerGroup`] in application code; the bare constructor
/// is public for tests and for embedding a single breaker without a group.
pub struct CircuitBreaker {
    name: String,
    max_failures: u32,
    open_timeout: Duration,
    half_open_budget: u32,

    state: AtomicU8,
    failures: AtomicU32,
    successes: AtomicU32,
    half_open_in_flight: AtomicU32,
    inner: Mutex<BreakerInner>,

    on_state_change: Option<Arc<dyn Fn(CircuitState, CircuitState) + Send + Sync>>,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("state", &self.state())
            .finish()
    }
}

/// RAII guard released when a half-open probe completes, whether it
/// succeeded or failed.
struct ProbeSlot<'a> {
    breaker: &'a CircuitBreaker,
}

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        self.breaker.half_open_in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

impl CircuitBreaker {
    /// Builds a new breaker in the `Closed` state.
    pub fn new(name: impl Into<String>, max_failures: u32, open_timeout: Duration, half_open_budget: u32) -> Self {
        Self::with_callback(name, max_failures, open_timeout, half_open_budget, None)
    }

    /// Builds a new breaker with an `on_state_change` callback, invoked with
    /// `(from, to)` after every transition, outside the transition mutex.
    pub fn with_callback(
        name: impl Into<String>,
        max_failures: u32,
        open_timeout: Duration,
        half_open_budget: u32,
        on_state_change: Option<Arc<dyn Fn(CircuitState, CircuitState) + Send + Sync>>,
    ) -> Self {
        CircuitBreaker {
            name: name.into(),
            max_failures: max_failures.max(1),
            open_timeout,
            half_open_budget: half_open_budget.max(1),
            state: AtomicU8::new(CircuitState::Closed.tag()),
            failures: AtomicU32::new(0),
            successes: AtomicU32::new(0),
            half_open_in_flight: AtomicU32::new(0),
            inner: Mutex::new(BreakerInner { last_failure_time: None }),
            on_state_change,
        }
    }

    /// The breaker's name, used as the key in a [`BreakerGroup`].
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current observable state.
    pub fn state(&self) -> CircuitState {
        CircuitState::from_tag(self.state.load(Ordering::Acquire))
    }

    /// Runs `f`, admitting or rejecting it per the breaker's current state,
    /// and dispatches `record_success`/`record_failure` on the state observed
    /// *after* the call completes. The wrapped call's own error is passed
    /// through in [`ExecuteError::Inner`] so callers can distinguish
    /// "downstream tripped" ([`ExecuteError::Breaker`]) from "downstream
    /// failed" ([`ExecuteError::Inner`]).
    pub fn execute<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, ExecuteError<E>>
    where
        E: std::fmt::Display,
    {
        let probe = self.admit().map_err(ExecuteError::Breaker)?;
        let result = f();
        match &result {
            Ok(_) => self.record_success(),
            Err(e) => {
                warn!(breaker = %self.name, error = %e, "breaker-wrapped call failed");
                self.record_failure();
            }
        }
        drop(probe);
        result.map_err(ExecuteError::Inner)
    }

    fn admit(&self) -> Result<Option<ProbeSlot<'_>>, BreakerError> {
        loop {
            let state = self.state();
            match state {
                CircuitState::Closed => return Ok(None),
                CircuitState::Open => {
                    let elapsed_enough = {
                        let guard = self.inner.lock().unwrap();
                        guard
                            .last_failure_time
                            .map(|t| t.elapsed() >= self.open_timeout)
                            .unwrap_or(true)
                    };
                    if !elapsed_enough {
                        return Err(BreakerError::CircuitOpen);
                    }
                    self.transition_to_half_open();
                    continue;
                }
                CircuitState::HalfOpen => {
                    let reserved = self
                        .half_open_in_flight
                        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                            if n < self.half_open_budget { Some(n + 1) } else { None }
                        });
                    return match reserved {
                        Ok(_) => Ok(Some(ProbeSlot { breaker: self })),
                        Err(_) => Err(BreakerError::TooManyRequests),
                    };
                }
            }
        }
    }

    fn record_success(&self) {
        match self.state() {
            CircuitState::Closed => {
                self.failures.store(0, Ordering::Release);
            }
            CircuitState::HalfOpen => {
                let cumulative = self.successes.fetch_add(1, Ordering::AcqRel) + 1;
                if cumulative >= self.half_open_budget {
                    self.transition_to(CircuitState::HalfOpen, CircuitState::Closed);
                }
            }
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self) {
        match self.state() {
            CircuitState::Closed => {
                let count = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
                if count >= self.max_failures {
                    self.transition_to(CircuitState::Closed, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                self.transition_to(CircuitState::HalfOpen, CircuitState::Open);
            }
            CircuitState::Open => {}
        }
    }

    fn transition_to_half_open(&self) {
        self.transition_to(CircuitState::Open, CircuitState::HalfOpen);
    }

    /// Performs `from -> to`, resetting counters and `last_failure_time`
    /// under the transition mutex, then firing `on_state_change` outside it.
    /// A concurrent racer that already moved the state elsewhere silently
    /// loses the CAS and does not re-fire the callback.
    fn transition_to(&self, from: CircuitState, to: CircuitState) {
        let fired = {
            let mut guard = self.inner.lock().unwrap();
            if self.state.load(Ordering::Acquire) != from.tag() {
                false
            } else {
                self.state.store(to.tag(), Ordering::Release);
                self.failures.store(0, Ordering::Release);
                self.successes.store(0, Ordering::Release);
                self.half_open_in_flight.store(0, Ordering::Release);
                if to == CircuitState::Open {
                    guard.last_failure_time = Some(Instant::now());
                }
                true
            }
        };
        if fired {
            debug!(breaker = %self.name, ?from, ?to, "breaker transition");
            if let Some(cb) = &self.on_state_change {
                cb(from, to);
            }
        }
    }
}
