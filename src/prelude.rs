//! Convenience re-export of the crate's most commonly used types.
//!
//! ```rust
//! use matching_core::prelude::*;
//! ```

pub use crate::breaker::{BreakerConfig, BreakerError, BreakerGroup, CircuitBreaker, CircuitState, ExecuteError};
pub use crate::collaborators::{Clock, EventSink, IdGen, NoopEventSink, SystemClock, UuidIdGen};
pub use crate::decimal::{Currency, Decimal, DecimalError, Money, Price, Quantity, RoundingMode};
pub use crate::matching::{Deadline, MatchingEngine, MatchingError, SubmitOutcome};
pub use crate::order::{Order, OrderId, OrderKind, OrderStatus, RejectReason, Side, UserId};
pub use crate::orderbook::{BookManager, FeeSchedule, OrderBook, OrderBookError};
pub use crate::trade::Trade;
