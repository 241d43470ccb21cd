//! Matching engine error types.

use crate::order::{Order, RejectReason};
use crate::orderbook::OrderBookError;
use crate::trade::Trade;
use thiserror::Error;

/// Errors raised by [`super::MatchingEngine::submit`] and
/// [`super::MatchingEngine::cancel`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MatchingError {
    /// Validation failed before the order ever reached the book.
    #[error("invalid order: {0}")]
    InvalidOrder(RejectReason),

    /// The caller's deadline elapsed mid cross-loop. `trades` holds the
    /// fills already produced — they are authoritative and are not rolled
    /// back; `order` reflects the aggressor's partial-fill state at the
    /// point of cancellation.
    #[error("deadline exceeded mid cross-loop")]
    Cancelled {
        /// Trades produced before the deadline fired.
        trades: Vec<Trade>,
        /// The aggressor order's state at the point of cancellation.
        order: Order,
    },

    /// Propagated from the underlying book: duplicate id, not found, not
    /// cancelable, or the book is closed.
    #[error(transparent)]
    Book(#[from] OrderBookError),
}
