//! Order book error types.

use crate::order::OrderId;
use thiserror::Error;

/// Errors raised by [`super::book::OrderBook`] operations. All are local and
/// reported to the caller; the book never panics on bad input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum OrderBookError {
    /// `add` was called with an id already present in the book.
    #[error("duplicate order id: {0}")]
    DuplicateId(OrderId),

    /// `cancel` or `get` was called with an id not present in the book.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// `cancel` was called on an order already in a terminal state.
    #[error("order {0} is not cancelable (already terminal)")]
    NotCancelable(OrderId),

    /// The book has been shut down; no further operations are accepted.
    #[error("book is closed")]
    BookClosed,
}
