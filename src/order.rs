//! Order identity, attributes and status.

use crate::decimal::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique order identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub Uuid);

impl OrderId {
    /// Generates a fresh random order id.
    pub fn new() -> Self {
        OrderId(Uuid::new_v4())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        OrderId::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique user/account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Uuid);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the book an order rests on, and which side an aggressor
/// arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// A buy / bid order.
    Buy,
    /// A sell / ask order.
    Sell,
}

impl Side {
    /// The opposite side.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Order type. `price` is meaningful only for `Limit`; market orders cross
/// at whatever price the opposite side offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderKind {
    /// Rests on the book at `price` if it does not fully cross.
    Limit,
    /// Crosses immediately against available liquidity; any remainder is
    /// cancelled rather than resting.
    Market,
}

/// Lifecycle status of an order. Transitions are monotonic: `Cancelled` and
/// `Filled` are terminal, and an order never returns to `Open` once it has
/// partially filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Resting on the book, no fills yet.
    Open,
    /// Resting on the book with `0 < filled_quantity < total_quantity`.
    PartiallyFilled,
    /// Fully filled; terminal.
    Filled,
    /// Cancelled by request or tombstoned; terminal.
    Cancelled,
    /// Failed validation before ever resting; terminal.
    Rejected,
    /// A market order's unfilled remainder after the cross loop; terminal.
    CancelledUnfilled,
}

impl OrderStatus {
    /// True for `Filled`, `Cancelled`, `Rejected` and `CancelledUnfilled` —
    /// states that never transition further.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled
                | OrderStatus::Cancelled
                | OrderStatus::Rejected
                | OrderStatus::CancelledUnfilled
        )
    }
}

/// Machine-readable reason attached to a rejected or cancelled-unfilled
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// `total_quantity` was zero or negative.
    NonPositiveQuantity,
    /// A limit order's price was negative.
    NegativePrice,
    /// A market order's remainder after crossing was cancelled, not rested.
    MarketRemainderDiscarded,
    /// The book has been shut down.
    BookClosed,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            RejectReason::NonPositiveQuantity => "quantity must be positive",
            RejectReason::NegativePrice => "limit price must not be negative",
            RejectReason::MarketRemainderDiscarded => "market order remainder discarded",
            RejectReason::BookClosed => "book is closed",
        };
        write!(f, "{msg}")
    }
}

/// An order: immutable identity/attributes plus mutable fill-tracking
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Immutable identity.
    pub id: OrderId,
    /// Owning user/account, used only for external reporting in this crate
    /// (no user-level risk limits are enforced here).
    pub user_id: UserId,
    /// Trading symbol.
    pub symbol: String,
    /// Buy or sell.
    pub side: Side,
    /// Limit or market.
    pub kind: OrderKind,
    /// The limit price. Ignored for market orders.
    pub price: Price,
    /// The total quantity requested at submission.
    pub total_quantity: Quantity,
    /// Quantity filled so far. `0 <= filled_quantity <= total_quantity`.
    pub filled_quantity: Quantity,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Monotonic sequence number assigned by the book at insertion time.
    /// Used as the tie-breaker for price-time priority; not meaningful
    /// before the order is added to a book.
    pub sequence_number: u64,
    /// Wall-clock submission time.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Present when this order ended in `Rejected` or `CancelledUnfilled`.
    pub reject_reason: Option<RejectReason>,
    /// Reserved worst-price protection for market orders; whether market
    /// orders should support a worst-price limit is an open question, so
    /// this field exists so that decision does not require a breaking
    /// schema change later. Unused by the current matching algorithm, which
    /// treats a market order's price as unbounded (±infinity).
    pub worst_price: Option<Price>,
}

impl Order {
    /// Remaining (unfilled) quantity.
    pub fn remaining(&self) -> Quantity {
        self.total_quantity - self.filled_quantity
    }

    /// True once `filled_quantity == total_quantity`.
    pub fn is_fully_filled(&self) -> bool {
        self.remaining().is_zero()
    }
}
