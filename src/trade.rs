//! Trades produced by the matching engine.

use crate::decimal::{Price, Quantity};
use crate::order::{OrderId, Side};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single matched fill between two orders. Immutable once created.
///
/// The trade price always equals the resting (maker) order's limit price —
/// the aggressor does not set or improve the price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Unique trade identifier.
    pub id: Uuid,
    /// The trading symbol.
    pub symbol: String,
    /// The buy-side order's id.
    pub buy_order_id: OrderId,
    /// The sell-side order's id.
    pub sell_order_id: OrderId,
    /// The maker's limit price.
    pub price: Price,
    /// The matched quantity.
    pub quantity: Quantity,
    /// When the trade occurred.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Which side was the aggressor (incoming order).
    pub aggressor_side: Side,
}
