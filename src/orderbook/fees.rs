//! Configurable maker/taker fee schedule.
//!
//! Typed onto [`crate::decimal::Money`]/[`crate::decimal::Decimal`] instead
//! of raw integer basis points over an untyped notional. Fee *calculation*
//! lives here; fee *settlement/billing* does not.

use crate::decimal::{Decimal, Money, RoundingMode, fee as round_fee};
use serde::{Deserialize, Serialize};

/// Maker/taker fee rates, expressed in basis points (1 bps = 0.0001).
///
/// Negative values represent rebates (common for maker fees, to reward
/// makers for providing liquidity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Maker fee in basis points; negative values are rebates.
    pub maker_fee_bps: i32,
    /// Taker fee in basis points. Always non-negative.
    pub taker_fee_bps: i32,
}

impl FeeSchedule {
    /// Builds a schedule. `taker_fee_bps` should be non-negative; this is
    /// not validated here since it is a configuration concern, not a
    /// per-order invariant.
    pub fn new(maker_fee_bps: i32, taker_fee_bps: i32) -> Self {
        FeeSchedule { maker_fee_bps, taker_fee_bps }
    }

    /// A schedule that charges nothing and rebates nothing.
    pub fn zero_fee() -> Self {
        FeeSchedule { maker_fee_bps: 0, taker_fee_bps: 0 }
    }

    /// True when both maker and taker rates are zero.
    pub fn is_zero_fee(&self) -> bool {
        self.maker_fee_bps == 0 && self.taker_fee_bps == 0
    }

    /// `fee = round_half_even(notional * rate, 2)` for the maker or taker
    /// side of a single trade.
    pub fn calculate_fee(&self, notional: Money, is_maker: bool) -> Money {
        let bps = if is_maker { self.maker_fee_bps } else { self.taker_fee_bps };
        let rate = Decimal::from_int(bps as i64)
            .checked_div(Decimal::from_int(10_000), 10, RoundingMode::HalfEven)
            .expect("10,000 is never zero");
        round_fee(notional, rate)
    }
}
