//! Exact, base-10 fixed-point arithmetic for every price, quantity and money
//! value in the matching path.
//!
//! Every production incident this crate was built to avoid traces back to an
//! IEEE-754 `f64` creeping into an accounting calculation. `Decimal` forbids
//! that by construction: it is a thin newtype over [`rust_decimal::Decimal`],
//! which already stores values as an unscaled 96-bit integer plus a base-10
//! scale — the (mantissa, scale) representation this module's contract
//! describes. Arithmetic never rounds on its own; only [`Decimal::round`]
//! changes scale, and only when the caller asks for it explicitly.

mod money;

pub use money::{Currency, CurrencyMismatch, Money, fee, pnl};

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rounding mode for [`Decimal::round`].
///
/// `HalfEven` (banker's rounding) is the default for money display because it
/// does not bias accumulated sums up or down over many roundings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundingMode {
    /// Round half away from zero (typical "round half up" for positive values).
    HalfUp,
    /// Round half to the nearest even digit. Default for money.
    HalfEven,
    /// Truncate toward zero.
    Down,
    /// Round away from zero.
    Up,
}

impl RoundingMode {
    fn into_strategy(self) -> RoundingStrategy {
        match self {
            RoundingMode::HalfUp => RoundingStrategy::MidpointAwayFromZero,
            RoundingMode::HalfEven => RoundingStrategy::MidpointNearestEven,
            RoundingMode::Down => RoundingStrategy::ToZero,
            RoundingMode::Up => RoundingStrategy::AwayFromZero,
        }
    }
}

/// Default scale for price and quantity values.
pub const PRICE_SCALE: u32 = 8;
/// Default scale for money display (2 decimal places, e.g. cents).
pub const MONEY_DISPLAY_SCALE: u32 = 2;
/// Default scale for intermediate P&L computations, rounded down later.
pub const PNL_SCALE: u32 = 10;

/// Errors raised by [`Decimal`] construction and arithmetic.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecimalError {
    /// `from_string` was given something that isn't `-?\d+(\.\d+)?`.
    #[error("could not parse {input:?} as a decimal")]
    ParseError {
        /// The raw input string that failed to parse.
        input: String,
    },
    /// Division where the divisor is zero.
    #[error("division by zero")]
    DivideByZero,
}

/// An exact, arbitrary-scale base-10 number.
///
/// `Decimal` values carry no unit and no currency; [`Price`], [`Quantity`]
/// and [`Money`] wrap it to make cross-type mistakes (adding a price to a
/// quantity, say) a compile error rather than a runtime bug. Equality is
/// value equality: `10.00 == 10.0`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Decimal(rust_decimal::Decimal);

impl Decimal {
    /// The additive identity.
    pub const ZERO: Decimal = Decimal(rust_decimal::Decimal::ZERO);
    /// The multiplicative identity.
    pub const ONE: Decimal = Decimal(rust_decimal::Decimal::ONE);

    /// Parses a decimal literal matching `-?\d+(\.\d+)?`.
    ///
    /// Rejects `NaN`, infinities and scientific notation with
    /// [`DecimalError::ParseError`] — this is the only constructor accounting
    /// code should use for values that arrive as text (wire payloads,
    /// config files, user input).
    pub fn from_string(s: &str) -> Result<Self, DecimalError> {
        let trimmed = s.trim();
        if trimmed.is_empty() || !is_plain_decimal_literal(trimmed) {
            return Err(DecimalError::ParseError {
                input: s.to_string(),
            });
        }
        rust_decimal::Decimal::from_str(trimmed)
            .map(Decimal)
            .map_err(|_| DecimalError::ParseError {
                input: s.to_string(),
            })
    }

    /// Exact construction from an integer.
    pub fn from_int(i: i64) -> Self {
        Decimal(rust_decimal::Decimal::from(i))
    }

    /// Lossy construction from a binary float.
    ///
    /// Only valid for non-accounting display paths (charting, logging of an
    /// approximate value). Accounting callers must use [`Decimal::from_string`]
    /// or [`Decimal::from_int`]; nothing in the matching or money path calls
    /// this constructor.
    pub fn from_float(f: f64) -> Option<Self> {
        rust_decimal::Decimal::from_f64_retain(f).map(Decimal)
    }

    /// Rounds to `places` decimal places using `mode`, returning a new value.
    /// Does not mutate `self` — only `round` ever changes scale.
    #[must_use]
    pub fn round(&self, places: u32, mode: RoundingMode) -> Decimal {
        Decimal(self.0.round_dp_with_strategy(places, mode.into_strategy()))
    }

    /// Divides `self` by `divisor`, rounding the quotient to `places` using
    /// `mode`. Fails with [`DecimalError::DivideByZero`] when `divisor` is
    /// zero; a division is otherwise always exact at infinite scale
    /// internally and is only rounded at the caller's request.
    pub fn checked_div(
        &self,
        divisor: Decimal,
        places: u32,
        mode: RoundingMode,
    ) -> Result<Decimal, DecimalError> {
        if divisor.is_zero() {
            return Err(DecimalError::DivideByZero);
        }
        let quotient = self.0 / divisor.0;
        Ok(Decimal(quotient.round_dp_with_strategy(places, mode.into_strategy())))
    }

    /// True if the value is exactly zero, regardless of scale.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True if the value is strictly negative.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// `-1`, `0` or `1` per the value's sign.
    pub fn sign(&self) -> i32 {
        if self.is_zero() {
            0
        } else if self.0.is_sign_negative() {
            -1
        } else {
            1
        }
    }

    /// The unscaled integer part of the (mantissa, scale) representation.
    pub fn mantissa(&self) -> i128 {
        self.0.mantissa()
    }

    /// The base-10 scale of the (mantissa, scale) representation.
    pub fn scale(&self) -> u32 {
        self.0.scale()
    }

    pub(crate) fn inner(&self) -> rust_decimal::Decimal {
        self.0
    }

    pub(crate) fn from_inner(d: rust_decimal::Decimal) -> Self {
        Decimal(d)
    }
}

fn is_plain_decimal_literal(s: &str) -> bool {
    let s = s.strip_prefix('-').unwrap_or(s);
    if s.is_empty() {
        return false;
    }
    let mut parts = s.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
    }
    true
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::hash::Hash for Decimal {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.normalize().hash(state)
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Decimal {
    type Err = DecimalError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_string(s)
    }
}

impl std::ops::Add for Decimal {
    type Output = Decimal;
    fn add(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Decimal {
    type Output = Decimal;
    fn sub(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Decimal {
    type Output = Decimal;
    fn mul(self, rhs: Decimal) -> Decimal {
        Decimal(self.0 * rhs.0)
    }
}

impl std::ops::Neg for Decimal {
    type Output = Decimal;
    fn neg(self) -> Decimal {
        Decimal(-self.0)
    }
}

/// A price. Only the operations spec'd in the data model are exposed:
/// `Price + Price -> Price`, and `Price * Quantity -> Money` via
/// [`Price::notional`]. Comparisons are by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(pub Decimal);

impl Price {
    /// Parses a price from a decimal string, e.g. `"100.00"`.
    pub fn from_string(s: &str) -> Result<Self, DecimalError> {
        Ok(Price(Decimal::from_string(s)?))
    }

    /// The notional value of `quantity` units at this price, in the given
    /// currency. This is the crate's one sanctioned `Price * Quantity`
    /// operation.
    pub fn notional(&self, quantity: Quantity, currency: Currency) -> Money {
        Money::new(self.0 * quantity.0, currency)
    }

    /// True if this price is strictly negative (invalid for a limit order).
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }
}

impl std::ops::Add for Price {
    type Output = Price;
    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quantity of the traded instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quantity(pub Decimal);

impl Quantity {
    /// Parses a quantity from a decimal string, e.g. `"1.5"`.
    pub fn from_string(s: &str) -> Result<Self, DecimalError> {
        Ok(Quantity(Decimal::from_string(s)?))
    }

    /// Zero quantity.
    pub const ZERO: Quantity = Quantity(Decimal::ZERO);

    /// True if exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True if strictly negative (always invalid for an order).
    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    /// The smaller of `self` and `other`.
    pub fn min(self, other: Quantity) -> Quantity {
        if self.0 <= other.0 { self } else { other }
    }
}

impl std::ops::Add for Quantity {
    type Output = Quantity;
    fn add(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Quantity {
    type Output = Quantity;
    fn sub(self, rhs: Quantity) -> Quantity {
        Quantity(self.0 - rhs.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
