//! Currency-tagged money values.

use super::{Decimal, MONEY_DISPLAY_SCALE, RoundingMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A currency code, e.g. `"USD"`. Interned as a short inline string rather
/// than an enum so the crate never needs to know the full set of currencies
/// a deployment trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency([u8; 8], u8);

impl Currency {
    /// Builds a currency tag from its code. Panics if longer than 8 bytes;
    /// currency codes in this crate's domain (ISO 4217, ticker symbols) never
    /// are.
    pub fn new(code: &str) -> Self {
        assert!(
            code.len() <= 8,
            "currency code {code:?} longer than 8 bytes"
        );
        let mut buf = [0u8; 8];
        buf[..code.len()].copy_from_slice(code.as_bytes());
        Currency(buf, code.len() as u8)
    }

    /// The currency code as a string slice.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0[..self.1 as usize]).unwrap_or("")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when arithmetic is attempted between [`Money`] values tagged
/// with different currencies. There is no implicit conversion.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("currency mismatch: {lhs} vs {rhs}")]
pub struct CurrencyMismatch {
    /// The currency of the left-hand operand.
    pub lhs: Currency,
    /// The currency of the right-hand operand.
    pub rhs: Currency,
}

/// A currency-tagged monetary amount.
///
/// `add`/`sub` require identical currency tags and fail with
/// [`CurrencyMismatch`] otherwise; multiplication by a dimensionless scalar
/// is always permitted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Builds a money value from a raw decimal amount and currency.
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Money { amount, currency }
    }

    /// Parses a money value from a decimal string and currency.
    pub fn from_string(s: &str, currency: Currency) -> Result<Self, super::DecimalError> {
        Ok(Money::new(Decimal::from_string(s)?, currency))
    }

    /// Zero in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Money::new(Decimal::ZERO, currency)
    }

    /// The underlying decimal amount, currency tag stripped.
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// The currency tag.
    pub fn currency(&self) -> Currency {
        self.currency
    }

    /// Adds two money values of the same currency.
    pub fn add(&self, other: Money) -> Result<Money, CurrencyMismatch> {
        self.check_currency(other)?;
        Ok(Money::new(self.amount + other.amount, self.currency))
    }

    /// Subtracts `other` from `self`, both of the same currency.
    pub fn sub(&self, other: Money) -> Result<Money, CurrencyMismatch> {
        self.check_currency(other)?;
        Ok(Money::new(self.amount - other.amount, self.currency))
    }

    /// Scales this money value by a dimensionless scalar (e.g. a quantity of
    /// contracts or a weighting factor). Never fails: a scalar carries no
    /// currency to mismatch against.
    pub fn scale(&self, scalar: Decimal) -> Money {
        Money::new(self.amount * scalar, self.currency)
    }

    /// Rounds the amount, keeping the currency tag.
    pub fn round(&self, places: u32, mode: RoundingMode) -> Money {
        Money::new(self.amount.round(places, mode), self.currency)
    }

    /// Rounds to the default money display scale (2 places) using
    /// `HalfEven`, banker's rounding to avoid systematic bias on display.
    pub fn round_display(&self) -> Money {
        self.round(MONEY_DISPLAY_SCALE, RoundingMode::HalfEven)
    }

    fn check_currency(&self, other: Money) -> Result<(), CurrencyMismatch> {
        if self.currency != other.currency {
            return Err(CurrencyMismatch {
                lhs: self.currency,
                rhs: other.currency,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Computes `fee = round_half_even(notional * rate, 2)` in the notional's
/// currency.
pub fn fee(notional: Money, rate: Decimal) -> Money {
    notional.scale(rate).round(MONEY_DISPLAY_SCALE, RoundingMode::HalfEven)
}

/// Computes `pnl = (exit - entry) * qty` entirely in decimal.
pub fn pnl(entry: super::Price, exit: super::Price, qty: super::Quantity) -> Decimal {
    (exit.0 - entry.0) * qty.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_round_trip_exactly() {
        let usd = Currency::new("USD");
        let a = Money::from_string("10.00", usd).unwrap();
        let b = Money::from_string("3.33", usd).unwrap();
        let sum = a.add(b).unwrap();
        let back = sum.sub(b).unwrap();
        assert_eq!(back.amount(), a.amount());
    }

    #[test]
    fn mixed_currency_add_fails() {
        let usd = Currency::new("USD");
        let eur = Currency::new("EUR");
        let a = Money::from_string("10.00", usd).unwrap();
        let b = Money::from_string("5.00", eur).unwrap();
        assert!(a.add(b).is_err());
    }

    #[test]
    fn fee_rounds_half_even_to_two_places() {
        let usd = Currency::new("USD");
        let notional = Money::from_string("10000.00", usd).unwrap();
        let rate = Decimal::from_string("0.0005").unwrap();
        let f = fee(notional, rate);
        assert_eq!(f.amount().to_string(), "5.00");
    }

    #[test]
    fn pnl_is_computed_in_decimal() {
        use super::super::{Price, Quantity};
        let entry = Price::from_string("100.00").unwrap();
        let exit = Price::from_string("105.50").unwrap();
        let qty = Quantity::from_string("10").unwrap();
        let p = pnl(entry, exit, qty);
        assert_eq!(p.to_string(), "55.00");
    }
}
