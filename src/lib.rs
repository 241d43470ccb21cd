//! # Matching Core
//!
//! The core of a high-frequency trading platform: fixed-point decimal
//! arithmetic, a three-state circuit breaker, a price-time priority limit
//! order book, and the cross-and-fill matching engine that ties them
//! together.
//!
//! This crate is a library only. Gateways, authentication, persistence,
//! message brokers, risk policy and billing are external collaborators,
//! consumed here only through the traits in [`collaborators`].
//!
//! ## Layout
//!
//! - [`decimal`] — exact base-10 arithmetic (`Decimal`, `Price`, `Quantity`,
//!   `Money`).
//! - [`breaker`] — the three-state circuit breaker and its named-group
//!   registry.
//! - [`order`] / [`trade`] — the order and trade data model.
//! - [`collaborators`] — the `Clock`/`IdGen`/`EventSink` traits the engine
//!   is generic over, plus minimal in-crate defaults.
//! - [`orderbook`] — the per-symbol book, its fee schedule, and the
//!   multi-symbol registry.
//! - [`matching`] — the engine that crosses orders against a book and
//!   emits trades.
//!
//! Prices, quantities and money never touch a binary float on any
//! accounting path — every value that could ever appear in a ledger is a
//! [`decimal::Decimal`] newtype from the start.

pub mod breaker;
pub mod collaborators;
pub mod decimal;
pub mod matching;
pub mod order;
pub mod orderbook;
pub mod prelude;
pub mod trade;
