//! End-to-end coverage across `BookManager`, `BreakerGroup` and
//! `MatchingEngine` together, through the crate's public surface only.

use matching_core::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn limit(symbol: &str, side: Side, price: &str, qty: &str) -> Order {
    Order {
        id: OrderId::new(),
        user_id: UserId(Uuid::new_v4()),
        symbol: symbol.to_string(),
        side,
        kind: OrderKind::Limit,
        price: Price::from_string(price).unwrap(),
        total_quantity: Quantity::from_string(qty).unwrap(),
        filled_quantity: Quantity::ZERO,
        status: OrderStatus::Open,
        sequence_number: 0,
        timestamp: chrono::Utc::now(),
        reject_reason: None,
        worst_price: None,
    }
}

#[test]
fn multi_symbol_books_are_independent() {
    let engine = MatchingEngine::with_defaults();
    engine.submit(limit("BTC/USD", Side::Sell, "100", "1"), Deadline::none()).unwrap();
    engine.submit(limit("ETH/USD", Side::Buy, "50", "2"), Deadline::none()).unwrap();

    let btc = engine.book("BTC/USD");
    let eth = engine.book("ETH/USD");
    assert!(btc.best_ask().is_some());
    assert!(btc.best_bid().is_none());
    assert!(eth.best_bid().is_some());
    assert!(eth.best_ask().is_none());
}

/// An `EventSink` that always fails, used to exercise that publish failures
/// are logged and never roll back the fills already produced.
#[derive(Debug)]
struct FailingEventSink;

impl EventSink for FailingEventSink {
    fn publish(&self, _topic: &str, _trades: &[Trade]) -> Result<(), matching_core::collaborators::EventSinkError> {
        Err(matching_core::collaborators::EventSinkError("downstream unavailable".into()))
    }
}

#[test]
fn failing_event_sink_does_not_roll_back_trades() {
    let engine = MatchingEngine::new(
        Arc::new(SystemClock),
        Arc::new(UuidIdGen),
        Arc::new(FailingEventSink),
        BreakerConfig::default(),
    );
    engine.submit(limit("BTC/USD", Side::Sell, "100", "1"), Deadline::none()).unwrap();
    let outcome = engine.submit(limit("BTC/USD", Side::Buy, "100", "1"), Deadline::none()).unwrap();

    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.order.status, OrderStatus::Filled);
}

#[test]
fn repeated_publish_failures_trip_the_event_sink_breaker() {
    let engine = MatchingEngine::new(
        Arc::new(SystemClock),
        Arc::new(UuidIdGen),
        Arc::new(FailingEventSink),
        BreakerConfig {
            max_failures: 1,
            open_timeout: Duration::from_secs(60),
            half_open_budget: 1,
        },
    );
    engine.submit(limit("BTC/USD", Side::Sell, "100", "1"), Deadline::none()).unwrap();
    engine.submit(limit("BTC/USD", Side::Buy, "100", "1"), Deadline::none()).unwrap();

    let states = engine.breaker_states();
    let btc_breaker = states.iter().find(|(name, _)| name == "event-sink:BTC/USD");
    assert_eq!(btc_breaker.map(|(_, s)| *s), Some(CircuitState::Open));
}

#[test]
fn fee_schedule_applies_to_a_submitted_trade_notional() {
    let engine = MatchingEngine::with_defaults();
    engine.submit(limit("BTC/USD", Side::Sell, "100.00", "2"), Deadline::none()).unwrap();
    let outcome = engine.submit(limit("BTC/USD", Side::Buy, "100.00", "2"), Deadline::none()).unwrap();

    let trade = &outcome.trades[0];
    let notional = trade.price.notional(trade.quantity, Currency::new("USD"));
    assert_eq!(notional.amount().to_string(), "200.00");

    let schedule = FeeSchedule::new(-2, 5);
    let taker_fee = schedule.calculate_fee(notional, false);
    let maker_rebate = schedule.calculate_fee(notional, true);
    assert_eq!(taker_fee.amount().to_string(), "0.10");
    assert_eq!(maker_rebate.amount().to_string(), "-0.04");
}

#[test]
fn cancelling_a_resting_order_frees_its_price_level() {
    let engine = MatchingEngine::with_defaults();
    let outcome = engine.submit(limit("BTC/USD", Side::Buy, "100", "1"), Deadline::none()).unwrap();
    let book = engine.book("BTC/USD");
    assert!(book.best_bid().is_some());

    engine.cancel("BTC/USD", outcome.order.id).unwrap();
    assert!(book.best_bid().is_none());
}
