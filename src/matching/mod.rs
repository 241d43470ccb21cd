//! The cross-and-fill loop: price-time priority matching, partial fills,
//! maker-price settlement, and best-effort event emission.

mod error;

pub use error::MatchingError;

use crate::breaker::{BreakerConfig, BreakerGroup, CircuitState};
use crate::collaborators::{Clock, EventSink, IdGen, NoopEventSink, SystemClock, UuidIdGen};
use crate::order::{Order, OrderKind, OrderStatus, RejectReason, Side};
use crate::orderbook::book::{BookState, OrderBook};
use crate::orderbook::{BookManager, OrderBookError};
use crate::trade::Trade;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// A cooperative deadline for [`MatchingEngine::submit`]. Checked once per
/// cross-loop iteration, never via a sleep or preemption.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// A deadline `duration` from now.
    pub fn after(duration: Duration) -> Self {
        Deadline(Some(Instant::now() + duration))
    }

    /// No deadline: the cross loop runs to completion regardless of wall
    /// time.
    pub fn none() -> Self {
        Deadline(None)
    }

    fn is_expired(&self) -> bool {
        self.0.map(|t| Instant::now() >= t).unwrap_or(false)
    }
}

/// The result of a successful [`MatchingEngine::submit`] call: the
/// aggressor's final state plus every trade its arrival produced, in the
/// order they occurred.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// The submitted order's state after crossing and, if a limit order
    /// with remaining quantity, resting on the book.
    pub order: Order,
    /// Trades produced by this submission, in execution order.
    pub trades: Vec<Trade>,
}

/// Wraps a [`BookManager`], a [`BreakerGroup`] guarding the event sink, and
/// the `Clock`/`IdGen` collaborators. One engine typically serves every
/// symbol a process trades.
pub struct MatchingEngine {
    books: BookManager,
    breakers: BreakerGroup,
    clock: Arc<dyn Clock>,
    id_gen: Arc<dyn IdGen>,
    sink: Arc<dyn EventSink>,
}

impl MatchingEngine {
    /// Builds an engine from explicit collaborators.
    pub fn new(
        clock: Arc<dyn Clock>,
        id_gen: Arc<dyn IdGen>,
        sink: Arc<dyn EventSink>,
        breaker_config: BreakerConfig,
    ) -> Self {
        MatchingEngine {
            books: BookManager::new(),
            breakers: BreakerGroup::new(breaker_config),
            clock,
            id_gen,
            sink,
        }
    }

    /// An engine with the system clock, random UUIDs, and a no-op event
    /// sink. Suitable for tests and for embedding before a downstream
    /// publisher is wired up.
    pub fn with_defaults() -> Self {
        MatchingEngine::new(
            Arc::new(SystemClock),
            Arc::new(UuidIdGen),
            Arc::new(NoopEventSink),
            BreakerConfig::default(),
        )
    }

    /// The book for `symbol`, creating it if this is the first order seen
    /// for it.
    pub fn book(&self, symbol: &str) -> Arc<OrderBook> {
        self.books.get_or_create(symbol)
    }

    /// Snapshot of every event-sink breaker's current state, keyed by
    /// `"event-sink:{symbol}"`. Useful for health reporting.
    pub fn breaker_states(&self) -> Vec<(String, CircuitState)> {
        self.breakers.states()
    }

    /// Submits `order`: validates it, crosses it against the book, rests
    /// any limit remainder, and best-effort publishes the resulting trades.
    pub fn submit(&self, mut order: Order, deadline: Deadline) -> Result<SubmitOutcome, MatchingError> {
        if let Err(reason) = validate(&order) {
            order.status = OrderStatus::Rejected;
            order.reject_reason = Some(reason);
            return Err(MatchingError::InvalidOrder(reason));
        }

        let symbol = order.symbol.clone();
        let book = self.books.get_or_create(&symbol);
        let trades = {
            let mut state = book.state.lock().unwrap();
            if state.closed {
                return Err(MatchingError::Book(OrderBookError::BookClosed));
            }

            let trades = self.cross(&mut state, &mut order, &symbol, deadline)?;

            if !order.remaining().is_zero() {
                match order.kind {
                    OrderKind::Limit => {
                        order = state.insert(order)?;
                    }
                    OrderKind::Market => {
                        order.status = OrderStatus::CancelledUnfilled;
                        order.reject_reason = Some(RejectReason::MarketRemainderDiscarded);
                    }
                }
            }
            trades
        };

        self.publish(&symbol, &trades);
        Ok(SubmitOutcome { order, trades })
    }

    /// Cancels a live order on `symbol`'s book.
    pub fn cancel(&self, symbol: &str, id: crate::order::OrderId) -> Result<Order, MatchingError> {
        match self.books.get(symbol) {
            Some(book) => Ok(book.cancel(id)?),
            None => Err(MatchingError::Book(OrderBookError::NotFound(id))),
        }
    }

    /// The cross loop: matches `aggressor` against the opposite side of
    /// `state` until it is filled, the opposite side runs dry, or the
    /// aggressor's limit no longer crosses. Returns the trades produced so
    /// far even when cut short by an expired deadline, wrapped in
    /// [`MatchingError::Cancelled`].
    fn cross(
        &self,
        state: &mut BookState,
        aggressor: &mut Order,
        symbol: &str,
        deadline: Deadline,
    ) -> Result<Vec<Trade>, MatchingError> {
        let mut trades = Vec::new();

        loop {
            if aggressor.remaining().is_zero() {
                break;
            }
            if deadline.is_expired() {
                return Err(MatchingError::Cancelled {
                    trades,
                    order: aggressor.clone(),
                });
            }

            let opp_id = match aggressor.side.opposite() {
                Side::Buy => state.peek_live_bid(),
                Side::Sell => state.peek_live_ask(),
            };
            let Some(opp_id) = opp_id else { break };
            let opp_price = state.by_id.get(&opp_id).expect("peek returned a live id").price;

            if aggressor.kind == OrderKind::Limit {
                let crosses = match aggressor.side {
                    Side::Buy => aggressor.price >= opp_price,
                    Side::Sell => aggressor.price <= opp_price,
                };
                if !crosses {
                    break;
                }
            }

            let fill = {
                let opp = state.by_id.get_mut(&opp_id).expect("peek returned a live id");
                let fill = aggressor.remaining().min(opp.remaining());
                opp.filled_quantity = opp.filled_quantity + fill;
                opp.status = if opp.is_fully_filled() {
                    OrderStatus::Filled
                } else {
                    OrderStatus::PartiallyFilled
                };
                fill
            };

            if state.by_id.get(&opp_id).expect("still present").is_fully_filled() {
                state.by_id.remove(&opp_id);
            }

            aggressor.filled_quantity = aggressor.filled_quantity + fill;
            aggressor.status = if aggressor.is_fully_filled() {
                OrderStatus::Filled
            } else {
                OrderStatus::PartiallyFilled
            };

            let (buy_order_id, sell_order_id) = match aggressor.side {
                Side::Buy => (aggressor.id, opp_id),
                Side::Sell => (opp_id, aggressor.id),
            };

            trades.push(Trade {
                id: self.id_gen.new_id(),
                symbol: symbol.to_string(),
                buy_order_id,
                sell_order_id,
                price: opp_price,
                quantity: fill,
                timestamp: self.clock.now(),
                aggressor_side: aggressor.side,
            });
        }

        Ok(trades)
    }

    /// Hands `trades` to the event sink, wrapped in a per-symbol breaker.
    /// Never called with the book lock held. Publish failures (collaborator
    /// error or breaker rejection) are logged; the trades already produced
    /// remain authoritative.
    fn publish(&self, symbol: &str, trades: &[Trade]) {
        if trades.is_empty() {
            return;
        }
        let breaker_name = format!("event-sink:{symbol}");
        let topic = format!("trades:{symbol}");
        let sink = Arc::clone(&self.sink);
        let owned_trades = trades.to_vec();
        if let Err(e) = self.breakers.execute(&breaker_name, move || sink.publish(&topic, &owned_trades)) {
            warn!(symbol, error = %e, "trade publish failed or breaker rejected; trades remain authoritative");
        }
    }
}

/// Non-zero quantity, non-negative limit price.
fn validate(order: &Order) -> Result<(), RejectReason> {
    if order.total_quantity.is_zero() || order.total_quantity.is_negative() {
        return Err(RejectReason::NonPositiveQuantity);
    }
    if order.kind == OrderKind::Limit && order.price.is_negative() {
        return Err(RejectReason::NegativePrice);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Decimal, Price, Quantity};
    use crate::order::{OrderId, UserId};
    use uuid::Uuid;

    fn limit(id: OrderId, side: Side, price: &str, qty: &str) -> Order {
        Order {
            id,
            user_id: UserId(Uuid::new_v4()),
            symbol: "BTC/USD".into(),
            side,
            kind: OrderKind::Limit,
            price: Price(Decimal::from_string(price).unwrap()),
            total_quantity: Quantity(Decimal::from_string(qty).unwrap()),
            filled_quantity: Quantity::ZERO,
            status: OrderStatus::Open,
            sequence_number: 0,
            timestamp: chrono::Utc::now(),
            reject_reason: None,
            worst_price: None,
        }
    }

    fn market(id: OrderId, side: Side, qty: &str) -> Order {
        Order {
            kind: OrderKind::Market,
            price: Price(Decimal::ZERO),
            ..limit(id, side, "0", qty)
        }
    }

    #[test]
    fn scenario_one_simple_cross() {
        let engine = MatchingEngine::with_defaults();
        let s1 = OrderId::new();
        let b1 = OrderId::new();
        engine.submit(limit(s1, Side::Sell, "100.00", "1"), Deadline::none()).unwrap();
        let outcome = engine.submit(limit(b1, Side::Buy, "100.00", "1"), Deadline::none()).unwrap();

        assert_eq!(outcome.trades.len(), 1);
        let trade = &outcome.trades[0];
        assert_eq!(trade.price.to_string(), "100.00");
        assert_eq!(trade.quantity.to_string(), "1");
        assert_eq!(trade.buy_order_id, b1);
        assert_eq!(trade.sell_order_id, s1);
        assert_eq!(outcome.order.status, OrderStatus::Filled);

        let book = engine.book("BTC/USD");
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn scenario_two_partial_fill_and_price_time_priority() {
        let engine = MatchingEngine::with_defaults();
        let s1 = OrderId::new();
        let s2 = OrderId::new();
        let b1 = OrderId::new();
        engine.submit(limit(s1, Side::Sell, "100", "2"), Deadline::none()).unwrap();
        engine.submit(limit(s2, Side::Sell, "100", "3"), Deadline::none()).unwrap();
        let outcome = engine.submit(limit(b1, Side::Buy, "100", "4"), Deadline::none()).unwrap();

        assert_eq!(outcome.trades.len(), 2);
        assert_eq!(outcome.trades[0].sell_order_id, s1);
        assert_eq!(outcome.trades[0].quantity.to_string(), "2");
        assert_eq!(outcome.trades[1].sell_order_id, s2);
        assert_eq!(outcome.trades[1].quantity.to_string(), "2");
        assert_eq!(outcome.order.status, OrderStatus::Filled);

        let book = engine.book("BTC/USD");
        let remaining_s2 = book.get(s2).unwrap();
        assert_eq!(remaining_s2.remaining().to_string(), "1");
    }

    #[test]
    fn scenario_three_aggressor_pays_maker_price() {
        let engine = MatchingEngine::with_defaults();
        let s1 = OrderId::new();
        let b1 = OrderId::new();
        engine.submit(limit(s1, Side::Sell, "101", "1"), Deadline::none()).unwrap();
        let outcome = engine.submit(limit(b1, Side::Buy, "105", "1"), Deadline::none()).unwrap();

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].price.to_string(), "101");
    }

    #[test]
    fn scenario_four_lazy_cancel_at_top() {
        let engine = MatchingEngine::with_defaults();
        let s1 = OrderId::new();
        let b1 = OrderId::new();
        engine.submit(limit(s1, Side::Sell, "100", "1"), Deadline::none()).unwrap();
        engine.cancel("BTC/USD", s1).unwrap();
        let outcome = engine.submit(limit(b1, Side::Buy, "200", "1"), Deadline::none()).unwrap();

        assert!(outcome.trades.is_empty());
        let book = engine.book("BTC/USD");
        let (price, qty) = book.best_bid().unwrap();
        assert_eq!(price.to_string(), "200");
        assert_eq!(qty.to_string(), "1");
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn scenario_five_market_order_remainder_discarded() {
        let engine = MatchingEngine::with_defaults();
        let s1 = OrderId::new();
        let b1 = OrderId::new();
        engine.submit(limit(s1, Side::Sell, "100", "1"), Deadline::none()).unwrap();
        let outcome = engine.submit(market(b1, Side::Buy, "5"), Deadline::none()).unwrap();

        assert_eq!(outcome.trades.len(), 1);
        assert_eq!(outcome.trades[0].quantity.to_string(), "1");
        assert_eq!(outcome.order.status, OrderStatus::CancelledUnfilled);
        assert_eq!(outcome.order.remaining().to_string(), "4");
        assert_eq!(outcome.order.reject_reason, Some(RejectReason::MarketRemainderDiscarded));

        let book = engine.book("BTC/USD");
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn zero_quantity_order_is_rejected() {
        let engine = MatchingEngine::with_defaults();
        let err = engine
            .submit(limit(OrderId::new(), Side::Buy, "100", "0"), Deadline::none())
            .unwrap_err();
        assert!(matches!(err, MatchingError::InvalidOrder(RejectReason::NonPositiveQuantity)));
    }

    #[test]
    fn negative_price_limit_order_is_rejected() {
        let engine = MatchingEngine::with_defaults();
        let err = engine
            .submit(limit(OrderId::new(), Side::Buy, "-1", "1"), Deadline::none())
            .unwrap_err();
        assert!(matches!(err, MatchingError::InvalidOrder(RejectReason::NegativePrice)));
    }

    #[test]
    fn expired_deadline_cancels_before_crossing_and_keeps_book_intact() {
        let engine = MatchingEngine::with_defaults();
        let s1 = OrderId::new();
        engine.submit(limit(s1, Side::Sell, "100", "1"), Deadline::none()).unwrap();

        let expired = Deadline::after(Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(2));
        let err = engine
            .submit(limit(OrderId::new(), Side::Buy, "100", "1"), expired)
            .unwrap_err();
        match err {
            MatchingError::Cancelled { trades, .. } => assert!(trades.is_empty()),
            other => panic!("expected Cancelled, got {other:?}"),
        }

        let book = engine.book("BTC/USD");
        let (price, qty) = book.best_ask().unwrap();
        assert_eq!(price.to_string(), "100");
        assert_eq!(qty.to_string(), "1");
    }

    #[test]
    fn cancel_unknown_symbol_fails_not_found() {
        let engine = MatchingEngine::with_defaults();
        let err = engine.cancel("BTC/USD", OrderId::new()).unwrap_err();
        assert!(matches!(err, MatchingError::Book(OrderBookError::NotFound(_))));
    }
}
