//! Property-based invariants, driven through the public `matching_core` API
//! with `proptest`.

use matching_core::prelude::*;
use proptest::prelude::*;
use uuid::Uuid;

fn limit(symbol: &str, side: Side, price: i64, qty: i64) -> Order {
    Order {
        id: OrderId::new(),
        user_id: UserId(Uuid::new_v4()),
        symbol: symbol.to_string(),
        side,
        kind: OrderKind::Limit,
        price: Price(Decimal::from_int(price)),
        total_quantity: Quantity(Decimal::from_int(qty)),
        filled_quantity: Quantity::ZERO,
        status: OrderStatus::Open,
        sequence_number: 0,
        timestamp: chrono::Utc::now(),
        reject_reason: None,
        worst_price: None,
    }
}

fn side_strategy() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

proptest! {
    /// Trade price is always the maker's price, and it is never strictly
    /// better for the aggressor than the aggressor's own limit.
    #[test]
    fn trade_price_is_maker_price_and_never_improves_on_aggressor_limit(
        maker_side in side_strategy(),
        maker_price in 1i64..200,
        maker_qty in 1i64..50,
        aggressor_price_delta in -50i64..50,
        aggressor_qty in 1i64..50,
    ) {
        let engine = MatchingEngine::with_defaults();
        let maker = limit("SYM", maker_side, maker_price, maker_qty);
        engine.submit(maker, Deadline::none()).unwrap();

        let aggressor_side = maker_side.opposite();
        let aggressor_price = maker_price + aggressor_price_delta;
        prop_assume!(aggressor_price > 0);
        let aggressor = limit("SYM", aggressor_side, aggressor_price, aggressor_qty);
        let agg_limit = aggressor.price;
        let outcome = engine.submit(aggressor, Deadline::none()).unwrap();

        for trade in &outcome.trades {
            prop_assert_eq!(trade.price, Price(Decimal::from_int(maker_price)));
            match aggressor_side {
                Side::Buy => prop_assert!(trade.price <= agg_limit),
                Side::Sell => prop_assert!(trade.price >= agg_limit),
            }
        }
    }

    /// After any `submit` returns, the book is never crossed: either one
    /// side is empty, or `best_bid.price < best_ask.price`.
    #[test]
    fn book_is_never_left_crossed_after_submit(
        first_side in side_strategy(),
        first_price in 1i64..200,
        first_qty in 1i64..50,
        second_price_delta in -50i64..50,
        second_qty in 1i64..50,
    ) {
        let engine = MatchingEngine::with_defaults();
        engine.submit(limit("SYM", first_side, first_price, first_qty), Deadline::none()).unwrap();

        let second_price = first_price + second_price_delta;
        prop_assume!(second_price > 0);
        engine.submit(limit("SYM", first_side.opposite(), second_price, second_qty), Deadline::none()).unwrap();

        let book = engine.book("SYM");
        if let (Some((bid, _)), Some((ask, _))) = (book.best_bid(), book.best_ask()) {
            prop_assert!(bid < ask);
        }
    }

    /// `depth(levels)` with enough levels sums to exactly the resting
    /// quantity placed, when every order is added at a distinct price (so
    /// none of them can cross and match).
    #[test]
    fn depth_sums_to_total_resting_quantity_when_orders_cannot_cross(
        qtys in prop::collection::vec(1i64..20, 1..10),
    ) {
        let engine = MatchingEngine::with_defaults();
        let mut expected_total = 0i64;
        for (i, qty) in qtys.iter().enumerate() {
            // Strictly increasing prices: bids never cross each other, and
            // there are no asks to cross against.
            let price = 1_000 + i as i64;
            engine.submit(limit("SYM", Side::Buy, price, *qty), Deadline::none()).unwrap();
            expected_total += *qty;
        }

        let (bids, _) = engine.book("SYM").depth(qtys.len() + 1);
        let summed: i64 = bids
            .iter()
            .map(|(_, q)| q.0.to_string().parse::<i64>().unwrap())
            .sum();
        prop_assert_eq!(summed, expected_total);
    }

    /// Decimal round-trips through its string form for any integer amount
    /// (the public-surface analogue of the internal-module round-trip
    /// property).
    #[test]
    fn decimal_round_trips_through_string_for_any_integer(n in -1_000_000i64..1_000_000) {
        let d = Decimal::from_int(n);
        let reparsed = Decimal::from_string(&d.to_string()).unwrap();
        prop_assert_eq!(d, reparsed);
    }

    /// `(a + b) - b == a` exactly, for same-currency money values.
    #[test]
    fn money_add_then_sub_is_exact(a in -1_000_000i64..1_000_000, b in -1_000_000i64..1_000_000) {
        let usd = Currency::new("USD");
        let a = Money::new(Decimal::from_int(a), usd);
        let b = Money::new(Decimal::from_int(b), usd);
        let back = a.add(b).unwrap().sub(b).unwrap();
        prop_assert_eq!(back.amount(), a.amount());
    }
}
