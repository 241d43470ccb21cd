//! Core per-symbol order book: price-time priority structures, the by-id
//! map, and the operations defined over them.

use super::error::OrderBookError;
use super::heap::{AskEntry, BidEntry, drain_to_live_top};
use crate::decimal::{Price, Quantity};
use crate::order::{Order, OrderId, OrderStatus, Side};
use std::collections::{BTreeMap, BinaryHeap, HashMap};
use std::sync::Mutex;
use tracing::trace;

/// Everything guarded by a book's single mutex. Every field here is only
/// ever touched while holding that lock — no internal reference escapes it.
pub(crate) struct BookState {
    pub(crate) bids: BinaryHeap<BidEntry>,
    pub(crate) asks: BinaryHeap<AskEntry>,
    pub(crate) by_id: HashMap<OrderId, Order>,
    pub(crate) seq: u64,
    pub(crate) closed: bool,
}

impl BookState {
    fn new() -> Self {
        BookState {
            bids: BinaryHeap::new(),
            asks: BinaryHeap::new(),
            by_id: HashMap::new(),
            seq: 0,
            closed: false,
        }
    }

    pub(crate) fn next_sequence(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    /// Inserts `order` (already validated) into its side. Fails with
    /// `DuplicateId` if the id is already live. Assigns the sequence number
    /// and sets status to `Open`.
    pub(crate) fn insert(&mut self, mut order: Order) -> Result<Order, OrderBookError> {
        if self.by_id.contains_key(&order.id) {
            return Err(OrderBookError::DuplicateId(order.id));
        }
        let seq = self.next_sequence();
        order.sequence_number = seq;
        order.status = if order.filled_quantity.is_zero() {
            OrderStatus::Open
        } else {
            OrderStatus::PartiallyFilled
        };
        match order.side {
            Side::Buy => self.bids.push(BidEntry::new(order.price, seq, order.id)),
            Side::Sell => self.asks.push(AskEntry::new(order.price, seq, order.id)),
        }
        let inserted = order.clone();
        self.by_id.insert(order.id, order);
        Ok(inserted)
    }

    /// Marks `id` cancelled and removes it from `by_id`. The heap entry
    /// becomes a tombstone, discarded lazily the next time it reaches the
    /// top.
    pub(crate) fn cancel(&mut self, id: OrderId) -> Result<Order, OrderBookError> {
        match self.by_id.get(&id) {
            None => Err(OrderBookError::NotFound(id)),
            Some(order) if order.status.is_terminal() => Err(OrderBookError::NotCancelable(id)),
            Some(_) => {
                let mut order = self.by_id.remove(&id).expect("checked present above");
                order.status = OrderStatus::Cancelled;
                trace!(order_id = %id, "order cancelled, heap entry tombstoned");
                Ok(order)
            }
        }
    }

    /// Drains tombstones off the bid side and returns the live top's id, if
    /// any.
    pub(crate) fn peek_live_bid(&mut self) -> Option<OrderId> {
        let BookState { bids, by_id, .. } = self;
        drain_to_live_top(bids, |e| by_id.contains_key(&e.order_id())).map(|e| e.order_id())
    }

    /// Drains tombstones off the ask side and returns the live top's id, if
    /// any.
    pub(crate) fn peek_live_ask(&mut self) -> Option<OrderId> {
        let BookState { asks, by_id, .. } = self;
        drain_to_live_top(asks, |e| by_id.contains_key(&e.order_id())).map(|e| e.order_id())
    }

    /// Aggregates remaining quantity per distinct price for up to `levels`
    /// best prices on `side`. Only `by_id` is consulted: it contains exactly
    /// the live orders, so no tombstone or zero-remaining order can
    /// contribute.
    pub(crate) fn depth(&self, side: Side, levels: usize) -> Vec<(Price, Quantity)> {
        let mut by_price: BTreeMap<Price, Quantity> = BTreeMap::new();
        for order in self.by_id.values().filter(|o| o.side == side) {
            let remaining = order.remaining();
            if remaining.is_zero() {
                continue;
            }
            let entry = by_price.entry(order.price).or_insert(Quantity::ZERO);
            *entry = *entry + remaining;
        }
        let mut levels_vec: Vec<(Price, Quantity)> = by_price.into_iter().collect();
        match side {
            Side::Buy => levels_vec.reverse(),
            Side::Sell => {}
        }
        levels_vec.truncate(levels);
        levels_vec
    }
}

/// A single symbol's order book: one exclusive lock over the bid/ask heaps,
/// the by-id map and the sequence counter.
pub struct OrderBook {
    symbol: String,
    pub(crate) state: Mutex<BookState>,
}

impl OrderBook {
    /// Creates an empty book for `symbol`.
    pub fn new(symbol: impl Into<String>) -> Self {
        OrderBook {
            symbol: symbol.into(),
            state: Mutex::new(BookState::new()),
        }
    }

    /// The book's symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Adds a resting order directly, bypassing the matching engine. Mainly
    /// useful for tests and for seeding a book; `MatchingEngine::submit` is
    /// the production entry point since it also crosses the order first.
    pub fn add(&self, order: Order) -> Result<Order, OrderBookError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(OrderBookError::BookClosed);
        }
        state.insert(order)
    }

    /// Cancels a live order by id.
    pub fn cancel(&self, id: OrderId) -> Result<Order, OrderBookError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(OrderBookError::BookClosed);
        }
        state.cancel(id)
    }

    /// Looks up a live order by id. Returns `None` for unknown or terminal
    /// ids (they are not in `by_id`).
    pub fn get(&self, id: OrderId) -> Option<Order> {
        let state = self.state.lock().unwrap();
        state.by_id.get(&id).cloned()
    }

    /// The best bid: the highest-priority live order's (price, remaining
    /// quantity), or `None` if the bid side is empty.
    pub fn best_bid(&self) -> Option<(Price, Quantity)> {
        let mut state = self.state.lock().unwrap();
        let id = state.peek_live_bid()?;
        let order = state.by_id.get(&id)?;
        Some((order.price, order.remaining()))
    }

    /// The best ask: the highest-priority live order's (price, remaining
    /// quantity), or `None` if the ask side is empty.
    pub fn best_ask(&self) -> Option<(Price, Quantity)> {
        let mut state = self.state.lock().unwrap();
        let id = state.peek_live_ask()?;
        let order = state.by_id.get(&id)?;
        Some((order.price, order.remaining()))
    }

    /// Aggregated depth for up to `levels` price levels per side, sorted by
    /// each side's priority (bids descending, asks ascending).
    pub fn depth(&self, levels: usize) -> (Vec<(Price, Quantity)>, Vec<(Price, Quantity)>) {
        let state = self.state.lock().unwrap();
        (state.depth(Side::Buy, levels), state.depth(Side::Sell, levels))
    }

    /// Marks the book closed; subsequent operations return `BookClosed`.
    pub fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
    }
}
