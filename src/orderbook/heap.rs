//! The binary-heap-backed priority structures behind each side of a book.
//!
//! A binary heap with lazy tombstone deletion, not a balanced tree or skip
//! list: a cancelled order's heap entry is left in place and discarded the
//! next time it would reach the top. `std::collections::BinaryHeap::pop`
//! already has the "swap root with last element, truncate, sift down"
//! semantics that make this correct (no live reference to the removed
//! element survives the pop), so this module leans on the standard library
//! rather than reimplementing a heap.

use crate::decimal::Price;
use crate::order::OrderId;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One heap entry: just enough to order orders by price-time priority and
/// to look the live order back up in `by_id`. The entry itself never
/// changes once pushed — a partial fill mutates the `Order` in `by_id`, not
/// this entry — so the heap's structural position stays valid for the
/// entry's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    price: Price,
    sequence: u64,
    order_id: OrderId,
}

/// Bid-side ordering: higher price has higher priority; ties broken by
/// earlier sequence. `BinaryHeap` is a max-heap, so "higher priority"
/// must compare as `Greater`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidEntry(Entry);

impl BidEntry {
    pub fn new(price: Price, sequence: u64, order_id: OrderId) -> Self {
        BidEntry(Entry { price, sequence, order_id })
    }

    pub fn order_id(&self) -> OrderId {
        self.0.order_id
    }
}

impl PartialOrd for BidEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BidEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .price
            .cmp(&other.0.price)
            // Earlier sequence = higher priority = must sort "greater".
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

/// Ask-side ordering: lower price has higher priority; ties broken by
/// earlier sequence. Priority must still compare as `Greater` for
/// `BinaryHeap`'s max-heap to surface it first, so both comparisons are
/// reversed relative to their natural numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AskEntry(Entry);

impl AskEntry {
    pub fn new(price: Price, sequence: u64, order_id: OrderId) -> Self {
        AskEntry(Entry { price, sequence, order_id })
    }

    pub fn order_id(&self) -> OrderId {
        self.0.order_id
    }
}

impl PartialOrd for AskEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AskEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .price
            .cmp(&self.0.price)
            .then_with(|| other.0.sequence.cmp(&self.0.sequence))
    }
}

/// Pops tombstoned entries (ids no longer present in `is_live`) off the top
/// of `heap` until the live top is found or the heap is empty. Returns the
/// order id of the live top, if any. This is the one place both
/// `best_bid`/`best_ask` and the matching cross loop drain tombstones.
pub fn drain_to_live_top<E, F>(heap: &mut BinaryHeap<E>, is_live: F) -> Option<E>
where
    E: Ord + Copy,
    F: Fn(&E) -> bool,
{
    loop {
        let top = *heap.peek()?;
        if is_live(&top) {
            return Some(top);
        }
        heap.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Decimal;

    fn price(s: &str) -> Price {
        Price(Decimal::from_string(s).unwrap())
    }

    #[test]
    fn bid_entries_order_by_price_desc_then_sequence_asc() {
        let mut heap = BinaryHeap::new();
        heap.push(BidEntry::new(price("100"), 2, OrderId::new()));
        heap.push(BidEntry::new(price("105"), 5, OrderId::new()));
        heap.push(BidEntry::new(price("100"), 1, OrderId::new()));

        let top = heap.pop().unwrap();
        assert_eq!(top.0.price, price("105"));
        let second = heap.pop().unwrap();
        assert_eq!(second.0.price, price("100"));
        assert_eq!(second.0.sequence, 1);
    }

    #[test]
    fn ask_entries_order_by_price_asc_then_sequence_asc() {
        let mut heap = BinaryHeap::new();
        heap.push(AskEntry::new(price("105"), 2, OrderId::new()));
        heap.push(AskEntry::new(price("100"), 5, OrderId::new()));
        heap.push(AskEntry::new(price("100"), 1, OrderId::new()));

        let top = heap.pop().unwrap();
        assert_eq!(top.0.price, price("100"));
        assert_eq!(top.0.sequence, 1);
    }

    #[test]
    fn drain_to_live_top_discards_tombstones() {
        let mut heap = BinaryHeap::new();
        let dead = OrderId::new();
        let live = OrderId::new();
        heap.push(BidEntry::new(price("101"), 1, dead));
        heap.push(BidEntry::new(price("100"), 2, live));

        let top = drain_to_live_top(&mut heap, |e: &BidEntry| e.order_id() == live);
        assert_eq!(top.unwrap().order_id(), live);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn drain_to_live_top_on_all_tombstones_empties_heap() {
        let mut heap = BinaryHeap::new();
        heap.push(BidEntry::new(price("101"), 1, OrderId::new()));
        heap.push(BidEntry::new(price("100"), 2, OrderId::new()));

        let top = drain_to_live_top(&mut heap, |_: &BidEntry| false);
        assert!(top.is_none());
        assert!(heap.is_empty());
    }
}
