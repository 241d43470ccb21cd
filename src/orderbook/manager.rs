//! Multi-symbol book registry.
//!
//! One `OrderBook` per symbol, looked up by string key, with no separate
//! trade-event router: [`crate::collaborators::EventSink`] already carries
//! trade notifications out of the matching path per call, so a second
//! routing layer would just duplicate it. The registry itself uses
//! `DashMap`, matching [`crate::breaker::group::BreakerGroup`]'s concurrent
//! get-or-create idiom rather than a `Mutex<HashMap<_>>`.

use super::book::OrderBook;
use std::sync::Arc;

/// A concurrent registry of [`OrderBook`]s keyed by symbol.
///
/// Looking up or creating a book never blocks on another symbol's book
/// lock — `DashMap` shards its internal locking independently of each
/// book's own `Mutex<BookState>`.
pub struct BookManager {
    books: dashmap::DashMap<String, Arc<OrderBook>>,
}

impl BookManager {
    /// An empty registry.
    pub fn new() -> Self {
        BookManager { books: dashmap::DashMap::new() }
    }

    /// Returns the book for `symbol`, creating an empty one if none exists
    /// yet.
    pub fn get_or_create(&self, symbol: &str) -> Arc<OrderBook> {
        if let Some(book) = self.books.get(symbol) {
            return book.clone();
        }
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(OrderBook::new(symbol)))
            .clone()
    }

    /// Returns the book for `symbol` if one has already been created.
    pub fn get(&self, symbol: &str) -> Option<Arc<OrderBook>> {
        self.books.get(symbol).map(|b| b.clone())
    }

    /// All symbols with a registered book.
    pub fn symbols(&self) -> Vec<String> {
        self.books.iter().map(|e| e.key().clone()).collect()
    }

    /// The number of registered books.
    pub fn book_count(&self) -> usize {
        self.books.len()
    }
}

impl Default for BookManager {
    fn default() -> Self {
        BookManager::new()
    }
}
