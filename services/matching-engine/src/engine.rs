//! Product registry
//!
//! Routes orders and cancels to the book for their symbol. The registry is
//! an ordinary value: construct one and pass it to whoever needs it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use types::errors::EngineError;
use types::ids::{OrderId, Symbol};
use types::order::{Order, OrderSnapshot, Side};

use crate::book::{AddOutcome, ProductBook};
use crate::market::MarketDataSink;

/// Main matching engine: one product book per symbol
pub struct MatchingEngine {
    /// Order books per symbol
    books: HashMap<Symbol, ProductBook>,
    /// Sink handed to every book created by this engine
    market_data: Option<Arc<dyn MarketDataSink>>,
}

impl MatchingEngine {
    pub fn new(market_data: Option<Arc<dyn MarketDataSink>>) -> Self {
        Self {
            books: HashMap::new(),
            market_data,
        }
    }

    /// Register a product and create its empty book
    pub fn add_product(&mut self, product: &str) -> Result<Symbol, EngineError> {
        let symbol = Symbol::try_new(product)?;
        if self.books.contains_key(&symbol) {
            return Err(EngineError::DuplicateProduct {
                symbol: symbol.to_string(),
            });
        }

        let mut book = ProductBook::for_symbol(symbol.clone());
        if let Some(sink) = &self.market_data {
            book = book.with_market_data(Arc::clone(sink));
        }
        self.books.insert(symbol.clone(), book);
        info!(symbol = %symbol, "Product book created");
        Ok(symbol)
    }

    /// Submit an order to the book for its symbol
    pub fn add_order(&mut self, order: Order) -> Result<AddOutcome, EngineError> {
        let Some(book) = self.books.get_mut(order.symbol()) else {
            warn!(symbol = %order.symbol(), order_id = %order.id(), "Order for unknown product");
            return Err(EngineError::UnknownProduct {
                symbol: order.symbol().to_string(),
            });
        };
        Ok(book.add(order)?)
    }

    /// Cancel the order a snapshot refers to
    pub fn cancel(&mut self, order: &OrderSnapshot) -> Result<OrderSnapshot, EngineError> {
        self.cancel_order(&order.symbol, order.side, &order.order_id)
    }

    /// Cancel a resting order by symbol, side and id
    pub fn cancel_order(
        &mut self,
        symbol: &Symbol,
        side: Side,
        order_id: &OrderId,
    ) -> Result<OrderSnapshot, EngineError> {
        let book = self.books.get_mut(symbol).ok_or_else(|| EngineError::UnknownProduct {
            symbol: symbol.to_string(),
        })?;
        Ok(book.cancel(side, order_id)?)
    }

    /// Look up a book by (unnormalized) symbol
    pub fn book(&self, product: &str) -> Option<&ProductBook> {
        let symbol = Symbol::try_new(product).ok()?;
        self.books.get(&symbol)
    }

    /// Registered symbols, sorted
    pub fn symbols(&self) -> Vec<&Symbol> {
        let mut symbols: Vec<&Symbol> = self.books.keys().collect();
        symbols.sort();
        symbols
    }

    pub fn product_count(&self) -> usize {
        self.books.len()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Display for MatchingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductBooks:")?;
        if self.books.is_empty() {
            return writeln!(f, " <Empty>");
        }
        for symbol in self.symbols() {
            if let Some(book) = self.books.get(symbol) {
                write!(f, "\n\n{}", book)?;
            }
        }
        Ok(())
    }
}
