//! Two-sided order book for a single product
//!
//! Every add runs the matching loop to a fixed point before returning, so
//! the book is never left crossed. Cancels never trigger matching since
//! removing volume cannot create a cross.

use std::fmt;
use std::sync::Arc;
use types::errors::{BookError, OrderError};
use types::ids::{OrderId, Symbol};
use types::numeric::Price;
use types::order::{Order, OrderSnapshot, Side};

use super::book_side::ProductBookSide;
use crate::events::{FillEvent, MarketUpdate};
use crate::market::MarketDataSink;
use crate::matching::MatchExecutor;

/// Result of adding an order to a product book
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// State of the added order after matching
    pub snapshot: OrderSnapshot,
    /// Fills produced by the add, in execution order (both sides)
    pub fills: Vec<FillEvent>,
}

/// Order book for a single symbol
pub struct ProductBook {
    symbol: Symbol,
    buy_side: ProductBookSide,
    sell_side: ProductBookSide,
    executor: MatchExecutor,
    market_data: Option<Arc<dyn MarketDataSink>>,
}

impl ProductBook {
    /// Create an empty book for a product symbol
    pub fn new(product: &str) -> Result<Self, OrderError> {
        Ok(Self::for_symbol(Symbol::try_new(product)?))
    }

    /// Create an empty book for an already validated symbol
    pub fn for_symbol(symbol: Symbol) -> Self {
        Self {
            buy_side: ProductBookSide::new(symbol.clone(), Side::BUY),
            sell_side: ProductBookSide::new(symbol.clone(), Side::SELL),
            symbol,
            executor: MatchExecutor::default(),
            market_data: None,
        }
    }

    /// Attach a sink that receives the top of book after every add/cancel
    pub fn with_market_data(mut self, sink: Arc<dyn MarketDataSink>) -> Self {
        self.market_data = Some(sink);
        self
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn buy_side(&self) -> &ProductBookSide {
        &self.buy_side
    }

    pub fn sell_side(&self) -> &ProductBookSide {
        &self.sell_side
    }

    pub fn side(&self, side: Side) -> &ProductBookSide {
        match side {
            Side::BUY => &self.buy_side,
            Side::SELL => &self.sell_side,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut ProductBookSide {
        match side {
            Side::BUY => &mut self.buy_side,
            Side::SELL => &mut self.sell_side,
        }
    }

    /// Add an order, match, and publish the new top of book
    ///
    /// The returned snapshot reflects the order after matching: it may
    /// already be partially or completely filled.
    pub fn add(&mut self, order: Order) -> Result<AddOutcome, BookError> {
        let order_id = order.id();
        let side = order.side();

        let entry_snapshot = self.side_mut(side).add(order)?;
        let fills = self.executor.execute(&mut self.buy_side, &mut self.sell_side)?;

        let snapshot = self
            .side(side)
            .snapshot_of(&order_id)
            .or_else(|| {
                fills
                    .iter()
                    .rev()
                    .find(|fill| fill.order_id() == order_id)
                    .map(|fill| fill.order.clone())
            })
            .unwrap_or(entry_snapshot);

        self.publish_market();
        Ok(AddOutcome { snapshot, fills })
    }

    /// Cancel a resting order on `side`
    ///
    /// Publishes the top of book whether or not the order was found.
    pub fn cancel(&mut self, side: Side, order_id: &OrderId) -> Result<OrderSnapshot, BookError> {
        let result = self.side_mut(side).cancel(order_id);
        self.publish_market();
        result
    }

    /// Best price and volume on both sides
    pub fn top_of_book(&self) -> MarketUpdate {
        MarketUpdate {
            symbol: self.symbol.clone(),
            buy_price: self.buy_side.best_price(),
            buy_volume: self.buy_side.best_volume(),
            sell_price: self.sell_side.best_price(),
            sell_volume: self.sell_side.best_volume(),
        }
    }

    /// Top `depth` levels of each side as (bids, asks), best first
    pub fn depth(&self, depth: usize) -> (Vec<(Price, u64)>, Vec<(Price, u64)>) {
        (self.buy_side.depth(depth), self.sell_side.depth(depth))
    }

    /// Current snapshot of a resting order on either side
    pub fn snapshot_of(&self, order_id: &OrderId) -> Option<OrderSnapshot> {
        self.buy_side
            .snapshot_of(order_id)
            .or_else(|| self.sell_side.snapshot_of(order_id))
    }

    fn publish_market(&self) {
        if let Some(sink) = &self.market_data {
            sink.update_market(&self.top_of_book());
        }
    }
}

impl fmt::Display for ProductBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Product: {}\n{}\n{}", self.symbol, self.buy_side, self.sell_side)
    }
}
