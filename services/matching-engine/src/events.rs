//! Event structures for matching engine
//!
//! Fills are returned to callers and traced; top-of-book updates go to the
//! market-data sink.

use serde::{Deserialize, Serialize};
use types::ids::{OrderId, Symbol};
use types::numeric::Price;
use types::order::{OrderSnapshot, Side, Volume};

/// Whether a fill consumed the rest of the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FillKind {
    /// Order fully filled and removed from the book
    Full,
    /// Order partially filled and still resting
    Partial,
}

/// One order's share of a trade-out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillEvent {
    /// Monotonic per-book sequence number
    pub sequence: u64,
    pub kind: FillKind,
    /// Volume moved from remaining to filled by this event
    pub volume: Volume,
    /// Order state right after the fill
    pub order: OrderSnapshot,
}

impl FillEvent {
    pub fn order_id(&self) -> OrderId {
        self.order.order_id
    }

    pub fn symbol(&self) -> &Symbol {
        &self.order.symbol
    }

    pub fn side(&self) -> Side {
        self.order.side
    }

    /// Price the order traded at (its own resting price)
    pub fn price(&self) -> Price {
        self.order.price
    }
}

/// Top of book for one symbol, published after every add/cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketUpdate {
    pub symbol: Symbol,
    pub buy_price: Option<Price>,
    pub buy_volume: u64,
    pub sell_price: Option<Price>,
    pub sell_volume: u64,
}

/// Sequence generator for fill events
#[derive(Debug, Clone)]
pub struct FillSequence {
    counter: u64,
}

impl FillSequence {
    pub fn new(start: u64) -> Self {
        Self { counter: start }
    }

    /// Take the next sequence number (monotonically increasing)
    pub fn advance(&mut self) -> u64 {
        let seq = self.counter;
        self.counter += 1;
        seq
    }

    /// Sequence number the next fill will receive
    pub fn peek(&self) -> u64 {
        self.counter
    }
}
