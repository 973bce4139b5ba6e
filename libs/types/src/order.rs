//! Order lifecycle types
//!
//! An [`Order`] carries four volumes that always satisfy
//! `original = remaining + filled + cancelled`. Only two transitions move
//! volume: [`Order::fill`] and [`Order::cancel`].

use crate::errors::OrderError;
use crate::ids::{OrderId, Symbol, UserId};
use crate::numeric::Price;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order volume in whole units
pub type Volume = u32;

/// Exclusive upper bound on an order's original volume
pub const MAX_ORDER_VOLUME: Volume = 10_000;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Buy order (bid)
    BUY,
    /// Sell order (ask)
    SELL,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::BUY => f.write_str("BUY"),
            Side::SELL => f.write_str("SELL"),
        }
    }
}

/// Order status, derived from the four volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// Resting, nothing filled yet
    PENDING,
    /// Some volume filled, some still resting
    PARTIAL,
    /// Completely filled (terminal)
    FILLED,
    /// Remainder cancelled, possibly after partial fills (terminal)
    CANCELED,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::FILLED | OrderStatus::CANCELED)
    }

    fn derive(remaining: Volume, filled: Volume, cancelled: Volume) -> Self {
        if remaining == 0 {
            if cancelled > 0 {
                OrderStatus::CANCELED
            } else {
                OrderStatus::FILLED
            }
        } else if filled > 0 {
            OrderStatus::PARTIAL
        } else {
            OrderStatus::PENDING
        }
    }
}

/// Live order record owned by the book
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    order_id: OrderId,
    user: UserId,
    symbol: Symbol,
    side: Side,
    price: Price,
    original_volume: Volume,
    remaining_volume: Volume,
    filled_volume: Volume,
    cancelled_volume: Volume,
    created_at: i64, // Unix nanos
}

impl Order {
    /// Validate the inputs and create a new resting order
    ///
    /// The user handle must be 3 letters, the product 1 to 5 letters, digits
    /// or periods, and the volume strictly between 0 and [`MAX_ORDER_VOLUME`].
    pub fn new(
        user: &str,
        product: &str,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<Self, OrderError> {
        let user = UserId::try_new(user)?;
        let symbol = Symbol::try_new(product)?;
        Self::with_ids(user, symbol, side, price, volume)
    }

    /// Create an order from an already validated user and symbol
    pub fn with_ids(
        user: UserId,
        symbol: Symbol,
        side: Side,
        price: Price,
        volume: Volume,
    ) -> Result<Self, OrderError> {
        if volume == 0 || volume >= MAX_ORDER_VOLUME {
            return Err(OrderError::validation(
                "volume",
                format!("must be between 1 and {}", MAX_ORDER_VOLUME - 1),
            ));
        }

        Ok(Self {
            order_id: OrderId::new(),
            user,
            symbol,
            side,
            price,
            original_volume: volume,
            remaining_volume: volume,
            filled_volume: 0,
            cancelled_volume: 0,
            created_at: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
        })
    }

    pub fn id(&self) -> OrderId {
        self.order_id
    }

    pub fn user(&self) -> &UserId {
        &self.user
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> Price {
        self.price
    }

    pub fn original_volume(&self) -> Volume {
        self.original_volume
    }

    pub fn remaining_volume(&self) -> Volume {
        self.remaining_volume
    }

    pub fn filled_volume(&self) -> Volume {
        self.filled_volume
    }

    pub fn cancelled_volume(&self) -> Volume {
        self.cancelled_volume
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn status(&self) -> OrderStatus {
        OrderStatus::derive(self.remaining_volume, self.filled_volume, self.cancelled_volume)
    }

    /// True once no volume remains on the book
    pub fn is_terminal(&self) -> bool {
        self.remaining_volume == 0
    }

    /// Check volume invariant: remaining + filled + cancelled = original
    pub fn check_invariant(&self) -> bool {
        self.remaining_volume + self.filled_volume + self.cancelled_volume == self.original_volume
    }

    /// Move `volume` from remaining to filled
    pub fn fill(&mut self, volume: Volume) -> Result<(), OrderError> {
        if volume > self.remaining_volume {
            return Err(OrderError::InvalidFill {
                requested: volume,
                remaining: self.remaining_volume,
            });
        }
        self.filled_volume += volume;
        self.remaining_volume -= volume;
        debug_assert!(self.check_invariant(), "Invariant violated after fill");
        Ok(())
    }

    /// Cancel all remaining volume, returning how much was cancelled
    ///
    /// Cancelling an order with nothing remaining is a no-op.
    pub fn cancel(&mut self) -> Volume {
        let cancelled = self.remaining_volume;
        self.cancelled_volume += cancelled;
        self.remaining_volume = 0;
        cancelled
    }

    /// Point-in-time copy of this order
    pub fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.order_id,
            user: self.user.clone(),
            symbol: self.symbol.clone(),
            side: self.side,
            price: self.price,
            original_volume: self.original_volume,
            remaining_volume: self.remaining_volume,
            filled_volume: self.filled_volume,
            cancelled_volume: self.cancelled_volume,
            status: self.status(),
            created_at: self.created_at,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.snapshot().fmt(f)
    }
}

/// Immutable copy of an order's state, safe to hand out and retain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order_id: OrderId,
    pub user: UserId,
    pub symbol: Symbol,
    pub side: Side,
    pub price: Price,
    pub original_volume: Volume,
    pub remaining_volume: Volume,
    pub filled_volume: Volume,
    pub cancelled_volume: Volume,
    pub status: OrderStatus,
    pub created_at: i64,
}

impl OrderSnapshot {
    pub fn check_invariant(&self) -> bool {
        self.remaining_volume + self.filled_volume + self.cancelled_volume == self.original_volume
    }
}

impl fmt::Display for OrderSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} order: {} {} at {}, Orig Vol: {}, Rem Vol: {}, Fill Vol: {}, CXL Vol: {}, ID: {}",
            self.user,
            self.side,
            self.symbol,
            self.price,
            self.original_volume,
            self.remaining_volume,
            self.filled_volume,
            self.cancelled_volume,
            self.order_id
        )
    }
}
