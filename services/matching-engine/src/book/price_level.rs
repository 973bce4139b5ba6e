//! Price level implementation with FIFO queue
//!
//! A price level contains all orders at a specific price point.
//! Orders are maintained in FIFO (First-In-First-Out) order to enforce
//! time priority.

use std::collections::VecDeque;
use types::ids::OrderId;
use types::order::{Order, OrderSnapshot, Volume};

/// A price level containing orders at a specific price
///
/// Owns the resting orders and keeps a running total of their remaining
/// volume so top-of-book volume is O(1).
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// Queue of orders at this price level (FIFO order)
    orders: VecDeque<Order>,
    /// Total remaining volume available at this level
    total_volume: u64,
}

impl PriceLevel {
    /// Create a new empty price level
    pub fn new() -> Self {
        Self {
            orders: VecDeque::new(),
            total_volume: 0,
        }
    }

    /// Insert an order at the back of the queue (time priority)
    pub fn push_back(&mut self, order: Order) {
        self.total_volume += u64::from(order.remaining_volume());
        self.orders.push_back(order);
    }

    /// Remove an order from the queue by OrderId
    ///
    /// Returns the removed order, or None if not found
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        let position = self.orders.iter().position(|order| &order.id() == order_id)?;
        let order = self.orders.remove(position)?;
        self.total_volume -= u64::from(order.remaining_volume());
        Some(order)
    }

    /// Peek at the front order without removing it
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Fill the front order for `volume`, popping it once nothing remains
    ///
    /// Returns the post-fill snapshot and whether the order left the queue,
    /// or None when the level is empty or `volume` exceeds the front order.
    pub fn fill_front(&mut self, volume: Volume) -> Option<(OrderSnapshot, bool)> {
        let front = self.orders.front_mut()?;
        front.fill(volume).ok()?;
        self.total_volume -= u64::from(volume);

        let snapshot = front.snapshot();
        let completed = front.is_terminal();
        if completed {
            self.orders.pop_front();
        }
        Some((snapshot, completed))
    }

    /// Look up an order at this level
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|order| &order.id() == order_id)
    }

    /// Iterate orders oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Check if the price level is empty
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Get the total remaining volume at this price level
    pub fn total_volume(&self) -> u64 {
        self.total_volume
    }

    /// Get the number of orders at this level
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}
