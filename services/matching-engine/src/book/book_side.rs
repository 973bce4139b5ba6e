//! One side (bids or asks) of a product's order book
//!
//! Price levels live in a BTreeMap for deterministic ordered iteration. The
//! side tag decides which end is "best": the highest price for BUY, the
//! lowest for SELL. An id → price index makes cancel a level lookup instead
//! of a scan over every level.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info};
use types::errors::BookError;
use types::ids::{OrderId, Symbol};
use types::numeric::Price;
use types::order::{Order, OrderSnapshot, Side, Volume};

use super::price_level::PriceLevel;
use crate::events::{FillEvent, FillKind, FillSequence};

/// Bid or ask side of a single product's book
#[derive(Debug, Clone)]
pub struct ProductBookSide {
    symbol: Symbol,
    side: Side,
    /// Price levels keyed by price; never holds an empty level
    levels: BTreeMap<Price, PriceLevel>,
    /// Resting order id → price of the level holding it
    index: HashMap<OrderId, Price>,
}

impl ProductBookSide {
    /// Create a new empty book side
    pub fn new(symbol: Symbol, side: Side) -> Self {
        Self {
            symbol,
            side,
            levels: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Append an order to the level for its price
    ///
    /// Returns the snapshot taken on entry. The order must belong to this
    /// side and symbol, have volume remaining, and not already be resting.
    pub fn add(&mut self, order: Order) -> Result<OrderSnapshot, BookError> {
        if order.side() != self.side || order.symbol() != &self.symbol {
            return Err(BookError::WrongBook {
                order_id: order.id().to_string(),
                expected: format!("{} {}", self.symbol, self.side),
            });
        }
        if order.is_terminal() {
            return Err(BookError::PreconditionViolation {
                reason: format!("order {} has no remaining volume", order.id()),
            });
        }
        if self.index.contains_key(&order.id()) {
            return Err(BookError::PreconditionViolation {
                reason: format!("order {} is already resting", order.id()),
            });
        }

        let snapshot = order.snapshot();
        debug!(
            symbol = %self.symbol,
            side = %self.side,
            order_id = %snapshot.order_id,
            price = %snapshot.price,
            volume = snapshot.remaining_volume,
            "Order added"
        );

        self.index.insert(snapshot.order_id, snapshot.price);
        self.levels.entry(snapshot.price).or_default().push_back(order);
        Ok(snapshot)
    }

    /// Remove an order and cancel its remaining volume
    pub fn cancel(&mut self, order_id: &OrderId) -> Result<OrderSnapshot, BookError> {
        let not_found = || BookError::NotFound {
            order_id: order_id.to_string(),
        };

        let price = *self.index.get(order_id).ok_or_else(not_found)?;
        let level = self.levels.get_mut(&price).ok_or_else(not_found)?;
        let mut order = level.remove(order_id).ok_or_else(not_found)?;

        // Remove empty price levels to keep book clean
        if level.is_empty() {
            self.levels.remove(&price);
        }
        self.index.remove(order_id);

        let cancelled = order.cancel();
        debug!(
            symbol = %self.symbol,
            side = %self.side,
            order_id = %order_id,
            cancelled,
            "Order cancelled"
        );
        Ok(order.snapshot())
    }

    /// Most aggressive resting price, if any
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::BUY => self.levels.keys().next_back().copied(),
            Side::SELL => self.levels.keys().next().copied(),
        }
    }

    /// Total remaining volume at the best price, 0 when empty
    pub fn best_volume(&self) -> u64 {
        self.best_price()
            .and_then(|price| self.levels.get(&price))
            .map_or(0, PriceLevel::total_volume)
    }

    /// Consume exactly `volume` from the queue at `price`, oldest order first
    ///
    /// Fails without touching the book if no orders rest at `price` or if
    /// fewer than `volume` units rest there.
    pub fn trade_out(
        &mut self,
        price: Price,
        volume: u64,
        sequence: &mut FillSequence,
    ) -> Result<Vec<FillEvent>, BookError> {
        let level = self.levels.get_mut(&price).ok_or_else(|| BookError::PreconditionViolation {
            reason: format!("no {} orders resting at {}", self.side, price),
        })?;
        if volume > level.total_volume() {
            return Err(BookError::PreconditionViolation {
                reason: format!(
                    "cannot trade out {} at {}: only {} resting",
                    volume,
                    price,
                    level.total_volume()
                ),
            });
        }

        let mut fills = Vec::new();
        let mut outstanding = volume;
        while outstanding > 0 {
            let front_remaining = match level.front() {
                Some(order) => u64::from(order.remaining_volume()),
                None => break,
            };
            // Bounded by the front order's remaining volume, so it fits
            let take = outstanding.min(front_remaining) as Volume;
            let Some((snapshot, completed)) = level.fill_front(take) else {
                break;
            };
            outstanding -= u64::from(take);

            let kind = if completed {
                self.index.remove(&snapshot.order_id);
                FillKind::Full
            } else {
                FillKind::Partial
            };
            info!(
                target: "matching_engine::fills",
                symbol = %self.symbol,
                side = %self.side,
                order_id = %snapshot.order_id,
                user = %snapshot.user,
                price = %snapshot.price,
                volume = take,
                remaining = snapshot.remaining_volume,
                "{}",
                match kind {
                    FillKind::Full => "FILL",
                    FillKind::Partial => "PARTIAL FILL",
                }
            );
            fills.push(FillEvent {
                sequence: sequence.advance(),
                kind,
                volume: take,
                order: snapshot,
            });
        }

        if level.is_empty() {
            self.levels.remove(&price);
        }
        Ok(fills)
    }

    /// Top `depth` levels as (price, volume), best first
    pub fn depth(&self, depth: usize) -> Vec<(Price, u64)> {
        self.levels_by_priority()
            .take(depth)
            .map(|(price, level)| (*price, level.total_volume()))
            .collect()
    }

    /// Current snapshot of a resting order
    pub fn snapshot_of(&self, order_id: &OrderId) -> Option<OrderSnapshot> {
        let price = self.index.get(order_id)?;
        self.levels.get(price)?.get(order_id).map(Order::snapshot)
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    /// Check if the side has no resting orders
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Get the total number of price levels
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Get the total number of resting orders
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    fn levels_by_priority(&self) -> Box<dyn Iterator<Item = (&Price, &PriceLevel)> + '_> {
        match self.side {
            Side::BUY => Box::new(self.levels.iter().rev()),
            Side::SELL => Box::new(self.levels.iter()),
        }
    }
}

impl fmt::Display for ProductBookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Side: {}", self.side)?;
        if self.is_empty() {
            return write!(f, "\n\t<Empty>");
        }
        for (price, level) in self.levels_by_priority() {
            write!(f, "\n\tPrice: {}", price)?;
            for order in level.iter() {
                write!(f, "\n\t\t{}", order)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn symbol() -> Symbol {
        Symbol::try_new("WMT").unwrap()
    }

    fn create_test_order(side: Side, price: i64, volume: Volume) -> Order {
        Order::new("ANN", "WMT", side, Price::new(price), volume).unwrap()
    }

    #[test]
    fn test_add_creates_level() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);
        let snapshot = book.add(create_test_order(Side::BUY, 1000, 50)).unwrap();

        assert_eq!(snapshot.remaining_volume, 50);
        assert_eq!(book.level_count(), 1);
        assert_eq!(book.order_count(), 1);
        assert!(book.contains(&snapshot.order_id));
    }

    #[test]
    fn test_add_rejects_other_side_or_symbol() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);

        let err = book.add(create_test_order(Side::SELL, 1000, 5)).unwrap_err();
        assert!(matches!(err, BookError::WrongBook { .. }));

        let other = Order::new("ANN", "TGT", Side::BUY, Price::new(1000), 5).unwrap();
        assert!(matches!(book.add(other), Err(BookError::WrongBook { .. })));
        assert!(book.is_empty());
    }

    #[test]
    fn test_add_rejects_terminal_and_duplicate_orders() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);

        let mut cancelled = create_test_order(Side::BUY, 1000, 5);
        cancelled.cancel();
        assert!(matches!(book.add(cancelled), Err(BookError::PreconditionViolation { .. })));

        let order = create_test_order(Side::BUY, 1000, 5);
        book.add(order.clone()).unwrap();
        assert!(matches!(book.add(order), Err(BookError::PreconditionViolation { .. })));
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_buy_best_price_is_highest() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);
        book.add(create_test_order(Side::BUY, 1000, 10)).unwrap();
        book.add(create_test_order(Side::BUY, 1010, 20)).unwrap();
        book.add(create_test_order(Side::BUY, 990, 15)).unwrap();

        assert_eq!(book.best_price(), Some(Price::new(1010)));
        assert_eq!(book.best_volume(), 20);
    }

    #[test]
    fn test_sell_best_price_is_lowest() {
        let mut book = ProductBookSide::new(symbol(), Side::SELL);
        book.add(create_test_order(Side::SELL, 1000, 10)).unwrap();
        book.add(create_test_order(Side::SELL, 1010, 20)).unwrap();
        book.add(create_test_order(Side::SELL, 990, 15)).unwrap();

        assert_eq!(book.best_price(), Some(Price::new(990)));
        assert_eq!(book.best_volume(), 15);
    }

    #[test]
    fn test_empty_side() {
        let book = ProductBookSide::new(symbol(), Side::SELL);
        assert_eq!(book.best_price(), None);
        assert_eq!(book.best_volume(), 0);
        assert!(book.depth(5).is_empty());
    }

    #[test]
    fn test_best_volume_sums_level() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);
        book.add(create_test_order(Side::BUY, 1000, 50)).unwrap();
        book.add(create_test_order(Side::BUY, 1000, 60)).unwrap();

        assert_eq!(book.level_count(), 1);
        assert_eq!(book.best_volume(), 110);
    }

    #[test]
    fn test_cancel_removes_order_and_level() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);
        let snapshot = book.add(create_test_order(Side::BUY, 1000, 50)).unwrap();

        let cancelled = book.cancel(&snapshot.order_id).unwrap();
        assert_eq!(cancelled.remaining_volume, 0);
        assert_eq!(cancelled.cancelled_volume, 50);
        assert!(cancelled.check_invariant());
        assert!(book.is_empty());
        assert_eq!(book.best_price(), None);
    }

    #[test]
    fn test_cancel_twice_is_not_found() {
        let mut book = ProductBookSide::new(symbol(), Side::SELL);
        let snapshot = book.add(create_test_order(Side::SELL, 1000, 50)).unwrap();
        book.add(create_test_order(Side::SELL, 1000, 10)).unwrap();

        book.cancel(&snapshot.order_id).unwrap();
        let err = book.cancel(&snapshot.order_id).unwrap_err();
        assert!(matches!(err, BookError::NotFound { .. }));
        assert_eq!(book.best_volume(), 10);
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_cancel_unknown_id() {
        let mut book = ProductBookSide::new(symbol(), Side::SELL);
        assert!(matches!(book.cancel(&OrderId::new()), Err(BookError::NotFound { .. })));
    }

    #[test]
    fn test_trade_out_fifo_with_partial() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);
        let first = book.add(create_test_order(Side::BUY, 1000, 50)).unwrap();
        let second = book.add(create_test_order(Side::BUY, 1000, 60)).unwrap();
        let mut seq = FillSequence::new(1);

        let fills = book.trade_out(Price::new(1000), 70, &mut seq).unwrap();

        assert_eq!(fills.len(), 2);
        assert_eq!(fills[0].order_id(), first.order_id);
        assert_eq!(fills[0].kind, FillKind::Full);
        assert_eq!(fills[0].volume, 50);
        assert_eq!(fills[0].sequence, 1);
        assert_eq!(fills[1].order_id(), second.order_id);
        assert_eq!(fills[1].kind, FillKind::Partial);
        assert_eq!(fills[1].volume, 20);
        assert_eq!(fills[1].sequence, 2);

        assert!(!book.contains(&first.order_id));
        let resting = book.snapshot_of(&second.order_id).unwrap();
        assert_eq!(resting.remaining_volume, 40);
        assert_eq!(resting.filled_volume, 20);
        assert_eq!(book.best_volume(), 40);
    }

    #[test]
    fn test_trade_out_exact_level_removes_level() {
        let mut book = ProductBookSide::new(symbol(), Side::SELL);
        book.add(create_test_order(Side::SELL, 995, 30)).unwrap();
        book.add(create_test_order(Side::SELL, 995, 40)).unwrap();
        book.add(create_test_order(Side::SELL, 1005, 5)).unwrap();

        let fills = book.trade_out(Price::new(995), 70, &mut FillSequence::new(0)).unwrap();

        assert!(fills.iter().all(|f| f.kind == FillKind::Full));
        assert_eq!(book.level_count(), 1);
        assert_eq!(book.best_price(), Some(Price::new(1005)));
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn test_trade_out_preconditions_leave_book_untouched() {
        let mut book = ProductBookSide::new(symbol(), Side::SELL);
        book.add(create_test_order(Side::SELL, 995, 30)).unwrap();
        let mut seq = FillSequence::new(0);

        let err = book.trade_out(Price::new(990), 10, &mut seq).unwrap_err();
        assert!(matches!(err, BookError::PreconditionViolation { .. }));

        let err = book.trade_out(Price::new(995), 31, &mut seq).unwrap_err();
        assert!(matches!(err, BookError::PreconditionViolation { .. }));

        assert_eq!(book.best_volume(), 30);
        assert_eq!(seq.peek(), 0);
    }

    #[test]
    fn test_depth_in_priority_order() {
        let mut book = ProductBookSide::new(symbol(), Side::BUY);
        book.add(create_test_order(Side::BUY, 1000, 10)).unwrap();
        book.add(create_test_order(Side::BUY, 1020, 20)).unwrap();
        book.add(create_test_order(Side::BUY, 990, 15)).unwrap();
        book.add(create_test_order(Side::BUY, 1020, 5)).unwrap();

        let depth = book.depth(2);
        assert_eq!(depth, vec![(Price::new(1020), 25), (Price::new(1000), 10)]);
    }

    #[test]
    fn test_display() {
        let mut book = ProductBookSide::new(symbol(), Side::SELL);
        assert_eq!(book.to_string(), "Side: SELL\n\t<Empty>");

        book.add(create_test_order(Side::SELL, 1000, 10)).unwrap();
        let text = book.to_string();
        assert!(text.contains("Price: $10.00"));
        assert!(text.contains("ANN order: SELL WMT at $10.00"));
    }
}
