//! Current-market tracking and publishing
//!
//! The book hands a [`MarketUpdate`] to a [`MarketDataSink`] after every add
//! and cancel. [`CurrentMarketTracker`] is the stock sink: it logs the
//! market line and forwards it to a [`CurrentMarketPublisher`], which fans
//! out to observers subscribed per symbol. The book knows nothing about
//! subscribers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};
use types::ids::Symbol;
use types::numeric::Price;

use crate::events::MarketUpdate;

/// Receives top-of-book updates from product books
pub trait MarketDataSink: Send + Sync {
    fn update_market(&self, update: &MarketUpdate);
}

/// Top-of-book price and volume for one side
///
/// An empty side is reported as $0.00 with zero volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentMarketSide {
    pub price: Price,
    pub volume: u64,
}

impl CurrentMarketSide {
    pub fn new(price: Option<Price>, volume: u64) -> Self {
        Self {
            price: price.unwrap_or_default(),
            volume,
        }
    }
}

impl fmt::Display for CurrentMarketSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.price, self.volume)
    }
}

/// Subscriber to current-market publications
pub trait CurrentMarketObserver: Send + Sync {
    fn update_current_market(&self, symbol: &Symbol, buy: &CurrentMarketSide, sell: &CurrentMarketSide);
}

type ObserverList = Vec<Arc<dyn CurrentMarketObserver>>;

/// Per-symbol fan-out of current-market updates
#[derive(Default)]
pub struct CurrentMarketPublisher {
    filters: RwLock<HashMap<Symbol, ObserverList>>,
}

impl CurrentMarketPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, symbol: Symbol, observer: Arc<dyn CurrentMarketObserver>) {
        debug!(symbol = %symbol, "Observer subscribed");
        let mut filters = self.filters.write().unwrap_or_else(PoisonError::into_inner);
        filters.entry(symbol).or_default().push(observer);
    }

    /// Remove an observer; drops the symbol entry once nobody is left
    pub fn unsubscribe(&self, symbol: &Symbol, observer: &Arc<dyn CurrentMarketObserver>) {
        let mut filters = self.filters.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(observers) = filters.get_mut(symbol) {
            observers.retain(|existing| !same_observer(existing, observer));
            if observers.is_empty() {
                filters.remove(symbol);
            }
            debug!(symbol = %symbol, "Observer unsubscribed");
        }
    }

    /// Number of observers subscribed to `symbol`
    pub fn subscriber_count(&self, symbol: &Symbol) -> usize {
        let filters = self.filters.read().unwrap_or_else(PoisonError::into_inner);
        filters.get(symbol).map_or(0, Vec::len)
    }

    /// Notify every observer of `symbol`, in subscription order
    pub fn accept_current_market(&self, symbol: &Symbol, buy: &CurrentMarketSide, sell: &CurrentMarketSide) {
        // Release the lock before calling out so observers may (un)subscribe
        let observers: ObserverList = {
            let filters = self.filters.read().unwrap_or_else(PoisonError::into_inner);
            match filters.get(symbol) {
                Some(observers) => observers.clone(),
                None => return,
            }
        };
        for observer in observers {
            observer.update_current_market(symbol, buy, sell);
        }
    }
}

fn same_observer(a: &Arc<dyn CurrentMarketObserver>, b: &Arc<dyn CurrentMarketObserver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Market-data sink that logs the current market and publishes it
pub struct CurrentMarketTracker {
    publisher: Arc<CurrentMarketPublisher>,
}

impl CurrentMarketTracker {
    pub fn new(publisher: Arc<CurrentMarketPublisher>) -> Self {
        Self { publisher }
    }

    pub fn publisher(&self) -> &Arc<CurrentMarketPublisher> {
        &self.publisher
    }

    /// Spread between the two tops; zero when either side is empty
    pub fn market_width(update: &MarketUpdate) -> Price {
        update
            .sell_price
            .and_then(|sell| sell.checked_subtract(update.buy_price.as_ref()).ok())
            .unwrap_or_default()
    }
}

impl MarketDataSink for CurrentMarketTracker {
    fn update_market(&self, update: &MarketUpdate) {
        let width = Self::market_width(update);
        let buy = CurrentMarketSide::new(update.buy_price, update.buy_volume);
        let sell = CurrentMarketSide::new(update.sell_price, update.sell_volume);

        info!(
            target: "matching_engine::market",
            symbol = %update.symbol,
            "Current Market: {} {} - {} [{}]",
            update.symbol,
            buy,
            sell,
            width
        );
        self.publisher.accept_current_market(&update.symbol, &buy, &sell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        seen: Mutex<Vec<(String, CurrentMarketSide, CurrentMarketSide)>>,
    }

    impl CurrentMarketObserver for RecordingObserver {
        fn update_current_market(&self, symbol: &Symbol, buy: &CurrentMarketSide, sell: &CurrentMarketSide) {
            self.seen.lock().unwrap().push((symbol.to_string(), *buy, *sell));
        }
    }

    fn symbol(s: &str) -> Symbol {
        Symbol::try_new(s).unwrap()
    }

    fn update(buy: Option<i64>, sell: Option<i64>) -> MarketUpdate {
        MarketUpdate {
            symbol: symbol("WMT"),
            buy_price: buy.map(Price::new),
            buy_volume: if buy.is_some() { 50 } else { 0 },
            sell_price: sell.map(Price::new),
            sell_volume: if sell.is_some() { 20 } else { 0 },
        }
    }

    #[test]
    fn test_market_side_display() {
        assert_eq!(CurrentMarketSide::new(Some(Price::new(14098)), 50).to_string(), "$140.98x50");
        assert_eq!(CurrentMarketSide::new(None, 0).to_string(), "$0.00x0");
    }

    #[test]
    fn test_market_width() {
        assert_eq!(CurrentMarketTracker::market_width(&update(Some(1000), Some(1025))), Price::new(25));
        assert_eq!(CurrentMarketTracker::market_width(&update(None, Some(1025))), Price::zero());
        assert_eq!(CurrentMarketTracker::market_width(&update(Some(1000), None)), Price::zero());
    }

    #[test]
    fn test_publisher_filters_by_symbol() {
        let publisher = CurrentMarketPublisher::new();
        let wmt = Arc::new(RecordingObserver::default());
        let tgt = Arc::new(RecordingObserver::default());
        publisher.subscribe(symbol("WMT"), wmt.clone());
        publisher.subscribe(symbol("TGT"), tgt.clone());

        let side = CurrentMarketSide::new(Some(Price::new(100)), 1);
        publisher.accept_current_market(&symbol("WMT"), &side, &side);

        assert_eq!(wmt.seen.lock().unwrap().len(), 1);
        assert!(tgt.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_removes_empty_symbol() {
        let publisher = CurrentMarketPublisher::new();
        let first: Arc<dyn CurrentMarketObserver> = Arc::new(RecordingObserver::default());
        let second: Arc<dyn CurrentMarketObserver> = Arc::new(RecordingObserver::default());
        publisher.subscribe(symbol("WMT"), first.clone());
        publisher.subscribe(symbol("WMT"), second.clone());

        publisher.unsubscribe(&symbol("WMT"), &first);
        assert_eq!(publisher.subscriber_count(&symbol("WMT")), 1);

        publisher.unsubscribe(&symbol("WMT"), &second);
        assert_eq!(publisher.subscriber_count(&symbol("WMT")), 0);

        // Unknown symbol is a no-op
        publisher.unsubscribe(&symbol("AMZN"), &second);
    }

    #[test]
    fn test_tracker_forwards_to_publisher() {
        let publisher = Arc::new(CurrentMarketPublisher::new());
        let observer = Arc::new(RecordingObserver::default());
        publisher.subscribe(symbol("WMT"), observer.clone());

        let tracker = CurrentMarketTracker::new(publisher);
        tracker.update_market(&update(Some(1000), None));

        let seen = observer.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, "WMT");
        assert_eq!(seen[0].1, CurrentMarketSide::new(Some(Price::new(1000)), 50));
        assert_eq!(seen[0].2, CurrentMarketSide::new(None, 0));
    }
}
