//! Randomized order traffic
//!
//! Drives a [`MatchingEngine`] with a seeded stream of adds and cancels from
//! the configured users. Each step picks a user; with probability
//! `add_ratio` it submits a random order, otherwise it cancels that user's
//! oldest order that still has volume. Rejections are logged and counted.

use matching_engine::{
    CurrentMarketObserver, CurrentMarketPublisher, CurrentMarketTracker, FillEvent, MarketDataSink,
    MatchingEngine,
};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::errors::EngineError;
use types::ids::Symbol;
use types::numeric::Price;
use types::order::{Order, Side, Volume};

use crate::config::{SimConfig, SubscriptionConfig};
use crate::error::SimError;
use crate::users::{User, UserRegistry};

const BPS: i64 = 10_000;

/// Counters for one simulation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimReport {
    pub steps: usize,
    pub adds: usize,
    pub cancels: usize,
    pub rejections: usize,
    /// Fill events, one per order touched by a trade
    pub fills: usize,
    /// Volume traded (each trade counted once, not per side)
    pub filled_volume: u64,
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Steps: {}, Adds: {}, Cancels: {}, Rejections: {}, Fills: {}, Filled Vol: {}",
            self.steps, self.adds, self.cancels, self.rejections, self.fills, self.filled_volume
        )
    }
}

pub struct TrafficSim {
    config: SimConfig,
    engine: MatchingEngine,
    users: UserRegistry,
    publisher: Arc<CurrentMarketPublisher>,
    base_prices: HashMap<Symbol, i64>,
    /// Products in config order, so draws do not depend on map iteration
    products: Vec<Symbol>,
    rng: ChaCha8Rng,
    report: SimReport,
}

impl TrafficSim {
    /// Build the engine, products and users, and apply the subscriptions
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;

        let publisher = Arc::new(CurrentMarketPublisher::new());
        let tracker: Arc<dyn MarketDataSink> = Arc::new(CurrentMarketTracker::new(Arc::clone(&publisher)));
        let mut engine = MatchingEngine::new(Some(tracker));

        let mut base_prices = HashMap::new();
        let mut products = Vec::with_capacity(config.products.len());
        for product in &config.products {
            let symbol = engine.add_product(&product.symbol)?;
            base_prices.insert(symbol.clone(), product.base_price_cents);
            products.push(symbol);
        }

        let users = UserRegistry::new(config.users.iter().map(String::as_str))?;

        let sim = Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            engine,
            users,
            publisher,
            base_prices,
            products,
            report: SimReport::default(),
        };

        for subscription in sim.config.subscriptions.clone() {
            let (symbol, user) = sim.resolve(&subscription)?;
            sim.publisher.subscribe(symbol, user);
        }
        for subscription in sim.config.unsubscriptions.clone() {
            let (symbol, user) = sim.resolve(&subscription)?;
            sim.publisher.unsubscribe(&symbol, &user);
        }

        info!(
            products = sim.products.len(),
            users = sim.users.len(),
            seed = sim.config.seed,
            "Traffic simulation ready"
        );
        Ok(sim)
    }

    fn resolve(
        &self,
        subscription: &SubscriptionConfig,
    ) -> Result<(Symbol, Arc<dyn CurrentMarketObserver>), SimError> {
        let symbol = Symbol::try_new(&subscription.symbol).map_err(EngineError::from)?;
        if !self.base_prices.contains_key(&symbol) {
            return Err(EngineError::UnknownProduct {
                symbol: symbol.to_string(),
            }
            .into());
        }
        let user = self.users.get(&subscription.user).ok_or_else(|| EngineError::UnknownUser {
            user: subscription.user.clone(),
        })?;
        let observer: Arc<dyn CurrentMarketObserver> = Arc::clone(user) as Arc<dyn CurrentMarketObserver>;
        Ok((symbol, observer))
    }

    pub fn engine(&self) -> &MatchingEngine {
        &self.engine
    }

    pub fn users(&self) -> &UserRegistry {
        &self.users
    }

    pub fn publisher(&self) -> &Arc<CurrentMarketPublisher> {
        &self.publisher
    }

    pub fn report(&self) -> &SimReport {
        &self.report
    }

    /// Run every configured iteration and return the totals
    pub fn run(&mut self) -> SimReport {
        for step in 1..=self.config.iterations {
            self.step(step);
        }
        info!(report = %self.report, "Traffic simulation finished");
        self.report.clone()
    }

    /// Perform one add-or-cancel step
    pub fn step(&mut self, step: usize) {
        self.report.steps += 1;
        let Some(user) = self.users.random_user(&mut self.rng).cloned() else {
            return;
        };

        if self.rng.gen_bool(self.config.add_ratio) {
            self.add_random_order(step, &user);
        } else {
            self.cancel_oldest(step, &user);
        }
    }

    fn add_random_order(&mut self, step: usize, user: &User) {
        let symbol = self.products[self.rng.gen_range(0..self.products.len())].clone();
        let side = if self.rng.gen_bool(0.5) { Side::BUY } else { Side::SELL };
        let volume = self.random_volume();
        let price = self.random_price(&symbol, side);

        let order = match Order::with_ids(user.user_id().clone(), symbol, side, price, volume) {
            Ok(order) => order,
            Err(err) => {
                self.reject(step, &err.into());
                return;
            }
        };
        debug!(step, order = %order, "ADD");

        match self.engine.add_order(order) {
            Ok(outcome) => {
                self.report.adds += 1;
                self.record_fills(&outcome.fills);
                user.add_order(outcome.snapshot);
            }
            Err(err) => self.reject(step, &err),
        }
    }

    fn cancel_oldest(&mut self, step: usize, user: &User) {
        let Some(order) = user.order_with_remaining() else {
            return;
        };
        match self.engine.cancel(&order) {
            Ok(cancelled) => {
                debug!(
                    step,
                    side = %cancelled.side,
                    order_id = %cancelled.order_id,
                    cancelled_volume = cancelled.cancelled_volume,
                    "CANCEL"
                );
                self.report.cancels += 1;
                user.add_order(cancelled);
            }
            Err(err) => self.reject(step, &err),
        }
    }

    /// Hand every fill to the user that owns the order
    fn record_fills(&mut self, fills: &[FillEvent]) {
        for fill in fills {
            self.report.fills += 1;
            if fill.side() == Side::BUY {
                self.report.filled_volume += u64::from(fill.volume);
            }
            if let Err(err) = self.users.add_to_user(&fill.order.user, fill.order.clone()) {
                warn!(error = %err, order_id = %fill.order_id(), "Fill for unregistered user");
            }
        }
    }

    fn reject(&mut self, step: usize, err: &EngineError) {
        self.report.rejections += 1;
        warn!(step, error = %err, "Order rejected");
    }

    /// Volume in the configured range, rounded to the nearest multiple of 5
    fn random_volume(&mut self) -> Volume {
        let raw = self.rng.gen_range(self.config.min_volume..=self.config.max_volume);
        ((raw + 2) / 5 * 5).max(5)
    }

    /// Price near the product's base, snapped to the tick
    ///
    /// Buys start `start_point` below base and sells `start_point` above,
    /// each moved toward (and possibly past) the base by up to `price_width`.
    fn random_price(&mut self, symbol: &Symbol, side: Side) -> Price {
        let base = self.base_prices.get(symbol).copied().unwrap_or_default();
        let start = i64::from(self.config.start_point_bps);
        let width = base * i64::from(self.config.price_width_bps) / BPS;
        let variance = if width > 0 { self.rng.gen_range(0..=width) } else { 0 };

        let cents = match side {
            Side::BUY => base * (BPS - start) / BPS + variance,
            Side::SELL => base * (BPS + start) / BPS - variance,
        };
        let tick = self.config.tick_cents;
        Price::new(((cents + tick / 2) / tick * tick).max(tick))
    }

    /// Drop every configured subscription
    pub fn tear_down(&self) {
        for subscription in &self.config.subscriptions {
            if let Ok((symbol, user)) = self.resolve(subscription) {
                self.publisher.unsubscribe(&symbol, &user);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProductConfig;
    use proptest::prelude::*;

    fn small_config(seed: u64) -> SimConfig {
        SimConfig {
            iterations: 300,
            seed,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_same_seed_same_report() {
        let a = TrafficSim::new(small_config(11)).unwrap().run();
        let b = TrafficSim::new(small_config(11)).unwrap().run();
        assert_eq!(a, b);
        assert_eq!(a.steps, 300);
        assert!(a.adds > 0);
    }

    #[test]
    fn test_subscriptions_applied() {
        let sim = TrafficSim::new(SimConfig::default()).unwrap();
        let count = |s: &str| sim.publisher().subscriber_count(&Symbol::try_new(s).unwrap());

        // BOB drops TGT before the run
        assert_eq!(count("WMT"), 3);
        assert_eq!(count("TGT"), 2);
        assert_eq!(count("AMZN"), 1);
        assert_eq!(count("TSLA"), 2);

        sim.tear_down();
        assert_eq!(count("WMT"), 0);
        assert_eq!(count("TSLA"), 0);
    }

    #[test]
    fn test_unknown_user_in_subscription() {
        let mut config = SimConfig::default();
        config.subscriptions.push(SubscriptionConfig::new("ZZZ", "WMT"));
        assert!(matches!(TrafficSim::new(config), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_unknown_product_in_subscription() {
        let mut config = SimConfig::default();
        config.subscriptions.push(SubscriptionConfig::new("ANN", "IBM"));
        assert!(matches!(TrafficSim::new(config), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_user_rejected() {
        let mut config = SimConfig::default();
        config.users.push("ann".to_string());
        assert!(matches!(
            TrafficSim::new(config),
            Err(SimError::Engine(EngineError::DuplicateUser { .. }))
        ));
    }

    #[test]
    fn test_random_price_band() {
        let mut sim = TrafficSim::new(SimConfig {
            products: vec![ProductConfig::new("WMT", 10_000)],
            subscriptions: Vec::new(),
            unsubscriptions: Vec::new(),
            ..SimConfig::default()
        })
        .unwrap();
        let wmt = Symbol::try_new("WMT").unwrap();

        for _ in 0..500 {
            let buy = sim.random_price(&wmt, Side::BUY).cents();
            let sell = sim.random_price(&wmt, Side::SELL).cents();
            assert!((9_900..=10_100).contains(&buy), "buy {}", buy);
            assert!((9_900..=10_100).contains(&sell), "sell {}", sell);
            assert_eq!(buy % 5, 0);
            assert_eq!(sell % 5, 0);
        }
    }

    #[test]
    fn test_random_volume_multiple_of_five() {
        let mut sim = TrafficSim::new(SimConfig::default()).unwrap();
        for _ in 0..500 {
            let volume = sim.random_volume();
            assert_eq!(volume % 5, 0);
            assert!((25..=325).contains(&volume));
        }
    }

    #[test]
    fn test_cancel_only_run_with_no_orders() {
        let report = TrafficSim::new(SimConfig {
            iterations: 50,
            add_ratio: 0.0,
            ..SimConfig::default()
        })
        .unwrap()
        .run();
        assert_eq!(report.adds, 0);
        assert_eq!(report.cancels, 0);
        assert_eq!(report.rejections, 0);
    }

    fn single_product(base: i64, min_volume: u32, max_volume: u32, seed: u64) -> TrafficSim {
        TrafficSim::new(SimConfig {
            seed,
            min_volume,
            max_volume,
            products: vec![ProductConfig::new("WMT", base)],
            subscriptions: Vec::new(),
            unsubscriptions: Vec::new(),
            ..SimConfig::default()
        })
        .unwrap()
    }

    proptest! {
        #[test]
        fn prop_volume_rounded_within_range(
            min_volume in 5u32..2000,
            span in 0u32..2000,
            seed in any::<u64>(),
        ) {
            let max_volume = min_volume + span;
            let mut sim = single_product(10_000, min_volume, max_volume, seed);
            for _ in 0..50 {
                let volume = sim.random_volume();
                prop_assert_eq!(volume % 5, 0);
                prop_assert!(volume >= 5);
                prop_assert!(volume + 2 >= min_volume && volume <= max_volume + 2, "volume {}", volume);
                prop_assert!(volume < types::order::MAX_ORDER_VOLUME);
            }
        }

        #[test]
        fn prop_price_on_tick_near_base(base in 100i64..1_000_000, seed in any::<u64>()) {
            let mut sim = single_product(base, 25, 325, seed);
            let wmt = Symbol::try_new("WMT").unwrap();
            // Band is base ± 1%, widened by rounding and one tick of snapping
            let low = base * 9_900 / 10_000 - 5;
            let high = base * 10_100 / 10_000 + 5;
            for side in [Side::BUY, Side::SELL] {
                let cents = sim.random_price(&wmt, side).cents();
                prop_assert_eq!(cents % 5, 0);
                prop_assert!(cents > 0);
                prop_assert!((low..=high).contains(&cents), "{} {} outside {}..={}", side, cents, low, high);
            }
        }
    }
}
