//! Simulation configuration
//!
//! Plain serde structs with defaults matching the stock four-product,
//! five-user run. Prices are integer cents; price offsets are basis points
//! of the product's base price.

use serde::{Deserialize, Serialize};
use std::path::Path;
use types::order::MAX_ORDER_VOLUME;

use crate::error::SimError;

/// A product traded in the simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductConfig {
    pub symbol: String,
    /// Reference price in cents that order prices are drawn around
    pub base_price_cents: i64,
}

impl ProductConfig {
    pub fn new(symbol: &str, base_price_cents: i64) -> Self {
        Self {
            symbol: symbol.to_string(),
            base_price_cents,
        }
    }
}

/// Market-data subscription of one user to one product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub user: String,
    pub symbol: String,
}

impl SubscriptionConfig {
    pub fn new(user: &str, symbol: &str) -> Self {
        Self {
            user: user.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// Configuration for a traffic simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of add/cancel steps
    pub iterations: usize,
    /// RNG seed; equal seeds give equal order flow
    pub seed: u64,
    /// Probability that a step adds an order rather than cancelling one
    pub add_ratio: f64,
    /// Width of the random price band (in bps of base price)
    pub price_width_bps: u32,
    /// Offset of the band's starting point from base price (in bps)
    pub start_point_bps: u32,
    /// Prices are snapped to a multiple of this many cents
    pub tick_cents: i64,
    pub min_volume: u32,
    pub max_volume: u32,
    pub products: Vec<ProductConfig>,
    pub users: Vec<String>,
    pub subscriptions: Vec<SubscriptionConfig>,
    /// Subscriptions dropped after setup, before the first step
    pub unsubscriptions: Vec<SubscriptionConfig>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            seed: 42,
            add_ratio: 0.9,
            price_width_bps: 200,
            start_point_bps: 100,
            tick_cents: 5,
            min_volume: 25,
            max_volume: 325,
            products: vec![
                ProductConfig::new("WMT", 14098),
                ProductConfig::new("TGT", 17476),
                ProductConfig::new("AMZN", 10211),
                ProductConfig::new("TSLA", 19681),
            ],
            users: ["ANN", "BOB", "CAT", "DOG", "EGG"].iter().map(|u| u.to_string()).collect(),
            subscriptions: vec![
                SubscriptionConfig::new("ANN", "WMT"),
                SubscriptionConfig::new("ANN", "TGT"),
                SubscriptionConfig::new("BOB", "TGT"),
                SubscriptionConfig::new("BOB", "TSLA"),
                SubscriptionConfig::new("CAT", "AMZN"),
                SubscriptionConfig::new("CAT", "TGT"),
                SubscriptionConfig::new("CAT", "WMT"),
                SubscriptionConfig::new("DOG", "TSLA"),
                SubscriptionConfig::new("EGG", "WMT"),
            ],
            unsubscriptions: vec![SubscriptionConfig::new("BOB", "TGT")],
        }
    }
}

impl SimConfig {
    /// Load a config from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SimError> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges that the generator relies on
    pub fn validate(&self) -> Result<(), SimError> {
        if !(0.0..=1.0).contains(&self.add_ratio) {
            return Err(invalid(format!("add_ratio {} not in [0, 1]", self.add_ratio)));
        }
        if self.tick_cents <= 0 {
            return Err(invalid("tick_cents must be positive"));
        }
        if self.min_volume == 0 || self.min_volume > self.max_volume {
            return Err(invalid(format!(
                "volume range {}..={} is empty or starts at 0",
                self.min_volume, self.max_volume
            )));
        }
        // Rounding to a multiple of 5 may add up to 2 units
        if self.max_volume.saturating_add(2) >= MAX_ORDER_VOLUME {
            return Err(invalid(format!("max_volume must be below {}", MAX_ORDER_VOLUME - 2)));
        }
        if self.start_point_bps >= 10_000 {
            return Err(invalid("start_point_bps must be below 10000"));
        }
        if self.products.is_empty() {
            return Err(invalid("at least one product is required"));
        }
        if let Some(product) = self.products.iter().find(|p| p.base_price_cents <= 0) {
            return Err(invalid(format!("base price of {} must be positive", product.symbol)));
        }
        if self.users.is_empty() {
            return Err(invalid("at least one user is required"));
        }
        for subscription in self.subscriptions.iter().chain(&self.unsubscriptions) {
            if !self.products.iter().any(|p| p.symbol.eq_ignore_ascii_case(&subscription.symbol)) {
                return Err(invalid(format!(
                    "{} subscribes to unconfigured product {}",
                    subscription.user, subscription.symbol
                )));
            }
            if !self.users.iter().any(|u| u.eq_ignore_ascii_case(&subscription.user)) {
                return Err(invalid(format!(
                    "subscription to {} names unconfigured user {}",
                    subscription.symbol, subscription.user
                )));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> SimError {
    SimError::InvalidConfig(reason.into())
}
