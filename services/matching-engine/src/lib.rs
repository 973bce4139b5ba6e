//! Matching Engine Service
//!
//! Continuous double-auction matching with price-time priority.
//!
//! **Key Invariants:**
//! - Better prices trade first; within a price, earlier orders trade first
//! - Conservation of volume: `original = remaining + filled + cancelled`
//! - No empty price levels are ever kept
//! - After every add, the book is uncrossed
//!
//! A [`ProductBook`] is a single-owner value: all mutation goes through
//! `&mut self`, so one book is one serialized unit of work. Serve several
//! symbols concurrently by giving each book its own owner.

pub mod book;
pub mod matching;
pub mod engine;
pub mod events;
pub mod market;

pub use book::{AddOutcome, ProductBook, ProductBookSide};
pub use engine::MatchingEngine;
pub use events::{FillEvent, FillKind, MarketUpdate};
pub use market::{
    CurrentMarketObserver, CurrentMarketPublisher, CurrentMarketSide, CurrentMarketTracker, MarketDataSink,
};
