//! Matching logic module
//!
//! Implements the price-time priority matching loop

pub mod crossing;
pub mod executor;

pub use crossing::{can_match, is_crossed};
pub use executor::MatchExecutor;
