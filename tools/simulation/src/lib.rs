//! Traffic Simulation
//!
//! Randomized, seeded order flow against the matching engine.
//!
//! # Modules
//! - `config` - Simulation parameters, JSON loadable
//! - `users` - Users, their orders and the current markets they observe
//! - `traffic` - The add/cancel loop and its report
//! - `error` - Simulation error type

pub mod config;
pub mod error;
pub mod traffic;
pub mod users;

pub use config::SimConfig;
pub use error::SimError;
pub use traffic::{SimReport, TrafficSim};
pub use users::{User, UserRegistry};
