//! Types library for the order matching engine
//!
//! Core value types shared by the engine and its collaborators.
//!
//! # Modules
//! - `ids`: Identifiers and validated names (OrderId, UserId, Symbol)
//! - `numeric`: Integer-cents `Price`
//! - `order`: Order volume state machine and snapshots
//! - `errors`: Error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::errors::*;
}
