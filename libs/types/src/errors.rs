//! Error types for the matching engine
//!
//! Comprehensive error taxonomy using thiserror

use thiserror::Error;

/// Top-level engine error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Price error: {0}")]
    Price(#[from] PriceError),

    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    #[error("Book error: {0}")]
    Book(#[from] BookError),

    #[error("Unknown product: {symbol}")]
    UnknownProduct { symbol: String },

    #[error("Product already exists: {symbol}")]
    DuplicateProduct { symbol: String },

    #[error("Unknown user: {user}")]
    UnknownUser { user: String },

    #[error("User already exists: {user}")]
    DuplicateUser { user: String },
}

/// Price construction and arithmetic errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Invalid price argument: null")]
    NullArgument,

    #[error("Invalid price operand: null")]
    NullOperand,

    #[error("Invalid price format {input:?}: {reason}")]
    InvalidFormat { input: String, reason: String },
}

/// Order-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("Invalid {field} argument: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("Invalid fill volume {requested}: cannot exceed the remaining volume {remaining}")]
    InvalidFill { requested: u32, remaining: u32 },
}

impl OrderError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        OrderError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Name of the offending field, if this is a validation failure
    pub fn field(&self) -> Option<&'static str> {
        match self {
            OrderError::Validation { field, .. } => Some(field),
            OrderError::InvalidFill { .. } => None,
        }
    }
}

/// Order book errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    #[error("Order not found: {order_id}")]
    NotFound { order_id: String },

    /// An internal invariant was breached (e.g. trading out more volume than rests at a price)
    #[error("Precondition violated: {reason}")]
    PreconditionViolation { reason: String },

    #[error("Order {order_id} does not belong in the {expected} book")]
    WrongBook { order_id: String, expected: String },

    #[error("Order error: {0}")]
    Order(#[from] OrderError),
}
