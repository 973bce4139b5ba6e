//! Identifier types for engine entities
//!
//! Order ids use UUID v7 so they sort by creation time. User handles and
//! product symbols are validated, upper-cased strings.

use crate::errors::OrderError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an order
///
/// Assigned once at order creation and stable for the order's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Create a new OrderId with current timestamp
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Three-letter user handle, e.g. `ANN`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Validate and normalize a user handle
    ///
    /// Must be exactly 3 ASCII letters; stored upper-case.
    pub fn try_new(user: &str) -> Result<Self, OrderError> {
        if user.chars().count() != 3 {
            return Err(OrderError::validation("user", "must be 3 characters in length"));
        }
        if !user.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(OrderError::validation("user", "must only contain letter characters"));
        }
        Ok(Self(user.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Product symbol, e.g. `WMT` or `BRK.B`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Validate and normalize a product symbol
    ///
    /// 1 to 5 characters drawn from ASCII letters, digits and `.`; stored upper-case.
    pub fn try_new(product: &str) -> Result<Self, OrderError> {
        let len = product.chars().count();
        if len == 0 || len > 5 {
            return Err(OrderError::validation("product", "length must be 1 to 5 characters"));
        }
        if !product.chars().all(|c| c.is_ascii_alphanumeric() || c == '.') {
            return Err(OrderError::validation(
                "product",
                "must only contain letters, numbers, or a period",
            ));
        }
        Ok(Self(product.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Symbol {
    type Error = OrderError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::try_new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_creation() {
        let id1 = OrderId::new();
        let id2 = OrderId::new();
        assert_ne!(id1, id2, "OrderIds should be unique");
    }

    #[test]
    fn test_order_id_serialization() {
        let id = OrderId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: OrderId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }

    #[test]
    fn test_user_id_normalized() {
        let user = UserId::try_new("ann").unwrap();
        assert_eq!(user.as_str(), "ANN");
    }

    #[test]
    fn test_user_id_rejects_bad_handles() {
        for bad in ["", "AN", "ANNE", "A1N", "A N", "ÄNN"] {
            let err = UserId::try_new(bad).unwrap_err();
            assert_eq!(err.field(), Some("user"), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn test_symbol_normalized() {
        assert_eq!(Symbol::try_new("wmt").unwrap().as_str(), "WMT");
        assert_eq!(Symbol::try_new("brk.b").unwrap().as_str(), "BRK.B");
        assert_eq!(Symbol::try_new("A").unwrap().as_str(), "A");
    }

    #[test]
    fn test_symbol_rejects_bad_products() {
        for bad in ["", "TOOLONG", "AB-C", "A/B", "A B"] {
            let err = Symbol::try_new(bad).unwrap_err();
            assert_eq!(err.field(), Some("product"), "expected rejection for {bad:?}");
        }
    }

    #[test]
    fn test_symbol_try_from() {
        let symbol: Symbol = "tsla".try_into().unwrap();
        assert_eq!(symbol.to_string(), "TSLA");
    }
}
