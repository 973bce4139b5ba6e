//! Fixed-point price type
//!
//! Prices are whole numbers of cents held in an `i64`. Nothing in this module
//! goes through floating point: parsing truncates surplus fractional digits
//! instead of rounding them, and formatting is pure integer arithmetic.

use crate::errors::PriceError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

/// Monetary value in minor currency units (cents)
///
/// Equality, ordering and hashing are all by value, so two prices with the
/// same number of cents are interchangeable as map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// Create a price from a number of cents. Never fails.
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Alias of [`Price::new`] for call sites where the unit should be explicit
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Zero price
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Value in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn add(self, other: Price) -> Price {
        Price(self.0 + other.0)
    }

    pub fn subtract(self, other: Price) -> Price {
        Price(self.0 - other.0)
    }

    pub fn multiply(self, n: i64) -> Price {
        Price(self.0 * n)
    }

    /// Add an operand that may be absent (e.g. an empty side's top of book)
    pub fn checked_add(&self, other: Option<&Price>) -> Result<Price, PriceError> {
        other.map(|p| Price::add(*self, *p)).ok_or(PriceError::NullOperand)
    }

    /// Subtract an operand that may be absent
    pub fn checked_subtract(&self, other: Option<&Price>) -> Result<Price, PriceError> {
        other.map(|p| Price::subtract(*self, *p)).ok_or(PriceError::NullOperand)
    }

    /// Compare against a comparand that may be absent
    pub fn compare_to(&self, other: Option<&Price>) -> Result<Ordering, PriceError> {
        other.map(|p| self.cmp(p)).ok_or(PriceError::NullOperand)
    }

    pub fn less_than(&self, other: &Price) -> bool {
        self < other
    }

    pub fn greater_than(&self, other: &Price) -> bool {
        self > other
    }

    pub fn less_or_equal(&self, other: &Price) -> bool {
        self <= other
    }

    pub fn greater_or_equal(&self, other: &Price) -> bool {
        self >= other
    }

    /// Format a cents value as a dollar string, e.g. `-1234` → `"$-12.34"`
    pub fn format_cents(cents: i64) -> String {
        let magnitude = cents.unsigned_abs();
        let sign = if cents < 0 { "-" } else { "" };
        format!("${}{}.{:02}", sign, magnitude / 100, magnitude % 100)
    }

    /// Parse a dollar string of the form `[$][-]d*[.cc]`
    ///
    /// Thousands separators are ignored, a single fractional digit is padded
    /// (`".8"` is 80 cents) and anything past two fractional digits is
    /// truncated (`"12.4567"` is 1245 cents).
    pub fn parse(input: &str) -> Result<Price, PriceError> {
        let invalid = |reason: &str| PriceError::InvalidFormat {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let stripped: String = input.chars().filter(|c| *c != '$' && *c != ',').collect();
        if stripped.is_empty() {
            return Err(invalid("empty"));
        }

        let (negative, body) = match stripped.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, stripped.as_str()),
        };

        let (dollars_str, cents_str) = match body.split_once('.') {
            Some((dollars, cents)) => (dollars, cents),
            None => (body, ""),
        };

        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(dollars_str) || !all_digits(cents_str) {
            return Err(invalid("not numeric"));
        }
        if dollars_str.is_empty() && cents_str.is_empty() {
            return Err(invalid("no digits"));
        }

        let dollars: i64 = if dollars_str.is_empty() {
            0
        } else {
            dollars_str.parse().map_err(|_| invalid("dollar amount out of range"))?
        };

        // Truncate, never round
        let cents: i64 = match cents_str.len() {
            0 => 0,
            1 => i64::from(cents_str.as_bytes()[0] - b'0') * 10,
            _ => cents_str[..2].parse().map_err(|_| invalid("not numeric"))?,
        };

        let magnitude = dollars
            .checked_mul(100)
            .and_then(|d| d.checked_add(cents))
            .ok_or_else(|| invalid("value out of range"))?;

        Ok(Price(if negative { -magnitude } else { magnitude }))
    }

    /// Parse a price string that may be absent at the call boundary
    pub fn parse_optional(input: Option<&str>) -> Result<Price, PriceError> {
        input.ok_or(PriceError::NullArgument).and_then(Price::parse)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Price::format_cents(self.0))
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Price::parse(s)
    }
}

impl From<i64> for Price {
    fn from(cents: i64) -> Self {
        Price(cents)
    }
}

impl Add for Price {
    type Output = Price;

    fn add(self, rhs: Price) -> Price {
        Price(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Price;

    fn sub(self, rhs: Price) -> Price {
        Price(self.0 - rhs.0)
    }
}

impl Mul<i64> for Price {
    type Output = Price;

    fn mul(self, rhs: i64) -> Price {
        Price(self.0 * rhs)
    }
}
