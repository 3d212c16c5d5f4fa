//! Minor-unit money type
//!
//! Expense values are stored as integer minor currency units (cents) to
//! avoid floating-point drift, and divided by 100 only at presentation
//! time. Division by 100 is exact for any value built under this invariant.

use rust_decimal::Decimal;
use std::fmt;

/// A validated, non-negative amount of minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MinorUnits(i64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("Value must not be negative (got {0})")]
    Negative(i64),
}

impl MinorUnits {
    /// Create a new amount.
    ///
    /// # Errors
    /// - `MoneyError::Negative` if `cents < 0`
    pub fn new(cents: i64) -> Result<Self, MoneyError> {
        if cents < 0 {
            return Err(MoneyError::Negative(cents));
        }
        Ok(Self(cents))
    }

    /// The raw minor-unit value as stored.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The major-unit decimal presented to clients (cents / 100, exact).
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}
