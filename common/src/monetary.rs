//! Monetary types for minibank.
//!
//! Balances are stored as integer minor units (cents). Request amounts arrive
//! in major units and are converted exactly once, at the boundary.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use thiserror::Error;

/// Number of minor units in one major unit.
pub const MINOR_PER_MAJOR: i64 = 100;

/// Decimal places of the minor unit.
const MINOR_SCALE: u32 = 2;

/// Error converting a major-unit amount to minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AmountError {
    /// NaN or infinite input.
    #[error("amount is not a finite number")]
    NotFinite,

    /// Value does not fit in an i64 count of minor units.
    #[error("amount is out of range")]
    OutOfRange,
}

/// An amount of money in minor currency units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MinorUnits(i64);

impl MinorUnits {
    /// Zero minor units.
    pub const ZERO: MinorUnits = MinorUnits(0);

    /// Create from a raw minor-unit count.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Convert a major-unit floating amount.
    ///
    /// The float is read as its shortest decimal representation, multiplied by
    /// 100 and truncated toward zero, so `0.29` becomes 29 rather than 28.
    pub fn from_major(amount: f64) -> Result<Self, AmountError> {
        if !amount.is_finite() {
            return Err(AmountError::NotFinite);
        }
        let value = Decimal::from_f64(amount).ok_or(AmountError::OutOfRange)?;
        Self::from_major_decimal(value)
    }

    /// Convert a major-unit decimal amount, truncating toward zero.
    pub fn from_major_decimal(amount: Decimal) -> Result<Self, AmountError> {
        amount
            .checked_mul(Decimal::from(MINOR_PER_MAJOR))
            .ok_or(AmountError::OutOfRange)?
            .trunc()
            .to_i64()
            .map(Self)
            .ok_or(AmountError::OutOfRange)
    }

    /// Get the raw minor-unit count.
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Get the value in major units.
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.0, MINOR_SCALE)
    }

    /// Check if the amount is strictly positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Check if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    pub fn checked_add(self, other: MinorUnits) -> Option<MinorUnits> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl Add for MinorUnits {
    type Output = MinorUnits;

    fn add(self, other: MinorUnits) -> Self::Output {
        MinorUnits(self.0 + other.0)
    }
}

impl Sub for MinorUnits {
    type Output = MinorUnits;

    fn sub(self, other: MinorUnits) -> Self::Output {
        MinorUnits(self.0 - other.0)
    }
}

impl Neg for MinorUnits {
    type Output = MinorUnits;

    fn neg(self) -> Self::Output {
        MinorUnits(-self.0)
    }
}

impl std::iter::Sum for MinorUnits {
    fn sum<I: Iterator<Item = MinorUnits>>(iter: I) -> Self {
        iter.fold(MinorUnits::ZERO, |acc, v| acc + v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_whole_amount() {
        assert_eq!(MinorUnits::from_major(250.00).unwrap(), MinorUnits::new(25000));
        assert_eq!(MinorUnits::from_major(1000.0).unwrap(), MinorUnits::new(100000));
    }

    #[test]
    fn test_from_major_uses_decimal_representation() {
        // 0.29 * 100 in binary floating point is 28.999999999999996
        assert_eq!(MinorUnits::from_major(0.29).unwrap(), MinorUnits::new(29));
        assert_eq!(MinorUnits::from_major(19.99).unwrap(), MinorUnits::new(1999));
    }

    #[test]
    fn test_from_major_truncates_toward_zero() {
        assert_eq!(MinorUnits::from_major(10.999).unwrap(), MinorUnits::new(1099));
        assert_eq!(MinorUnits::from_major(-1.555).unwrap(), MinorUnits::new(-155));
        assert_eq!(MinorUnits::from_major(0.004).unwrap(), MinorUnits::ZERO);
    }

    #[test]
    fn test_from_major_rejects_non_finite() {
        assert_eq!(MinorUnits::from_major(f64::NAN), Err(AmountError::NotFinite));
        assert_eq!(MinorUnits::from_major(f64::INFINITY), Err(AmountError::NotFinite));
    }

    #[test]
    fn test_from_major_rejects_out_of_range() {
        assert_eq!(MinorUnits::from_major(1e300), Err(AmountError::OutOfRange));
    }

    #[test]
    fn test_display_in_major_units() {
        assert_eq!(MinorUnits::new(25000).to_string(), "250.00");
        assert_eq!(MinorUnits::new(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = MinorUnits::new(100000);
        let b = MinorUnits::new(25000);

        assert_eq!(a - b, MinorUnits::new(75000));
        assert_eq!(a + b, MinorUnits::new(125000));
        assert_eq!(-b, MinorUnits::new(-25000));
        assert_eq!(vec![a, b].into_iter().sum::<MinorUnits>(), MinorUnits::new(125000));
        assert!(MinorUnits::new(i64::MAX).checked_add(MinorUnits::new(1)).is_none());
    }
}
