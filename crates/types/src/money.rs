//! Monetary amounts in major currency units
//!
//! All internal arithmetic stays in whole major units (rupees in the
//! observed deployment); conversion to minor units happens exactly once,
//! at the payment gateway boundary.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WheelbaseError};

/// A non-negative monetary amount in major currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Create an amount from major units, rejecting negative values.
    pub fn new(major_units: i64) -> Result<Self> {
        if major_units < 0 {
            return Err(WheelbaseError::Validation(format!(
                "monetary amount cannot be negative: {}",
                major_units
            )));
        }
        Ok(Money(major_units))
    }

    pub fn major_units(&self) -> i64 {
        self.0
    }

    /// Minor units for the gateway boundary (x100).
    pub fn to_minor_units(&self) -> i64 {
        self.0 * 100
    }

    /// Reconstruct from gateway minor units, truncating sub-unit noise.
    pub fn from_minor_units(minor: i64) -> Result<Self> {
        Money::new(minor / 100)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Result<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(WheelbaseError::CalculationOverflow)
    }

    /// Subtraction floored at zero, per the `max(x - y, 0)` rules in the
    /// pricing and refund formulas.
    pub fn saturating_sub(self, other: Money) -> Money {
        Money((self.0 - other.0).max(0))
    }

    /// Exact subtraction, rejecting results below zero.
    pub fn checked_sub(self, other: Money) -> Result<Money> {
        if other.0 > self.0 {
            return Err(WheelbaseError::Validation(format!(
                "monetary subtraction would go negative: {} - {}",
                self.0, other.0
            )));
        }
        Ok(Money(self.0 - other.0))
    }

    pub fn checked_mul(self, factor: u32) -> Result<Money> {
        self.0
            .checked_mul(i64::from(factor))
            .map(Money)
            .ok_or(WheelbaseError::CalculationOverflow)
    }

    /// `round(amount * percent / 100)` with half-up integer rounding.
    pub fn percent_round(self, percent: u8) -> Result<Money> {
        let scaled = self
            .0
            .checked_mul(i64::from(percent))
            .ok_or(WheelbaseError::CalculationOverflow)?;
        Ok(Money((scaled + 50) / 100))
    }

    /// `floor(amount * percent / 100)`.
    pub fn percent_floor(self, percent: u8) -> Result<Money> {
        let scaled = self
            .0
            .checked_mul(i64::from(percent))
            .ok_or(WheelbaseError::CalculationOverflow)?;
        Ok(Money(scaled / 100))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_amounts() {
        assert!(Money::new(-1).is_err());
        assert!(Money::new(0).is_ok());
    }

    #[test]
    fn minor_unit_conversion() {
        let m = Money::new(820).unwrap();
        assert_eq!(m.to_minor_units(), 82_000);
        assert_eq!(Money::from_minor_units(82_000).unwrap(), m);
    }

    #[test]
    fn percent_round_half_up() {
        let sub = Money::new(400).unwrap();
        assert_eq!(sub.percent_round(20).unwrap(), Money::new(80).unwrap());

        // 5% of 30 = 1.5, rounds up
        let m = Money::new(30).unwrap();
        assert_eq!(m.percent_round(5).unwrap(), Money::new(2).unwrap());
    }

    #[test]
    fn percent_floor_truncates() {
        // floor(240 * 70 / 100) = 168
        let net = Money::new(240).unwrap();
        assert_eq!(net.percent_floor(70).unwrap(), Money::new(168).unwrap());

        // floor(99 * 50 / 100) = 49
        let m = Money::new(99).unwrap();
        assert_eq!(m.percent_floor(50).unwrap(), Money::new(49).unwrap());
    }

    #[test]
    fn saturating_sub_floors_at_zero() {
        let a = Money::new(100).unwrap();
        let b = Money::new(150).unwrap();
        assert_eq!(a.saturating_sub(b), Money::ZERO);
        assert_eq!(b.saturating_sub(a), Money::new(50).unwrap());
    }

    #[test]
    fn checked_sub_rejects_negative_result() {
        let a = Money::new(100).unwrap();
        let b = Money::new(150).unwrap();
        assert!(a.checked_sub(b).is_err());
        assert_eq!(b.checked_sub(a).unwrap(), Money::new(50).unwrap());
    }
}
