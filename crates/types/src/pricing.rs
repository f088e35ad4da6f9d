//! Pricing and settlement calculation results
//!
//! Pure value types produced by the calculators in the `pricing` crate.

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Result of pricing a rental window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    /// Rounded hours, floored at 1
    pub total_hours: u32,
    /// `price_per_hour * total_hours`
    pub sub_amount: Money,
    /// Refundable hold, a configurable multiple of the hourly rate
    pub security_deposit: Money,
}

/// Result of applying a coupon percentage to a quoted sub amount
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CouponDiscount {
    pub discount_percentage: u8,
    /// `round(sub * pct / 100)`
    pub discount_amount: Money,
    /// `max(sub - discount, 0)`
    pub main_amount: Money,
}

/// Who cancelled a booking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancellingParty {
    Renter,
    Owner,
}

/// Result of running the cancellation schedule against a booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefundBreakdown {
    /// Whole days until the trip start, floored at 0
    pub days_before_start: u32,
    /// Percentage applied to the net base amount
    pub refund_rate: u8,
    /// `floor(net_base * rate / 100)`
    pub refundable_amount: Money,
    /// Returned in full regardless of the rate
    pub security_deposit: Money,
    /// `refundable + deposit`
    pub total_refund: Money,
    /// `total - total_refund`
    pub deduction_amount: Money,
}

/// A late-return charge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LateFee {
    /// Whole hours past the scheduled end, rounded up
    pub hours_late: u32,
    pub amount: Money,
}

/// The owner's earnings calculation for one completed booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayoutBreakdown {
    /// `total_hours * price_per_hour`
    pub gross_earning: Money,
    /// Coupon cost absorbed by the owner
    pub discount_share: Money,
    /// Platform's cut of the gross
    pub platform_commission: Money,
    pub late_charge: Money,
    /// `gross - discount_share - commission + late_charge`, floored at 0
    pub payout_amount: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn refund_breakdown_carries_the_worked_example() {
        let breakdown = RefundBreakdown {
            days_before_start: 6,
            refund_rate: 70,
            refundable_amount: Money::new(168).unwrap(),
            security_deposit: Money::new(500).unwrap(),
            total_refund: Money::new(668).unwrap(),
            deduction_amount: Money::new(152).unwrap(),
        };
        assert_eq!(
            breakdown.total_refund,
            breakdown
                .refundable_amount
                .checked_add(breakdown.security_deposit)
                .unwrap()
        );
    }
}
