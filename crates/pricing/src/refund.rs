//! Cancellation refund schedule
//!
//! Renter-initiated cancellations refund a percentage of the net base
//! amount driven by how many whole days remain until the trip start; the
//! security deposit is always returned in full. Owner-initiated
//! cancellations refund everything regardless of timing.

use chrono::{DateTime, Utc};
use config::{PolicyConfig, RefundTier};
use types::{Money, RefundBreakdown, Result};

/// Step function from days-before-start to refund percentage
#[derive(Debug, Clone)]
pub struct RefundSchedule {
    /// Tiers with strictly descending thresholds, validated at config load
    tiers: Vec<RefundTier>,
}

impl RefundSchedule {
    pub fn new(tiers: Vec<RefundTier>) -> Self {
        Self { tiers }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.refund_tiers.clone())
    }

    /// Whole days until the trip start: `ceil((start - now) / 1 day)`,
    /// floored at 0.
    pub fn days_before_start(start: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
        let seconds = (start - now).num_seconds();
        if seconds <= 0 {
            return 0;
        }
        ((seconds + 86_399) / 86_400) as u32
    }

    /// Refund percentage for the given days-before-start. Thresholds are
    /// inclusive lower bounds: exactly 7 days out still earns the top tier.
    pub fn rate_for(&self, days_before_start: u32) -> u8 {
        self.tiers
            .iter()
            .find(|tier| days_before_start >= tier.min_days_before_start)
            .map(|tier| tier.refund_percent)
            .unwrap_or(0)
    }

    /// Compute the renter-initiated cancellation breakdown.
    ///
    /// `net_base = (total - deposit) - coupon_discount`,
    /// `refundable = floor(net_base * rate / 100)`; the deposit rides on top
    /// untouched by the rate.
    pub fn renter_cancellation(
        &self,
        total_amount: Money,
        security_deposit: Money,
        coupon_discount: Money,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RefundBreakdown> {
        let days = Self::days_before_start(start, now);
        let rate = self.rate_for(days);

        let net_base = total_amount
            .checked_sub(security_deposit)?
            .saturating_sub(coupon_discount);
        let refundable_amount = net_base.percent_floor(rate)?;
        let total_refund = refundable_amount.checked_add(security_deposit)?;
        let deduction_amount = total_amount.saturating_sub(total_refund);

        Ok(RefundBreakdown {
            days_before_start: days,
            refund_rate: rate,
            refundable_amount,
            security_deposit,
            total_refund,
            deduction_amount,
        })
    }

    /// Owner-initiated cancellation: 100% of main amount plus deposit,
    /// independent of timing.
    pub fn owner_cancellation(
        &self,
        total_amount: Money,
        security_deposit: Money,
        start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<RefundBreakdown> {
        let refundable_amount = total_amount.checked_sub(security_deposit)?;

        Ok(RefundBreakdown {
            days_before_start: Self::days_before_start(start, now),
            refund_rate: 100,
            refundable_amount,
            security_deposit,
            total_refund: total_amount,
            deduction_amount: Money::ZERO,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn rupees(v: i64) -> Money {
        Money::new(v).unwrap()
    }

    fn schedule() -> RefundSchedule {
        RefundSchedule::from_config(&PolicyConfig::default())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn rate_table_boundaries() {
        let schedule = schedule();
        let cases = [
            (8, 90),
            (7, 90), // inclusive lower bound
            (6, 70),
            (5, 70),
            (4, 50),
            (3, 50),
            (2, 30),
            (1, 30),
            (0, 10),
        ];
        for (days, expected) in cases {
            assert_eq!(schedule.rate_for(days), expected, "days = {}", days);
        }
    }

    #[test]
    fn days_before_start_rounds_up_and_floors_at_zero() {
        let start = now() + Duration::hours(25);
        assert_eq!(RefundSchedule::days_before_start(start, now()), 2);

        let start = now() + Duration::hours(24);
        assert_eq!(RefundSchedule::days_before_start(start, now()), 1);

        let start = now() + Duration::hours(3);
        assert_eq!(RefundSchedule::days_before_start(start, now()), 1);

        let start = now() - Duration::hours(1);
        assert_eq!(RefundSchedule::days_before_start(start, now()), 0);
    }

    #[test]
    fn worked_example_six_days_out() {
        // 100/hr for 4h with a 20% coupon: main 320, deposit 500, total 820.
        // Six days out -> 70%: net = (820-500)-80 = 240, refundable = 168,
        // refund = 668, deduction = 152.
        let schedule = schedule();
        let start = now() + Duration::days(6);
        let breakdown = schedule
            .renter_cancellation(rupees(820), rupees(500), rupees(80), start, now())
            .unwrap();

        assert_eq!(breakdown.refund_rate, 70);
        assert_eq!(breakdown.refundable_amount, rupees(168));
        assert_eq!(breakdown.total_refund, rupees(668));
        assert_eq!(breakdown.deduction_amount, rupees(152));
    }

    #[test]
    fn same_day_cancellation_keeps_the_deposit_whole() {
        let schedule = schedule();
        let start = now() + Duration::hours(2);
        let breakdown = schedule
            .renter_cancellation(rupees(820), rupees(500), rupees(80), start, now())
            .unwrap();

        assert_eq!(breakdown.refund_rate, 10);
        assert_eq!(breakdown.refundable_amount, rupees(24));
        assert_eq!(breakdown.security_deposit, rupees(500));
        assert_eq!(breakdown.total_refund, rupees(524));
    }

    #[test]
    fn owner_cancellation_refunds_everything() {
        let schedule = schedule();
        for hours_out in [1, 48, 24 * 30] {
            let start = now() + Duration::hours(hours_out);
            let breakdown = schedule
                .owner_cancellation(rupees(820), rupees(500), start, now())
                .unwrap();
            assert_eq!(breakdown.total_refund, rupees(820));
            assert_eq!(breakdown.refundable_amount, rupees(320));
            assert_eq!(breakdown.deduction_amount, Money::ZERO);
        }
    }

    #[test]
    fn coupon_discount_cannot_push_net_base_negative() {
        let schedule = schedule();
        let start = now() + Duration::days(8);
        // Discount larger than the non-deposit part of the total
        let breakdown = schedule
            .renter_cancellation(rupees(600), rupees(500), rupees(300), start, now())
            .unwrap();
        assert_eq!(breakdown.refundable_amount, Money::ZERO);
        assert_eq!(breakdown.total_refund, rupees(500));
    }
}
