//! Owner payout calculation

use config::PolicyConfig;
use types::{Money, PayoutBreakdown, Result};

/// Computes owner earnings for a completed booking
#[derive(Debug, Clone)]
pub struct PayoutCalculator {
    platform_commission_percent: u8,
}

impl PayoutCalculator {
    pub fn new(platform_commission_percent: u8) -> Self {
        Self {
            platform_commission_percent,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self::new(config.platform_commission_percent)
    }

    /// `gross = hours * rate`; the owner absorbs the coupon cost and the
    /// platform commission, and collects the late charge:
    /// `payout = gross - discount_share - commission + late_charge`.
    pub fn compute(
        &self,
        total_hours: u32,
        price_per_hour: Money,
        coupon_discount_percentage: u8,
        late_charge: Money,
    ) -> Result<PayoutBreakdown> {
        let gross_earning = price_per_hour.checked_mul(total_hours)?;
        let discount_share = gross_earning.percent_round(coupon_discount_percentage)?;
        let platform_commission = gross_earning.percent_round(self.platform_commission_percent)?;

        let payout_amount = gross_earning
            .saturating_sub(discount_share)
            .saturating_sub(platform_commission)
            .checked_add(late_charge)?;

        Ok(PayoutBreakdown {
            gross_earning,
            discount_share,
            platform_commission,
            late_charge,
            payout_amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rupees(v: i64) -> Money {
        Money::new(v).unwrap()
    }

    #[test]
    fn payout_nets_out_coupon_and_commission() {
        let calc = PayoutCalculator::new(20);
        // 4h at 100 with a 20% coupon: gross 400, coupon share 80,
        // commission 80, payout 240
        let breakdown = calc.compute(4, rupees(100), 20, Money::ZERO).unwrap();
        assert_eq!(breakdown.gross_earning, rupees(400));
        assert_eq!(breakdown.discount_share, rupees(80));
        assert_eq!(breakdown.platform_commission, rupees(80));
        assert_eq!(breakdown.payout_amount, rupees(240));
    }

    #[test]
    fn late_charge_is_added_on_top() {
        let calc = PayoutCalculator::new(20);
        let breakdown = calc.compute(4, rupees(100), 0, rupees(200)).unwrap();
        assert_eq!(breakdown.payout_amount, rupees(520));
    }

    #[test]
    fn no_coupon_means_no_discount_share() {
        let calc = PayoutCalculator::new(25);
        let breakdown = calc.compute(10, rupees(60), 0, Money::ZERO).unwrap();
        assert_eq!(breakdown.gross_earning, rupees(600));
        assert_eq!(breakdown.discount_share, Money::ZERO);
        assert_eq!(breakdown.platform_commission, rupees(150));
        assert_eq!(breakdown.payout_amount, rupees(450));
    }

    #[test]
    fn payout_floors_at_zero() {
        // 100% coupon plus commission cannot drive the payout negative
        let calc = PayoutCalculator::new(20);
        let breakdown = calc.compute(2, rupees(100), 100, Money::ZERO).unwrap();
        assert_eq!(breakdown.payout_amount, Money::ZERO);
    }
}
