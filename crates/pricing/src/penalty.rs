//! Penalty amount calculations

use chrono::{DateTime, Duration, Utc};
use config::PolicyConfig;
use types::{LateFee, Money, Result};

/// Computes the amounts charged by the penalty engine
#[derive(Debug, Clone)]
pub struct PenaltyPolicy {
    owner_cancel_penalty_percent: u8,
    late_fee_per_hour: Money,
    late_grace: Duration,
}

impl PenaltyPolicy {
    pub fn new(
        owner_cancel_penalty_percent: u8,
        late_fee_per_hour: Money,
        late_grace_minutes: u32,
    ) -> Self {
        Self {
            owner_cancel_penalty_percent,
            late_fee_per_hour,
            late_grace: Duration::minutes(i64::from(late_grace_minutes)),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Result<Self> {
        Ok(Self::new(
            config.owner_cancel_penalty_percent,
            config.late_fee_per_hour()?,
            config.late_grace_minutes,
        ))
    }

    /// Overage tolerated before a drop counts as late.
    pub fn late_grace(&self) -> Duration {
        self.late_grace
    }

    /// Penalty charged to an owner who cancels a confirmed booking, as a
    /// percentage of the booking total.
    pub fn owner_cancellation_amount(&self, booking_total: Money) -> Result<Money> {
        booking_total.percent_round(self.owner_cancel_penalty_percent)
    }

    /// Late-return charge: `late_fee_per_hour * hours_late`, where
    /// `hours_late = ceil(drop - scheduled_end)`. Nothing is charged while
    /// the overage stays inside the grace period.
    pub fn late_fee(
        &self,
        scheduled_end: DateTime<Utc>,
        drop_time: DateTime<Utc>,
    ) -> Result<Option<LateFee>> {
        let overage = drop_time - scheduled_end;
        if overage <= self.late_grace {
            return Ok(None);
        }

        let seconds = overage.num_seconds();
        let hours_late = ((seconds + 3599) / 3600) as u32;
        let amount = self.late_fee_per_hour.checked_mul(hours_late)?;

        Ok(Some(LateFee { hours_late, amount }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rupees(v: i64) -> Money {
        Money::new(v).unwrap()
    }

    fn policy() -> PenaltyPolicy {
        PenaltyPolicy::new(10, rupees(100), 60)
    }

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 14, 0, 0).unwrap()
    }

    #[test]
    fn owner_cancellation_is_a_percentage_of_the_total() {
        assert_eq!(policy().owner_cancellation_amount(rupees(820)).unwrap(), rupees(82));
        // Config decides the knob; 15 is the other observed call site
        let steep = PenaltyPolicy::new(15, rupees(100), 60);
        assert_eq!(steep.owner_cancellation_amount(rupees(820)).unwrap(), rupees(123));
    }

    #[test]
    fn drops_inside_grace_are_free() {
        let p = policy();
        assert_eq!(p.late_fee(end(), end()).unwrap(), None);
        assert_eq!(p.late_fee(end(), end() + Duration::minutes(59)).unwrap(), None);
        assert_eq!(p.late_fee(end(), end() + Duration::minutes(60)).unwrap(), None);
    }

    #[test]
    fn overage_is_billed_in_whole_hours_rounded_up() {
        let p = policy();

        let fee = p.late_fee(end(), end() + Duration::minutes(61)).unwrap().unwrap();
        assert_eq!(fee.hours_late, 2);
        assert_eq!(fee.amount, rupees(200));

        let fee = p.late_fee(end(), end() + Duration::minutes(90)).unwrap().unwrap();
        assert_eq!(fee.hours_late, 2);
        assert_eq!(fee.amount, rupees(200));

        let fee = p.late_fee(end(), end() + Duration::hours(3)).unwrap().unwrap();
        assert_eq!(fee.hours_late, 3);
        assert_eq!(fee.amount, rupees(300));
    }

    #[test]
    fn early_drops_never_charge() {
        let p = policy();
        assert_eq!(p.late_fee(end(), end() - Duration::hours(2)).unwrap(), None);
    }
}
