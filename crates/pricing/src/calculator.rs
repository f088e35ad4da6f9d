//! Rental window pricing

use chrono::{DateTime, Utc};
use config::MarketplaceConfig;
use types::{Money, Quote, Result, WheelbaseError};

/// Prices a rental window against a car's hourly rate
#[derive(Debug, Clone)]
pub struct PricingCalculator {
    deposit_multiplier: u32,
}

impl PricingCalculator {
    pub fn new(deposit_multiplier: u32) -> Self {
        Self { deposit_multiplier }
    }

    pub fn from_config(config: &MarketplaceConfig) -> Self {
        Self::new(config.deposit_multiplier)
    }

    /// Quote a window: `hours = max(round(end - start), 1)`,
    /// `sub = rate * hours`, `deposit = rate * multiplier`.
    pub fn quote(
        &self,
        price_per_hour: Money,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Quote> {
        if end <= start {
            return Err(WheelbaseError::Validation(format!(
                "booking end {} must be after start {}",
                end, start
            )));
        }

        let total_hours = Self::rounded_hours(start, end);
        let sub_amount = price_per_hour.checked_mul(total_hours)?;
        let security_deposit = price_per_hour.checked_mul(self.deposit_multiplier)?;

        Ok(Quote {
            total_hours,
            sub_amount,
            security_deposit,
        })
    }

    /// Half-up rounding of the window to whole hours, floored at 1.
    fn rounded_hours(start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
        let seconds = (end - start).num_seconds();
        let rounded = (seconds + 1800) / 3600;
        rounded.max(1) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, 0).unwrap()
    }

    fn rupees(v: i64) -> Money {
        Money::new(v).unwrap()
    }

    #[test]
    fn four_hour_window_at_100() {
        let calc = PricingCalculator::new(5);
        let quote = calc.quote(rupees(100), at(10, 0), at(14, 0)).unwrap();
        assert_eq!(quote.total_hours, 4);
        assert_eq!(quote.sub_amount, rupees(400));
        assert_eq!(quote.security_deposit, rupees(500));
    }

    #[test]
    fn partial_hours_round_half_up() {
        let calc = PricingCalculator::new(5);
        // 10:00 -> 13:40 is 3h40m, rounds to 4
        let quote = calc.quote(rupees(100), at(10, 0), at(13, 40)).unwrap();
        assert_eq!(quote.total_hours, 4);

        // 10:00 -> 13:20 is 3h20m, rounds to 3
        let quote = calc.quote(rupees(100), at(10, 0), at(13, 20)).unwrap();
        assert_eq!(quote.total_hours, 3);
    }

    #[test]
    fn tiny_windows_are_floored_at_one_hour() {
        let calc = PricingCalculator::new(5);
        let quote = calc.quote(rupees(100), at(10, 0), at(10, 10)).unwrap();
        assert_eq!(quote.total_hours, 1);
        assert_eq!(quote.sub_amount, rupees(100));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let calc = PricingCalculator::new(5);
        assert!(calc.quote(rupees(100), at(14, 0), at(10, 0)).is_err());
        assert!(calc.quote(rupees(100), at(10, 0), at(10, 0)).is_err());
    }

    #[test]
    fn deposit_tracks_the_configured_multiplier() {
        let calc = PricingCalculator::new(3);
        let quote = calc.quote(rupees(80), at(10, 0), at(12, 0)).unwrap();
        assert_eq!(quote.security_deposit, rupees(240));
    }
}
