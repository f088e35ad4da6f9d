//! Coupon lookup interpretation and discount application

use types::{CouponDiscount, CouponError, Money, Result, COUPON_NOT_FOUND_SENTINEL};

/// Interpret the raw percentage returned by the external coupon lookup.
///
/// The collaborator signals an unknown code with `-1`; that sentinel is a
/// rejection, never a numeric discount. Anything outside (0, 100] is
/// likewise rejected.
pub fn interpret_lookup(
    code: &str,
    raw_percentage: i64,
) -> std::result::Result<u8, CouponError> {
    let code = code.trim();
    if code.is_empty() {
        return Err(CouponError::EmptyCode);
    }

    if raw_percentage == COUPON_NOT_FOUND_SENTINEL {
        return Err(CouponError::NotFound {
            code: code.to_string(),
        });
    }

    if raw_percentage <= 0 || raw_percentage > 100 {
        return Err(CouponError::InvalidPercentage {
            percentage: raw_percentage,
        });
    }

    Ok(raw_percentage as u8)
}

/// Apply a validated percentage to a quoted sub amount:
/// `discount = round(sub * pct / 100)`, `main = max(sub - discount, 0)`.
pub fn apply_discount(sub_amount: Money, discount_percentage: u8) -> Result<CouponDiscount> {
    let discount_amount = sub_amount.percent_round(discount_percentage)?;
    let main_amount = sub_amount.saturating_sub(discount_amount);

    Ok(CouponDiscount {
        discount_percentage,
        discount_amount,
        main_amount,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rupees(v: i64) -> Money {
        Money::new(v).unwrap()
    }

    #[test]
    fn sentinel_is_not_found_never_a_discount() {
        let err = interpret_lookup("GHOST", -1).unwrap_err();
        assert!(matches!(err, CouponError::NotFound { .. }));
    }

    #[test]
    fn out_of_range_percentages_are_rejected() {
        assert!(matches!(
            interpret_lookup("ZERO", 0),
            Err(CouponError::InvalidPercentage { .. })
        ));
        assert!(matches!(
            interpret_lookup("BIG", 101),
            Err(CouponError::InvalidPercentage { .. })
        ));
        assert!(matches!(
            interpret_lookup("NEG", -5),
            Err(CouponError::InvalidPercentage { .. })
        ));
    }

    #[test]
    fn blank_codes_are_rejected_before_lookup_interpretation() {
        assert!(matches!(interpret_lookup("   ", 20), Err(CouponError::EmptyCode)));
    }

    #[test]
    fn valid_percentage_passes_through() {
        assert_eq!(interpret_lookup(" SAVE20 ", 20).unwrap(), 20);
        assert_eq!(interpret_lookup("FULL", 100).unwrap(), 100);
    }

    #[test]
    fn twenty_percent_of_400() {
        let discount = apply_discount(rupees(400), 20).unwrap();
        assert_eq!(discount.discount_amount, rupees(80));
        assert_eq!(discount.main_amount, rupees(320));
    }

    #[test]
    fn full_discount_floors_main_at_zero() {
        let discount = apply_discount(rupees(250), 100).unwrap();
        assert_eq!(discount.discount_amount, rupees(250));
        assert_eq!(discount.main_amount, Money::ZERO);
    }

    #[test]
    fn odd_amounts_round_half_up() {
        // 15% of 333 = 49.95 -> 50
        let discount = apply_discount(rupees(333), 15).unwrap();
        assert_eq!(discount.discount_amount, rupees(50));
        assert_eq!(discount.main_amount, rupees(283));
    }
}
