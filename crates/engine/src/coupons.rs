//! Coupon application engine
//!
//! Applying a coupon to a draft is phase one of two-phase consumption:
//! the coupon moves available -> reserved here, and only burns
//! (reserved -> used) when the booking is confirmed. An abandoned draft
//! releases the reservation.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use types::{
    AppliedCoupon, BookingDraft, BookingId, Coupon, CouponState, Result, UserId,
    WheelbaseError,
};

use crate::storage::CouponStore;

/// Validates, reserves and issues coupons
pub struct CouponEngine {
    store: Arc<dyn CouponStore>,
    compensation_coupon_percent: u8,
}

impl CouponEngine {
    pub fn new(store: Arc<dyn CouponStore>, compensation_coupon_percent: u8) -> Self {
        Self {
            store,
            compensation_coupon_percent,
        }
    }

    /// Validate a code against the external lookup and reserve it for the
    /// draft. The draft's discount and main amounts are derived here.
    pub async fn apply_to_draft(
        &self,
        draft: &mut BookingDraft,
        code: &str,
    ) -> Result<AppliedCoupon> {
        if draft.coupon.is_some() {
            return Err(WheelbaseError::Validation(
                "draft already has a coupon applied".to_string(),
            ));
        }

        let code = code.trim();

        // The collaborator answers with a percentage, or -1 for an unknown
        // code; interpretation of that sentinel lives in one place
        let raw = self.store.lookup_discount(code).await?;
        let percentage = pricing::interpret_lookup(code, raw)?;

        let coupon = self
            .store
            .get_by_code(code)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("coupon {}", code),
            })?;

        if coupon.renter_id != draft.renter_id {
            return Err(WheelbaseError::Validation(
                "coupon was issued to a different renter".to_string(),
            ));
        }

        if coupon.state != CouponState::Available {
            return Err(WheelbaseError::AlreadyUsed {
                code: code.to_string(),
            });
        }

        // CAS guards the race between two drafts holding the same code
        if !self.store.reserve(code, draft.renter_id).await? {
            return Err(WheelbaseError::AlreadyUsed {
                code: code.to_string(),
            });
        }

        let discount = pricing::apply_discount(draft.sub_amount, percentage)?;
        let applied = AppliedCoupon {
            coupon_id: coupon.id,
            code: coupon.code.clone(),
            discount_percentage: percentage,
            discount_amount: discount.discount_amount,
        };

        tracing::info!(
            code = %applied.code,
            percentage = applied.discount_percentage,
            discount = %applied.discount_amount,
            "Coupon reserved for draft"
        );

        draft.coupon = Some(applied.clone());
        Ok(applied)
    }

    /// Return a reserved coupon to circulation when the draft is
    /// abandoned or its payment fails.
    pub async fn release_from_draft(&self, draft: &mut BookingDraft) -> Result<bool> {
        let Some(applied) = draft.coupon.take() else {
            return Ok(false);
        };

        let released = self.store.release(applied.coupon_id).await?;
        if released {
            tracing::info!(code = %applied.code, "Coupon released back to renter");
        }
        Ok(released)
    }

    /// Issue a compensation coupon to the renter of an owner-cancelled
    /// trip.
    pub async fn issue_compensation(
        &self,
        renter_id: UserId,
        booking_id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<Coupon> {
        let coupon = Coupon::compensation(
            renter_id,
            self.compensation_coupon_percent,
            booking_id,
            now,
        );
        self.store.insert_coupon(&coupon).await?;

        tracing::info!(
            code = %coupon.code,
            percentage = coupon.discount_percentage,
            booking_id = %booking_id,
            "Compensation coupon issued"
        );
        Ok(coupon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{draft_for, in_memory_stores, issued_coupon};
    use types::Money;
    use uuid::Uuid;

    #[tokio::test]
    async fn apply_reserves_and_discounts() {
        let stores = in_memory_stores().await;
        let engine = CouponEngine::new(stores.clone(), 10);

        let renter = Uuid::new_v4();
        issued_coupon(&stores, "SAVE20", 20, renter).await;

        let mut draft = draft_for(renter, 100, 4);
        let applied = engine.apply_to_draft(&mut draft, " SAVE20 ").await.unwrap();

        assert_eq!(applied.discount_percentage, 20);
        assert_eq!(applied.discount_amount, Money::new(80).unwrap());
        assert_eq!(draft.main_amount(), Money::new(320).unwrap());

        let stored = stores.get_by_code("SAVE20").await.unwrap().unwrap();
        assert_eq!(stored.state, CouponState::Reserved);
    }

    #[tokio::test]
    async fn second_apply_of_the_same_code_fails() {
        let stores = in_memory_stores().await;
        let engine = CouponEngine::new(stores.clone(), 10);

        let renter = Uuid::new_v4();
        issued_coupon(&stores, "ONCE", 15, renter).await;

        let mut first = draft_for(renter, 100, 4);
        engine.apply_to_draft(&mut first, "ONCE").await.unwrap();

        let mut second = draft_for(renter, 100, 4);
        let err = engine.apply_to_draft(&mut second, "ONCE").await.unwrap_err();
        assert!(matches!(err, WheelbaseError::AlreadyUsed { .. }));
        assert!(second.coupon.is_none());
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let stores = in_memory_stores().await;
        let engine = CouponEngine::new(stores.clone(), 10);

        let mut draft = draft_for(Uuid::new_v4(), 100, 4);
        let err = engine.apply_to_draft(&mut draft, "GHOST").await.unwrap_err();
        assert!(matches!(err, WheelbaseError::NotFound { .. }));
    }

    #[tokio::test]
    async fn foreign_coupon_is_rejected() {
        let stores = in_memory_stores().await;
        let engine = CouponEngine::new(stores.clone(), 10);

        let owner_of_coupon = Uuid::new_v4();
        issued_coupon(&stores, "THEIRS", 20, owner_of_coupon).await;

        let mut draft = draft_for(Uuid::new_v4(), 100, 4);
        let err = engine.apply_to_draft(&mut draft, "THEIRS").await.unwrap_err();
        assert!(matches!(err, WheelbaseError::Validation(_)));
    }

    #[tokio::test]
    async fn release_returns_the_coupon_to_circulation() {
        let stores = in_memory_stores().await;
        let engine = CouponEngine::new(stores.clone(), 10);

        let renter = Uuid::new_v4();
        issued_coupon(&stores, "BACK", 20, renter).await;

        let mut draft = draft_for(renter, 100, 4);
        engine.apply_to_draft(&mut draft, "BACK").await.unwrap();
        assert!(engine.release_from_draft(&mut draft).await.unwrap());
        assert!(draft.coupon.is_none());

        // Usable again after the release
        let mut retry = draft_for(renter, 100, 4);
        assert!(engine.apply_to_draft(&mut retry, "BACK").await.is_ok());
    }

    #[tokio::test]
    async fn compensation_coupon_lands_in_the_store() {
        let stores = in_memory_stores().await;
        let engine = CouponEngine::new(stores.clone(), 10);

        let renter = Uuid::new_v4();
        let booking = Uuid::new_v4();
        let coupon = engine
            .issue_compensation(renter, booking, chrono::Utc::now())
            .await
            .unwrap();

        let stored = stores.get_by_code(&coupon.code).await.unwrap().unwrap();
        assert_eq!(stored.discount_percentage, 10);
        assert_eq!(stored.state, CouponState::Available);
        assert_eq!(stored.renter_id, renter);
    }
}
