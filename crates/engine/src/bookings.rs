//! Booking state machine
//!
//! Booked -> PickedUp -> Completed, with renter- and owner-initiated
//! cancellation as the only other exits, both from Booked. Once the car
//! is picked up there is no cancellation path; the trip can only end in
//! a drop. Each transition guard rejects from a non-matching state with
//! no partial mutation.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use config::Config;
use gateway::PaymentGateway;
use pricing::{PenaltyPolicy, PricingCalculator, RefundSchedule};
use types::{
    Booking, BookingDraft, BookingId, BookingStatus, CancellingParty, CarId, Coupon,
    PaymentOrder, PaymentProof, Payout, Penalty, PenaltyReason, PhotoSet, Refund, Result,
    UserId, WheelbaseError,
};

use crate::coupons::CouponEngine;
use crate::payouts::PayoutEngine;
use crate::penalties::PenaltyEngine;
use crate::refunds::RefundEngine;
use crate::storage::{BookingStore, CarStore, SqliteStores};

/// Everything a completed drop produced
#[derive(Debug)]
pub struct DropOutcome {
    pub booking: Booking,
    pub deposit_refund: Refund,
    pub payout: Payout,
    pub late_penalty: Option<Penalty>,
}

/// Everything a cancellation produced
#[derive(Debug)]
pub struct CancellationOutcome {
    pub booking: Booking,
    pub refund: Refund,
    /// Present for owner-initiated cancellations
    pub penalty: Option<Penalty>,
    /// Present for owner-initiated cancellations
    pub compensation_coupon: Option<Coupon>,
}

/// Orchestrates the booking lifecycle and its settlement side effects
pub struct BookingEngine {
    cars: Arc<dyn CarStore>,
    bookings: Arc<dyn BookingStore>,
    coupons: Arc<CouponEngine>,
    refunds: Arc<RefundEngine>,
    penalties: Arc<PenaltyEngine>,
    payouts: Arc<PayoutEngine>,
    gateway: Arc<dyn PaymentGateway>,
    calculator: PricingCalculator,
    schedule: RefundSchedule,
    currency: String,
}

impl BookingEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        cars: Arc<dyn CarStore>,
        bookings: Arc<dyn BookingStore>,
        coupons: Arc<CouponEngine>,
        refunds: Arc<RefundEngine>,
        penalties: Arc<PenaltyEngine>,
        payouts: Arc<PayoutEngine>,
        gateway: Arc<dyn PaymentGateway>,
        config: &Config,
    ) -> Self {
        Self {
            cars,
            bookings,
            coupons,
            refunds,
            penalties,
            payouts,
            gateway,
            calculator: PricingCalculator::from_config(&config.marketplace),
            schedule: RefundSchedule::from_config(&config.policy),
            currency: config.marketplace.currency.clone(),
        }
    }

    /// Wire the whole engine stack over one SQLite store set.
    pub fn with_stores(
        stores: Arc<SqliteStores>,
        gateway: Arc<dyn PaymentGateway>,
        config: &Config,
    ) -> Result<Self> {
        let coupons = Arc::new(CouponEngine::new(
            stores.clone(),
            config.policy.compensation_coupon_percent,
        ));
        let refunds = Arc::new(RefundEngine::new(stores.clone()));
        let penalties = Arc::new(PenaltyEngine::new(
            stores.clone(),
            gateway.clone(),
            PenaltyPolicy::from_config(&config.policy)?,
            config.marketplace.currency.clone(),
        ));
        let payouts = Arc::new(PayoutEngine::new(
            stores.clone(),
            pricing::PayoutCalculator::from_config(&config.policy),
        ));

        Ok(Self::new(
            stores.clone(),
            stores,
            coupons,
            refunds,
            penalties,
            payouts,
            gateway,
            config,
        ))
    }

    pub fn coupons(&self) -> &Arc<CouponEngine> {
        &self.coupons
    }

    pub fn refunds(&self) -> &Arc<RefundEngine> {
        &self.refunds
    }

    pub fn penalties(&self) -> &Arc<PenaltyEngine> {
        &self.penalties
    }

    pub fn payouts(&self) -> &Arc<PayoutEngine> {
        &self.payouts
    }

    /// Price a rental window into a draft the caller holds until payment.
    pub async fn price_draft(
        &self,
        car_id: CarId,
        renter_id: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<BookingDraft> {
        let car = self
            .cars
            .get_car(car_id)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("car {}", car_id),
            })?;

        if !car.is_bookable() {
            return Err(WheelbaseError::Validation(
                "car is not open for booking".to_string(),
            ));
        }

        if car.owner_id == renter_id {
            return Err(WheelbaseError::Validation(
                "owners cannot book their own car".to_string(),
            ));
        }

        if start <= now {
            return Err(WheelbaseError::Validation(
                "booking start must be in the future".to_string(),
            ));
        }

        let quote = self.calculator.quote(car.price_per_hour, start, end)?;

        Ok(BookingDraft {
            car_id: car.id,
            owner_id: car.owner_id,
            renter_id,
            start,
            end,
            price_per_hour: car.price_per_hour,
            total_hours: quote.total_hours,
            sub_amount: quote.sub_amount,
            security_deposit: quote.security_deposit,
            coupon: None,
        })
    }

    /// Create a gateway order for the draft's total. Nothing is persisted
    /// until the payment is verified.
    pub async fn begin_checkout(&self, draft: &BookingDraft) -> Result<PaymentOrder> {
        let total = draft.total_amount()?;
        self.gateway
            .create_order(
                total.to_minor_units(),
                &self.currency,
                &format!("draft-{}", Uuid::new_v4()),
            )
            .await
    }

    /// Turn a verified draft into a persisted booking.
    ///
    /// Order of operations is deliberate: the payment proof is verified
    /// first (a failed verification creates nothing), then the overlap
    /// check, booking insert and coupon burn happen in one transaction.
    pub async fn create_booking(
        &self,
        draft: &BookingDraft,
        proof: &PaymentProof,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        self.gateway.verify_payment(proof).await?;

        let booking = Booking::from_draft(draft, proof.payment_id.clone(), now)?;
        self.bookings
            .insert_booking_if_free(&booking, draft.coupon.as_ref().map(|c| c.coupon_id))
            .await?;

        tracing::info!(
            booking_id = %booking.id,
            car_id = %booking.car_id,
            renter_id = %booking.renter_id,
            total = %booking.total_amount,
            hours = booking.total_hours,
            "Booking created"
        );
        Ok(booking)
    }

    pub async fn get_booking(&self, id: BookingId) -> Result<Booking> {
        self.bookings
            .get_booking(id)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("booking {}", id),
            })
    }

    /// Booked -> PickedUp: pickup OTP plus before-photos.
    pub async fn confirm_pickup(
        &self,
        id: BookingId,
        otp: &str,
        photos: PhotoSet,
        now: DateTime<Utc>,
    ) -> Result<Booking> {
        let mut booking = self.get_booking(id).await?;

        if booking.status != BookingStatus::Booked {
            return Err(self.rejection(&booking, "confirm pickup for"));
        }

        if !booking.pickup_otp.matches(otp) {
            return Err(WheelbaseError::InvalidOtp);
        }

        photos.validate()?;

        booking.mark_picked_up(photos, now);
        if !self.bookings.record_pickup(&booking).await? {
            return Err(self.conflict(id, "confirm pickup for").await);
        }

        tracing::info!(booking_id = %id, "Pickup confirmed");
        Ok(booking)
    }

    /// PickedUp -> Completed: drop OTP plus after-photos. Computes the
    /// late fee, releases the deposit and records the owner payout.
    pub async fn confirm_drop(
        &self,
        id: BookingId,
        otp: &str,
        photos: PhotoSet,
        now: DateTime<Utc>,
    ) -> Result<DropOutcome> {
        let mut booking = self.get_booking(id).await?;

        if booking.status != BookingStatus::PickedUp {
            return Err(self.rejection(&booking, "confirm drop for"));
        }

        if !booking.drop_otp.matches(otp) {
            return Err(WheelbaseError::InvalidOtp);
        }

        photos.validate()?;

        // The background sweep may already have charged the late fee; in
        // that case the stored amount stands
        let fresh_fee = if booking.late_fees_charged {
            None
        } else {
            self.penalties.policy().late_fee(booking.end, now)?
        };

        booking.mark_completed(photos, fresh_fee.as_ref().map(|f| f.amount), now);
        if !self.bookings.record_drop(&booking).await? {
            return Err(self.conflict(id, "confirm drop for").await);
        }

        let late_penalty = match &fresh_fee {
            Some(fee) => Some(
                self.penalties
                    .record_late_return(booking.id, fee, PenaltyReason::LateReturn, now)
                    .await?,
            ),
            None => None,
        };

        let deposit_refund = self.refunds.create_deposit_release(&booking, now).await?;
        let payout = self.payouts.create_for_completion(&booking, now).await?;

        tracing::info!(booking_id = %id, late = fresh_fee.is_some(), "Drop confirmed");
        Ok(DropOutcome {
            booking,
            deposit_refund,
            payout,
            late_penalty,
        })
    }

    /// Booked -> CancelledByUser, refunded on the time-based schedule.
    pub async fn cancel_by_user(
        &self,
        id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<CancellationOutcome> {
        let mut booking = self.get_booking(id).await?;

        if booking.status != BookingStatus::Booked {
            return Err(self.rejection(&booking, "cancel"));
        }

        let breakdown = self.schedule.renter_cancellation(
            booking.total_amount,
            booking.security_deposit,
            booking.discount_amount,
            booking.start,
            now,
        )?;

        booking.mark_cancelled(BookingStatus::CancelledByUser, now);
        if !self.bookings.record_cancellation(&booking).await? {
            return Err(self.conflict(id, "cancel").await);
        }

        let refund = self
            .refunds
            .create_for_cancellation(&booking, &breakdown, CancellingParty::Renter, now)
            .await?;

        tracing::info!(
            booking_id = %id,
            refund = %breakdown.total_refund,
            rate = breakdown.refund_rate,
            "Booking cancelled by renter"
        );
        Ok(CancellationOutcome {
            booking,
            refund,
            penalty: None,
            compensation_coupon: None,
        })
    }

    /// Booked -> CancelledByOwner: full refund to the renter, a
    /// compensation coupon, and a penalty against the owner.
    pub async fn cancel_by_owner(
        &self,
        id: BookingId,
        now: DateTime<Utc>,
    ) -> Result<CancellationOutcome> {
        let mut booking = self.get_booking(id).await?;

        if booking.status != BookingStatus::Booked {
            return Err(self.rejection(&booking, "cancel"));
        }

        let breakdown = self.schedule.owner_cancellation(
            booking.total_amount,
            booking.security_deposit,
            booking.start,
            now,
        )?;

        booking.mark_cancelled(BookingStatus::CancelledByOwner, now);
        if !self.bookings.record_cancellation(&booking).await? {
            return Err(self.conflict(id, "cancel").await);
        }

        let refund = self
            .refunds
            .create_for_cancellation(&booking, &breakdown, CancellingParty::Owner, now)
            .await?;
        let coupon = self
            .coupons
            .issue_compensation(booking.renter_id, booking.id, now)
            .await?;
        let penalty = self.penalties.record_owner_cancellation(&booking, now).await?;

        tracing::info!(
            booking_id = %id,
            refund = %breakdown.total_refund,
            penalty = %penalty.penalty_amount,
            "Booking cancelled by owner"
        );
        Ok(CancellationOutcome {
            booking,
            refund,
            penalty: Some(penalty),
            compensation_coupon: Some(coupon),
        })
    }

    /// Find picked-up bookings past the grace period and charge their
    /// late fee once. Run periodically by the deployment's scheduler.
    pub async fn sweep_overdue_drops(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now - self.penalties.policy().late_grace();
        let overdue = self.bookings.list_overdue_pickups(cutoff).await?;

        let mut charged = 0;
        for booking in overdue {
            let Some(fee) = self.penalties.policy().late_fee(booking.end, now)? else {
                continue;
            };

            // The flag is the idempotence marker; a lost race means the
            // drop handler or another sweep got here first
            if self
                .bookings
                .mark_late_fee_charged(booking.id, fee.amount, now)
                .await?
            {
                self.penalties
                    .record_late_return(booking.id, &fee, PenaltyReason::LateDrop, now)
                    .await?;
                charged += 1;
            }
        }

        if charged > 0 {
            tracing::info!(charged, "Overdue drop sweep charged late fees");
        }
        Ok(charged)
    }

    fn rejection(&self, booking: &Booking, action: &str) -> WheelbaseError {
        WheelbaseError::InvalidTransition {
            from: booking.status.as_str().to_string(),
            action: action.to_string(),
        }
    }

    async fn conflict(&self, id: BookingId, action: &str) -> WheelbaseError {
        let from = match self.bookings.get_booking(id).await {
            Ok(Some(b)) => b.status.as_str().to_string(),
            _ => "unknown".to_string(),
        };
        WheelbaseError::InvalidTransition {
            from,
            action: action.to_string(),
        }
    }
}
