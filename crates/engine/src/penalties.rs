//! Penalty engine
//!
//! Records charges (owner cancellation, late return, damage) and drives
//! their payment: a gateway order is created for the full amount, and the
//! penalty flips to `paid` only after externally-verified payment. No
//! partial payment.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use gateway::PaymentGateway;
use pricing::PenaltyPolicy;
use types::{
    Booking, BookingId, LateFee, Money, PaymentOrder, PaymentProof, Penalty, PenaltyId,
    PenaltyPaymentStatus, PenaltyReason, Result, WheelbaseError,
};

use crate::storage::SettlementStore;

pub struct PenaltyEngine {
    store: Arc<dyn SettlementStore>,
    gateway: Arc<dyn PaymentGateway>,
    policy: PenaltyPolicy,
    currency: String,
}

impl PenaltyEngine {
    pub fn new(
        store: Arc<dyn SettlementStore>,
        gateway: Arc<dyn PaymentGateway>,
        policy: PenaltyPolicy,
        currency: String,
    ) -> Self {
        Self {
            store,
            gateway,
            policy,
            currency,
        }
    }

    pub fn policy(&self) -> &PenaltyPolicy {
        &self.policy
    }

    /// Charge an owner for cancelling a confirmed booking.
    pub async fn record_owner_cancellation(
        &self,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<Penalty> {
        let amount = self.policy.owner_cancellation_amount(booking.total_amount)?;
        let penalty = Penalty::new(booking.id, PenaltyReason::CancelledByOwner, amount, now);
        self.store.insert_penalty(&penalty).await?;

        tracing::info!(
            booking_id = %booking.id,
            penalty_id = %penalty.id,
            amount = %amount,
            "Owner cancellation penalty recorded"
        );
        Ok(penalty)
    }

    /// Charge a renter for returning the car late. The reason
    /// distinguishes drop-time detection from the background sweep.
    pub async fn record_late_return(
        &self,
        booking_id: BookingId,
        fee: &LateFee,
        reason: PenaltyReason,
        now: DateTime<Utc>,
    ) -> Result<Penalty> {
        let penalty = Penalty::new(booking_id, reason, fee.amount, now);
        self.store.insert_penalty(&penalty).await?;

        tracing::info!(
            booking_id = %booking_id,
            penalty_id = %penalty.id,
            hours_late = fee.hours_late,
            amount = %fee.amount,
            reason = reason.as_str(),
            "Late return penalty recorded"
        );
        Ok(penalty)
    }

    /// Record a damage charge. The amount comes from an external
    /// adjudication process; this engine only tracks payment state.
    pub async fn record_damage(
        &self,
        booking_id: BookingId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Penalty> {
        let penalty = Penalty::new(booking_id, PenaltyReason::Damage, amount, now);
        self.store.insert_penalty(&penalty).await?;

        tracing::info!(
            booking_id = %booking_id,
            penalty_id = %penalty.id,
            amount = %amount,
            "Damage penalty recorded"
        );
        Ok(penalty)
    }

    /// Create a gateway order for an unpaid penalty.
    pub async fn begin_payment(&self, id: PenaltyId) -> Result<PaymentOrder> {
        let penalty = self.load(id).await?;
        if penalty.payment_status == PenaltyPaymentStatus::Paid {
            return Err(WheelbaseError::AlreadyClaimed {
                resource: format!("penalty {}", id),
            });
        }

        self.gateway
            .create_order(
                penalty.penalty_amount.to_minor_units(),
                &self.currency,
                &format!("penalty-{}", id),
            )
            .await
    }

    /// Mark a penalty paid after gateway verification succeeds. A
    /// verification failure leaves the penalty unpaid.
    pub async fn complete_payment(&self, id: PenaltyId, proof: &PaymentProof) -> Result<Penalty> {
        let penalty = self.load(id).await?;
        if penalty.payment_status == PenaltyPaymentStatus::Paid {
            return Err(WheelbaseError::AlreadyClaimed {
                resource: format!("penalty {}", id),
            });
        }

        self.gateway.verify_payment(proof).await?;

        if !self.store.mark_penalty_paid(id, &proof.payment_id).await? {
            return Err(WheelbaseError::AlreadyClaimed {
                resource: format!("penalty {}", id),
            });
        }

        tracing::info!(penalty_id = %id, payment_id = %proof.payment_id, "Penalty paid");
        self.load(id).await
    }

    async fn load(&self, id: PenaltyId) -> Result<Penalty> {
        self.store
            .get_penalty(id)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("penalty {}", id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{in_memory_stores, MockGateway};
    use uuid::Uuid;

    fn policy() -> PenaltyPolicy {
        PenaltyPolicy::new(10, Money::new(100).unwrap(), 60)
    }

    fn proof() -> PaymentProof {
        PaymentProof {
            order_id: "order_0".to_string(),
            payment_id: "pay_abc".to_string(),
            signature: "sig".to_string(),
        }
    }

    #[tokio::test]
    async fn payment_flow_marks_the_penalty_paid() {
        let stores = in_memory_stores().await;
        let gateway = MockGateway::accepting();
        let engine = PenaltyEngine::new(stores.clone(), gateway.clone(), policy(), "INR".into());

        let penalty = engine
            .record_damage(Uuid::new_v4(), Money::new(1500).unwrap(), Utc::now())
            .await
            .unwrap();

        let order = engine.begin_payment(penalty.id).await.unwrap();
        assert_eq!(order.amount, 150_000); // minor units at the boundary
        assert_eq!(gateway.orders_created(), 1);

        let paid = engine.complete_payment(penalty.id, &proof()).await.unwrap();
        assert_eq!(paid.payment_status, PenaltyPaymentStatus::Paid);
        assert_eq!(paid.gateway_payment_id.as_deref(), Some("pay_abc"));
    }

    #[tokio::test]
    async fn verification_failure_leaves_the_penalty_unpaid() {
        let stores = in_memory_stores().await;
        let engine = PenaltyEngine::new(
            stores.clone(),
            MockGateway::rejecting_verification(),
            policy(),
            "INR".into(),
        );

        let penalty = engine
            .record_damage(Uuid::new_v4(), Money::new(500).unwrap(), Utc::now())
            .await
            .unwrap();

        let err = engine.complete_payment(penalty.id, &proof()).await.unwrap_err();
        assert!(matches!(err, WheelbaseError::VerificationFailed(_)));

        let stored = stores.get_penalty(penalty.id).await.unwrap().unwrap();
        assert_eq!(stored.payment_status, PenaltyPaymentStatus::Unpaid);
        assert!(stored.gateway_payment_id.is_none());
    }

    #[tokio::test]
    async fn paid_penalties_reject_further_payment() {
        let stores = in_memory_stores().await;
        let engine = PenaltyEngine::new(
            stores.clone(),
            MockGateway::accepting(),
            policy(),
            "INR".into(),
        );

        let penalty = engine
            .record_damage(Uuid::new_v4(), Money::new(500).unwrap(), Utc::now())
            .await
            .unwrap();
        engine.complete_payment(penalty.id, &proof()).await.unwrap();

        let err = engine.begin_payment(penalty.id).await.unwrap_err();
        assert!(matches!(err, WheelbaseError::AlreadyClaimed { .. }));

        let err = engine.complete_payment(penalty.id, &proof()).await.unwrap_err();
        assert!(matches!(err, WheelbaseError::AlreadyClaimed { .. }));
    }

    #[tokio::test]
    async fn owner_cancellation_uses_the_configured_percentage() {
        let stores = in_memory_stores().await;
        let engine = PenaltyEngine::new(
            stores.clone(),
            MockGateway::accepting(),
            policy(),
            "INR".into(),
        );

        let booking = {
            let draft = crate::test_support::draft_for(Uuid::new_v4(), 100, 4);
            types::Booking::from_draft(&draft, "pay_1".to_string(), Utc::now()).unwrap()
        };

        // total 900 (main 400 + deposit 500) at 10% -> 90
        let penalty = engine
            .record_owner_cancellation(&booking, Utc::now())
            .await
            .unwrap();
        assert_eq!(penalty.penalty_amount, Money::new(90).unwrap());
        assert_eq!(penalty.reason, PenaltyReason::CancelledByOwner);
    }
}
