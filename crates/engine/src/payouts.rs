//! Payout engine
//!
//! Computes and records the owner's earnings at booking completion, and
//! drives the claim lifecycle: pending -> processing (owner supplies a
//! payout destination) -> claimed (external settlement).

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use pricing::PayoutCalculator;
use types::{Booking, Payout, PayoutId, PayoutStatus, Result, WheelbaseError};

use crate::storage::SettlementStore;

pub struct PayoutEngine {
    store: Arc<dyn SettlementStore>,
    calculator: PayoutCalculator,
}

impl PayoutEngine {
    pub fn new(store: Arc<dyn SettlementStore>, calculator: PayoutCalculator) -> Self {
        Self { store, calculator }
    }

    /// Record the owner's payout for a completed booking.
    pub async fn create_for_completion(
        &self,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<Payout> {
        let coupon_percentage = booking.coupon_discount_percentage();
        let breakdown = self.calculator.compute(
            booking.total_hours,
            booking.price_per_hour,
            coupon_percentage,
            booking.late_fees_amount,
        )?;

        let payout = Payout {
            id: Uuid::new_v4(),
            booking_id: booking.id,
            car_id: booking.car_id,
            price_per_hour: booking.price_per_hour,
            total_hours: booking.total_hours,
            late_charge: breakdown.late_charge,
            coupon_discount_percentage: coupon_percentage,
            payout_amount: breakdown.payout_amount,
            status: PayoutStatus::Pending,
            destination: None,
            created_at: now,
        };
        self.store.insert_payout(&payout).await?;

        tracing::info!(
            booking_id = %booking.id,
            payout_id = %payout.id,
            gross = %breakdown.gross_earning,
            commission = %breakdown.platform_commission,
            discount_share = %breakdown.discount_share,
            amount = %payout.payout_amount,
            "Owner payout recorded"
        );
        Ok(payout)
    }

    /// Claim a pending payout by supplying a payout destination. Same
    /// discipline as refund claims: empty destinations and non-pending
    /// rows are rejected without mutation.
    pub async fn claim(&self, id: PayoutId, destination: &str) -> Result<Payout> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(WheelbaseError::InvalidDestination(
                "payout destination id is empty".to_string(),
            ));
        }

        let payout = self.load(id).await?;
        if payout.status != PayoutStatus::Pending {
            return Err(WheelbaseError::AlreadyClaimed {
                resource: format!("payout {}", id),
            });
        }

        if !self.store.claim_payout(id, destination).await? {
            return Err(WheelbaseError::AlreadyClaimed {
                resource: format!("payout {}", id),
            });
        }

        tracing::info!(payout_id = %id, "Payout claimed");
        self.load(id).await
    }

    /// External settlement confirmation: processing -> claimed.
    pub async fn settle(&self, id: PayoutId) -> Result<Payout> {
        if !self.store.settle_payout(id).await? {
            let payout = self.load(id).await?;
            return match payout.status {
                PayoutStatus::Pending => Err(WheelbaseError::Validation(
                    "payout has not been claimed yet".to_string(),
                )),
                _ => Err(WheelbaseError::AlreadyClaimed {
                    resource: format!("payout {}", id),
                }),
            };
        }

        tracing::info!(payout_id = %id, "Payout settled");
        self.load(id).await
    }

    async fn load(&self, id: PayoutId) -> Result<Payout> {
        self.store
            .get_payout(id)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("payout {}", id),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{draft_for, in_memory_stores};
    use types::{AppliedCoupon, Money};

    fn engine(stores: Arc<crate::storage::SqliteStores>) -> PayoutEngine {
        PayoutEngine::new(stores, PayoutCalculator::new(20))
    }

    fn completed_booking(with_coupon: bool, late_fee: i64) -> types::Booking {
        let mut draft = draft_for(Uuid::new_v4(), 100, 4);
        if with_coupon {
            draft.coupon = Some(AppliedCoupon {
                coupon_id: Uuid::new_v4(),
                code: "SAVE20".to_string(),
                discount_percentage: 20,
                discount_amount: Money::new(80).unwrap(),
            });
        }
        let mut booking =
            types::Booking::from_draft(&draft, "pay_1".to_string(), Utc::now()).unwrap();
        if late_fee > 0 {
            booking.late_fees_charged = true;
            booking.late_fees_amount = Money::new(late_fee).unwrap();
        }
        booking
    }

    #[tokio::test]
    async fn completion_payout_nets_out_commission_and_coupon() {
        let stores = in_memory_stores().await;
        let engine = engine(stores.clone());

        // gross 400, coupon share 80, commission 80 -> 240
        let payout = engine
            .create_for_completion(&completed_booking(true, 0), Utc::now())
            .await
            .unwrap();

        assert_eq!(payout.payout_amount, Money::new(240).unwrap());
        assert_eq!(payout.coupon_discount_percentage, 20);
        assert_eq!(payout.status, PayoutStatus::Pending);
    }

    #[tokio::test]
    async fn late_charge_flows_into_the_payout() {
        let stores = in_memory_stores().await;
        let engine = engine(stores.clone());

        // gross 400, commission 80, late 200 -> 520
        let payout = engine
            .create_for_completion(&completed_booking(false, 200), Utc::now())
            .await
            .unwrap();

        assert_eq!(payout.late_charge, Money::new(200).unwrap());
        assert_eq!(payout.payout_amount, Money::new(520).unwrap());
    }

    #[tokio::test]
    async fn claim_and_settle_lifecycle() {
        let stores = in_memory_stores().await;
        let engine = engine(stores.clone());
        let payout = engine
            .create_for_completion(&completed_booking(false, 0), Utc::now())
            .await
            .unwrap();

        let claimed = engine.claim(payout.id, "owner@upi").await.unwrap();
        assert_eq!(claimed.status, PayoutStatus::Processing);
        assert_eq!(claimed.destination.as_deref(), Some("owner@upi"));

        let err = engine.claim(payout.id, "other@upi").await.unwrap_err();
        assert!(matches!(err, WheelbaseError::AlreadyClaimed { .. }));

        let settled = engine.settle(payout.id).await.unwrap();
        assert_eq!(settled.status, PayoutStatus::Claimed);
        // Destination survives settlement untouched
        assert_eq!(settled.destination.as_deref(), Some("owner@upi"));
    }

    #[tokio::test]
    async fn empty_destination_is_rejected() {
        let stores = in_memory_stores().await;
        let engine = engine(stores.clone());
        let payout = engine
            .create_for_completion(&completed_booking(false, 0), Utc::now())
            .await
            .unwrap();

        let err = engine.claim(payout.id, "").await.unwrap_err();
        assert!(matches!(err, WheelbaseError::InvalidDestination(_)));

        let stored = stores.get_payout(payout.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PayoutStatus::Pending);
        assert!(stored.destination.is_none());
    }
}
