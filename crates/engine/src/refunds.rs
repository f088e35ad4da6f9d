//! Refund engine
//!
//! Creates refund records at cancellation and trip-completion time and
//! drives the claim lifecycle: pending -> processing (renter supplies a
//! payout destination) -> completed (external settlement).

use chrono::{DateTime, Utc};
use std::sync::Arc;

use types::{
    Booking, CancellingParty, Refund, RefundBreakdown, RefundId, RefundReason, RefundStatus,
    Result, WheelbaseError,
};

use crate::storage::SettlementStore;

pub struct RefundEngine {
    store: Arc<dyn SettlementStore>,
}

impl RefundEngine {
    pub fn new(store: Arc<dyn SettlementStore>) -> Self {
        Self { store }
    }

    /// Record the refund owed after a cancellation.
    pub async fn create_for_cancellation(
        &self,
        booking: &Booking,
        breakdown: &RefundBreakdown,
        cancelled_by: CancellingParty,
        now: DateTime<Utc>,
    ) -> Result<Refund> {
        let reason = match cancelled_by {
            CancellingParty::Renter => RefundReason::CancelledByUser,
            CancellingParty::Owner => RefundReason::CancelledByOwner,
        };

        let deduction_reason = if breakdown.deduction_amount.is_zero() {
            None
        } else {
            Some(format!(
                "cancellation charges at {}% refund rate, {} days before start",
                breakdown.refund_rate, breakdown.days_before_start
            ))
        };

        let refund = Refund::new(
            booking.id,
            reason,
            breakdown.total_refund,
            breakdown.deduction_amount,
            deduction_reason,
            now,
        );
        self.store.insert_refund(&refund).await?;

        tracing::info!(
            booking_id = %booking.id,
            refund_id = %refund.id,
            amount = %refund.refund_amount,
            deduction = %refund.deduction_amount,
            reason = reason.as_str(),
            "Refund recorded"
        );
        Ok(refund)
    }

    /// Release the security deposit at trip completion.
    pub async fn create_deposit_release(
        &self,
        booking: &Booking,
        now: DateTime<Utc>,
    ) -> Result<Refund> {
        let refund = Refund::new(
            booking.id,
            RefundReason::Refundable,
            booking.security_deposit,
            types::Money::ZERO,
            None,
            now,
        );
        self.store.insert_refund(&refund).await?;

        tracing::info!(
            booking_id = %booking.id,
            refund_id = %refund.id,
            amount = %refund.refund_amount,
            "Security deposit released"
        );
        Ok(refund)
    }

    /// Claim a pending refund by supplying a payout destination. Rejects
    /// an empty destination and anything already past `pending`, without
    /// touching the stored destination.
    pub async fn claim(&self, id: RefundId, destination: &str) -> Result<Refund> {
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(WheelbaseError::InvalidDestination(
                "payout destination id is empty".to_string(),
            ));
        }

        let refund = self
            .store
            .get_refund(id)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("refund {}", id),
            })?;

        if refund.status != RefundStatus::Pending {
            return Err(WheelbaseError::AlreadyClaimed {
                resource: format!("refund {}", id),
            });
        }

        if !self.store.claim_refund(id, destination).await? {
            return Err(WheelbaseError::AlreadyClaimed {
                resource: format!("refund {}", id),
            });
        }

        tracing::info!(refund_id = %id, "Refund claimed");
        self.store
            .get_refund(id)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("refund {}", id),
            })
    }

    /// External settlement confirmation: processing -> completed.
    pub async fn settle(&self, id: RefundId) -> Result<Refund> {
        if !self.store.complete_refund(id).await? {
            let refund = self
                .store
                .get_refund(id)
                .await?
                .ok_or_else(|| WheelbaseError::NotFound {
                    resource: format!("refund {}", id),
                })?;
            return match refund.status {
                RefundStatus::Pending => Err(WheelbaseError::Validation(
                    "refund has not been claimed yet".to_string(),
                )),
                _ => Err(WheelbaseError::AlreadyClaimed {
                    resource: format!("refund {}", id),
                }),
            };
        }

        tracing::info!(refund_id = %id, "Refund settled");
        self.store
            .get_refund(id)
            .await?
            .ok_or_else(|| WheelbaseError::NotFound {
                resource: format!("refund {}", id),
            })
    }
}
