//! Settlement record types: refunds, penalties and payouts
//!
//! All three follow the same claim discipline: rows are created `pending`
//! (or `unpaid`), move forward through one-way transitions, and reject any
//! second claim once they have left their claimable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::BookingId;
use crate::car::CarId;
use crate::money::Money;

pub type RefundId = Uuid;
pub type PenaltyId = Uuid;
pub type PayoutId = Uuid;

/// Why a refund was created
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundReason {
    /// Security-deposit release at trip completion
    Refundable,
    Cancellation,
    CancelledByOwner,
    CancelledByUser,
    PartialRefund,
    Other,
}

impl RefundReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundReason::Refundable => "refundable",
            RefundReason::Cancellation => "cancellation",
            RefundReason::CancelledByOwner => "cancelled_by_owner",
            RefundReason::CancelledByUser => "cancelled_by_user",
            RefundReason::PartialRefund => "partial_refund",
            RefundReason::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "refundable" => Ok(RefundReason::Refundable),
            "cancellation" => Ok(RefundReason::Cancellation),
            "cancelled_by_owner" => Ok(RefundReason::CancelledByOwner),
            "cancelled_by_user" => Ok(RefundReason::CancelledByUser),
            "partial_refund" => Ok(RefundReason::PartialRefund),
            "other" => Ok(RefundReason::Other),
            _ => Err(format!("Unknown refund reason: {}", s)),
        }
    }
}

/// One-way refund progress: pending -> processing -> completed (or failed)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::Pending => "pending",
            RefundStatus::Processing => "processing",
            RefundStatus::Completed => "completed",
            RefundStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(RefundStatus::Pending),
            "processing" => Ok(RefundStatus::Processing),
            "completed" => Ok(RefundStatus::Completed),
            "failed" => Ok(RefundStatus::Failed),
            _ => Err(format!("Unknown refund status: {}", s)),
        }
    }
}

/// Money owed back to the renter, claimed against a payout destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: RefundId,
    pub booking_id: BookingId,
    pub reason: RefundReason,
    pub refund_amount: Money,
    /// What was withheld from the booking total, zero for full refunds
    pub deduction_amount: Money,
    pub deduction_reason: Option<String>,
    pub status: RefundStatus,
    /// Payout destination, set when the renter claims
    pub destination: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Refund {
    pub fn new(
        booking_id: BookingId,
        reason: RefundReason,
        refund_amount: Money,
        deduction_amount: Money,
        deduction_reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            reason,
            refund_amount,
            deduction_amount,
            deduction_reason,
            status: RefundStatus::Pending,
            destination: None,
            created_at: now,
        }
    }
}

/// Why a penalty was charged
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyReason {
    CancelledByOwner,
    LateReturn,
    LateDrop,
    Damage,
    RuleViolation,
    Other,
}

impl PenaltyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyReason::CancelledByOwner => "cancelled_by_owner",
            PenaltyReason::LateReturn => "late_return",
            PenaltyReason::LateDrop => "late_drop",
            PenaltyReason::Damage => "damage",
            PenaltyReason::RuleViolation => "rule_violation",
            PenaltyReason::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "cancelled_by_owner" => Ok(PenaltyReason::CancelledByOwner),
            "late_return" => Ok(PenaltyReason::LateReturn),
            "late_drop" => Ok(PenaltyReason::LateDrop),
            "damage" => Ok(PenaltyReason::Damage),
            "rule_violation" => Ok(PenaltyReason::RuleViolation),
            "other" => Ok(PenaltyReason::Other),
            _ => Err(format!("Unknown penalty reason: {}", s)),
        }
    }
}

/// Penalties are paid in full or not at all
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PenaltyPaymentStatus {
    Unpaid,
    Paid,
}

impl PenaltyPaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PenaltyPaymentStatus::Unpaid => "unpaid",
            PenaltyPaymentStatus::Paid => "paid",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "unpaid" => Ok(PenaltyPaymentStatus::Unpaid),
            "paid" => Ok(PenaltyPaymentStatus::Paid),
            _ => Err(format!("Unknown penalty payment status: {}", s)),
        }
    }
}

/// A charge against a user, tracked until externally-verified payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Penalty {
    pub id: PenaltyId,
    pub booking_id: BookingId,
    pub reason: PenaltyReason,
    pub penalty_amount: Money,
    pub payment_status: PenaltyPaymentStatus,
    /// Gateway payment reference once paid
    pub gateway_payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Penalty {
    pub fn new(
        booking_id: BookingId,
        reason: PenaltyReason,
        penalty_amount: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            reason,
            penalty_amount,
            payment_status: PenaltyPaymentStatus::Unpaid,
            gateway_payment_id: None,
            created_at: now,
        }
    }
}

/// Payout progress: pending -> processing -> claimed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processing,
    Claimed,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Processing => "processing",
            PayoutStatus::Claimed => "claimed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(PayoutStatus::Pending),
            "processing" => Ok(PayoutStatus::Processing),
            "claimed" => Ok(PayoutStatus::Claimed),
            _ => Err(format!("Unknown payout status: {}", s)),
        }
    }
}

/// The owner's net earning for a completed booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub booking_id: BookingId,
    pub car_id: CarId,
    pub price_per_hour: Money,
    pub total_hours: u32,
    pub late_charge: Money,
    /// Coupon percentage the owner absorbed
    pub coupon_discount_percentage: u8,
    pub payout_amount: Money,
    pub status: PayoutStatus,
    pub destination: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refund_starts_pending_and_unclaimed() {
        let refund = Refund::new(
            Uuid::new_v4(),
            RefundReason::CancelledByUser,
            Money::new(668).unwrap(),
            Money::new(152).unwrap(),
            Some("cancellation charges".to_string()),
            Utc::now(),
        );
        assert_eq!(refund.status, RefundStatus::Pending);
        assert!(refund.destination.is_none());
    }

    #[test]
    fn penalty_starts_unpaid() {
        let penalty = Penalty::new(
            Uuid::new_v4(),
            PenaltyReason::LateReturn,
            Money::new(200).unwrap(),
            Utc::now(),
        );
        assert_eq!(penalty.payment_status, PenaltyPaymentStatus::Unpaid);
        assert!(penalty.gateway_payment_id.is_none());
    }

    #[test]
    fn enums_round_trip_through_strings() {
        for reason in [
            RefundReason::Refundable,
            RefundReason::CancelledByOwner,
            RefundReason::CancelledByUser,
        ] {
            assert_eq!(RefundReason::from_str(reason.as_str()).unwrap(), reason);
        }
        for status in [PayoutStatus::Pending, PayoutStatus::Processing, PayoutStatus::Claimed] {
            assert_eq!(PayoutStatus::from_str(status.as_str()).unwrap(), status);
        }
    }
}
