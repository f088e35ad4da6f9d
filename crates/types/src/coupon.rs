//! Coupon types
//!
//! Consumption is two-phase: a coupon is reserved when applied to a draft
//! and only burned when the booking is confirmed, so an abandoned draft
//! releases it instead of losing it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::car::UserId;

/// Unique identifier for a coupon
pub type CouponId = Uuid;

/// Sentinel returned by the external coupon lookup for an unknown code.
/// Always interpreted as "not found", never as a -1% discount.
pub const COUPON_NOT_FOUND_SENTINEL: i64 = -1;

/// Two-phase consumption state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CouponState {
    /// Issued and unspent
    Available,
    /// Applied to a draft booking, not yet burned
    Reserved,
    /// Burned at booking confirmation; cannot be reapplied
    Used,
}

impl CouponState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponState::Available => "available",
            CouponState::Reserved => "reserved",
            CouponState::Used => "used",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "available" => Ok(CouponState::Available),
            "reserved" => Ok(CouponState::Reserved),
            "used" => Ok(CouponState::Used),
            _ => Err(format!("Unknown coupon state: {}", s)),
        }
    }
}

/// A single-use percentage discount issued to a renter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    /// Percentage in (0, 100]
    pub discount_percentage: u8,
    /// Why the coupon was issued, e.g. compensation for an owner-cancelled
    /// trip
    pub issued_for: Option<String>,
    /// Renter the coupon belongs to
    pub renter_id: UserId,
    pub state: CouponState,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Issue a compensation coupon for a cancelled trip.
    pub fn compensation(
        renter_id: UserId,
        discount_percentage: u8,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Self {
        let uuid = Uuid::new_v4();
        // Short human-shareable code derived from the id
        let suffix: String = uuid
            .simple()
            .to_string()
            .chars()
            .take(8)
            .collect::<String>()
            .to_uppercase();
        Self {
            id: uuid,
            code: format!("COMP-{}", suffix),
            discount_percentage,
            issued_for: Some(format!("owner cancelled booking {}", booking_id)),
            renter_id,
            state: CouponState::Available,
            created_at: now,
        }
    }
}
