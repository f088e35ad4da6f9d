//! Booking lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::car::{CarId, UserId};
use crate::error::{Result, WheelbaseError};
use crate::money::Money;

/// Unique identifier for a booking
pub type BookingId = Uuid;

/// State of a booking in its lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Payment verified, car reserved, handover pending
    Booked,
    /// Renter holds the car
    PickedUp,
    /// Car returned, settlement triggered
    Completed,
    /// Renter cancelled before pickup
    CancelledByUser,
    /// Owner cancelled before pickup
    CancelledByOwner,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Booked => "booked",
            BookingStatus::PickedUp => "picked_up",
            BookingStatus::Completed => "completed",
            BookingStatus::CancelledByUser => "cancelled_by_user",
            BookingStatus::CancelledByOwner => "cancelled_by_owner",
        }
    }

    pub fn from_str(s: &str) -> std::result::Result<Self, String> {
        match s {
            "booked" => Ok(BookingStatus::Booked),
            "picked_up" => Ok(BookingStatus::PickedUp),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled_by_user" => Ok(BookingStatus::CancelledByUser),
            "cancelled_by_owner" => Ok(BookingStatus::CancelledByOwner),
            _ => Err(format!("Unknown booking status: {}", s)),
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed
                | BookingStatus::CancelledByUser
                | BookingStatus::CancelledByOwner
        )
    }

    /// Active bookings hold the car's slot for overlap checks.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Booked | BookingStatus::PickedUp)
    }
}

/// Single-use 4-digit handover code, distinct from login OTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Otp(String);

impl Otp {
    /// Generate a fresh 4-digit code from UUID entropy.
    pub fn generate() -> Self {
        let uuid = Uuid::new_v4();
        let bytes = uuid.as_bytes();
        let seed = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Otp(format!("{:04}", seed % 10_000))
    }

    pub fn matches(&self, supplied: &str) -> bool {
        self.0 == supplied.trim()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Otp {
    fn from(code: String) -> Self {
        Otp(code)
    }
}

/// Photo evidence captured at handover: front and rear are mandatory,
/// the remaining angles are best effort
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoSet {
    pub front: String,
    pub rear: String,
    pub left: Option<String>,
    pub right: Option<String>,
    pub interior: Option<String>,
}

impl PhotoSet {
    pub fn validate(&self) -> Result<()> {
        if self.front.trim().is_empty() {
            return Err(WheelbaseError::Validation(
                "front photo evidence is required".to_string(),
            ));
        }
        if self.rear.trim().is_empty() {
            return Err(WheelbaseError::Validation(
                "rear photo evidence is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// A coupon reserved against a draft booking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedCoupon {
    pub coupon_id: Uuid,
    pub code: String,
    pub discount_percentage: u8,
    pub discount_amount: Money,
}

/// A priced-but-unconfirmed booking context, held by the caller until
/// payment succeeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDraft {
    pub car_id: CarId,
    pub owner_id: UserId,
    pub renter_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Rate snapshot taken when the draft was priced
    pub price_per_hour: Money,
    pub total_hours: u32,
    pub sub_amount: Money,
    pub security_deposit: Money,
    pub coupon: Option<AppliedCoupon>,
}

impl BookingDraft {
    pub fn discount_amount(&self) -> Money {
        self.coupon
            .as_ref()
            .map(|c| c.discount_amount)
            .unwrap_or(Money::ZERO)
    }

    /// `main = max(sub - discount, 0)`
    pub fn main_amount(&self) -> Money {
        self.sub_amount.saturating_sub(self.discount_amount())
    }

    /// `total = main + deposit`
    pub fn total_amount(&self) -> Result<Money> {
        self.main_amount().checked_add(self.security_deposit)
    }
}

/// A confirmed booking. Created only after payment verification; never
/// deleted. Price fields are immutable once the status leaves `Booked`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub car_id: CarId,
    pub owner_id: UserId,
    pub renter_id: UserId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_hours: u32,
    /// Rate snapshot at booking time, never recomputed from the live car
    pub price_per_hour: Money,
    pub discount_amount: Money,
    pub main_amount: Money,
    pub security_deposit: Money,
    pub total_amount: Money,
    pub coupon_id: Option<Uuid>,
    /// Gateway payment reference that confirmed this booking
    pub payment_id: String,
    pub pickup_otp: Otp,
    pub drop_otp: Otp,
    pub pickup_time: Option<DateTime<Utc>>,
    pub drop_time: Option<DateTime<Utc>>,
    pub before_photos: Option<PhotoSet>,
    pub after_photos: Option<PhotoSet>,
    pub status: BookingStatus,
    pub late_fees_charged: bool,
    pub late_fees_amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Materialise a verified draft into a booking with fresh handover OTPs.
    pub fn from_draft(draft: &BookingDraft, payment_id: String, now: DateTime<Utc>) -> Result<Self> {
        let main_amount = draft.main_amount();
        let total_amount = draft.total_amount()?;
        Ok(Self {
            id: Uuid::new_v4(),
            car_id: draft.car_id,
            owner_id: draft.owner_id,
            renter_id: draft.renter_id,
            start: draft.start,
            end: draft.end,
            total_hours: draft.total_hours,
            price_per_hour: draft.price_per_hour,
            discount_amount: draft.discount_amount(),
            main_amount,
            security_deposit: draft.security_deposit,
            total_amount,
            coupon_id: draft.coupon.as_ref().map(|c| c.coupon_id),
            payment_id,
            pickup_otp: Otp::generate(),
            drop_otp: Otp::generate(),
            pickup_time: None,
            drop_time: None,
            before_photos: None,
            after_photos: None,
            status: BookingStatus::Booked,
            late_fees_charged: false,
            late_fees_amount: Money::ZERO,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn coupon_discount_percentage(&self) -> u8 {
        if self.sub_amount().is_zero() || self.discount_amount.is_zero() {
            return 0;
        }
        // Reconstructed from amounts; the snapshot keeps this exact for
        // whole-percent coupons
        ((self.discount_amount.major_units() * 100) / self.sub_amount().major_units()) as u8
    }

    fn sub_amount(&self) -> Money {
        // sub = main + discount, by construction
        Money::new(self.main_amount.major_units() + self.discount_amount.major_units())
            .unwrap_or(Money::ZERO)
    }

    pub fn mark_picked_up(&mut self, photos: PhotoSet, now: DateTime<Utc>) {
        self.status = BookingStatus::PickedUp;
        self.pickup_time = Some(now);
        self.before_photos = Some(photos);
        self.updated_at = now;
    }

    pub fn mark_completed(&mut self, photos: PhotoSet, late_fee: Option<Money>, now: DateTime<Utc>) {
        self.status = BookingStatus::Completed;
        self.drop_time = Some(now);
        self.after_photos = Some(photos);
        if let Some(fee) = late_fee {
            self.late_fees_charged = true;
            self.late_fees_amount = fee;
        }
        self.updated_at = now;
    }

    pub fn mark_cancelled(&mut self, status: BookingStatus, now: DateTime<Utc>) {
        self.status = status;
        self.updated_at = now;
    }
}
