//! Car listing types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::Money;

/// Unique identifier for a car listing
pub type CarId = Uuid;

/// Unique identifier for a marketplace user (owner or renter)
pub type UserId = Uuid;

/// Verification state of a listing, mutated by employees/admins outside
/// this engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    InProcess,
    Approved,
    Rejected,
}

/// Street address plus coordinates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A car listed on the marketplace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Car {
    /// Unique car identifier
    pub id: CarId,
    /// Owning user
    pub owner_id: UserId,
    /// Hourly rental rate
    pub price_per_hour: Money,
    /// Pickup location
    pub location: Location,
    /// Whether the owner has the listing visible
    pub visible: bool,
    /// Admin verification state
    pub verification: VerificationStatus,
    /// Listing creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Car {
    /// Whether the car can currently accept bookings.
    pub fn is_bookable(&self) -> bool {
        self.visible && self.verification == VerificationStatus::Approved
    }
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::InProcess => "in_process",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "in_process" => Ok(VerificationStatus::InProcess),
            "approved" => Ok(VerificationStatus::Approved),
            "rejected" => Ok(VerificationStatus::Rejected),
            _ => Err(format!("Unknown verification status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(visible: bool, verification: VerificationStatus) -> Car {
        Car {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            price_per_hour: Money::new(100).unwrap(),
            location: Location {
                address: "12 MG Road, Bengaluru".to_string(),
                latitude: 12.9716,
                longitude: 77.5946,
            },
            visible,
            verification,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn only_visible_approved_cars_are_bookable() {
        assert!(car(true, VerificationStatus::Approved).is_bookable());
        assert!(!car(false, VerificationStatus::Approved).is_bookable());
        assert!(!car(true, VerificationStatus::Pending).is_bookable());
        assert!(!car(true, VerificationStatus::Rejected).is_bookable());
    }
}
