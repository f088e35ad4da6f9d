//! Shared fixtures for engine tests

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use gateway::PaymentGateway;
use types::{
    BookingDraft, Car, Coupon, CouponState, Location, Money, PaymentOrder, PaymentProof,
    PhotoSet, Result, UserId, VerificationStatus, WheelbaseError,
};

use crate::db::Database;
use crate::storage::{CarStore, CouponStore, SqliteStores};

pub async fn in_memory_stores() -> Arc<SqliteStores> {
    let db = Database::new_in_memory().await.unwrap();
    Arc::new(SqliteStores::new(db))
}

/// Gateway double: hands out sequential order ids and verifies anything
/// unless told to reject
pub struct MockGateway {
    pub reject_verification: bool,
    pub fail_orders: bool,
    orders: AtomicU32,
}

impl MockGateway {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self {
            reject_verification: false,
            fail_orders: false,
            orders: AtomicU32::new(0),
        })
    }

    pub fn rejecting_verification() -> Arc<Self> {
        Arc::new(Self {
            reject_verification: true,
            fail_orders: false,
            orders: AtomicU32::new(0),
        })
    }

    pub fn orders_created(&self) -> u32 {
        self.orders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        _receipt: &str,
    ) -> Result<PaymentOrder> {
        if self.fail_orders {
            return Err(WheelbaseError::Gateway {
                service: "payments".to_string(),
                message: "HTTP error: 502".to_string(),
            });
        }
        let n = self.orders.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentOrder {
            order_id: format!("order_{}", n),
            amount: amount_minor_units,
            currency: currency.to_string(),
        })
    }

    async fn verify_payment(&self, proof: &PaymentProof) -> Result<()> {
        if self.reject_verification {
            return Err(WheelbaseError::VerificationFailed(format!(
                "signature mismatch for {}",
                proof.payment_id
            )));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<std::time::Duration> {
        Ok(std::time::Duration::from_millis(1))
    }
}

/// An approved, visible car owned by a fresh user
pub async fn approved_car(stores: &SqliteStores, rate: i64) -> Car {
    let car = Car {
        id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        price_per_hour: Money::new(rate).unwrap(),
        location: Location {
            address: "4 Residency Road, Bengaluru".to_string(),
            latitude: 12.9719,
            longitude: 77.6062,
        },
        visible: true,
        verification: VerificationStatus::Approved,
        created_at: Utc::now(),
    };
    stores.insert_car(&car).await.unwrap();
    car
}

/// A draft priced by hand: `hours` hours at `rate`, deposit 5x
pub fn draft_for(renter_id: UserId, rate: i64, hours: u32) -> BookingDraft {
    let start = Utc::now() + Duration::days(10);
    BookingDraft {
        car_id: Uuid::new_v4(),
        owner_id: Uuid::new_v4(),
        renter_id,
        start,
        end: start + Duration::hours(i64::from(hours)),
        price_per_hour: Money::new(rate).unwrap(),
        total_hours: hours,
        sub_amount: Money::new(rate * i64::from(hours)).unwrap(),
        security_deposit: Money::new(rate * 5).unwrap(),
        coupon: None,
    }
}

pub async fn issued_coupon(stores: &SqliteStores, code: &str, percentage: u8, renter: UserId) {
    let coupon = Coupon {
        id: Uuid::new_v4(),
        code: code.to_string(),
        discount_percentage: percentage,
        issued_for: None,
        renter_id: renter,
        state: CouponState::Available,
        created_at: Utc::now(),
    };
    stores.insert_coupon(&coupon).await.unwrap();
}

pub fn handover_photos() -> PhotoSet {
    PhotoSet {
        front: "https://cdn.test/front.jpg".to_string(),
        rear: "https://cdn.test/rear.jpg".to_string(),
        left: Some("https://cdn.test/left.jpg".to_string()),
        right: None,
        interior: None,
    }
}
