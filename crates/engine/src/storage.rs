//! Persistent store operations
//!
//! Trait seams over SQLite. Every single-use transition (coupon burn,
//! claim, state change) is a single UPDATE guarded by a state predicate
//! and checked via `rows_affected`, so concurrent callers cannot both
//! win. The booking overlap check and insert share one transaction;
//! SQLite serializes writers, which makes the check-and-insert atomic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use types::{
    Booking, BookingId, BookingStatus, Car, CarId, Coupon, CouponId, CouponState, Location,
    Money, Payout, PayoutId, PayoutStatus, Penalty, PenaltyId, PenaltyPaymentStatus,
    PenaltyReason, PhotoSet, Refund, RefundId, RefundReason, RefundStatus, Result,
    StorageError, UserId, VerificationStatus, WheelbaseError, COUPON_NOT_FOUND_SENTINEL,
};

use crate::db::Database;

/// Car listing storage
#[async_trait]
pub trait CarStore: Send + Sync {
    async fn insert_car(&self, car: &Car) -> Result<()>;

    async fn get_car(&self, id: CarId) -> Result<Option<Car>>;
}

/// Booking storage
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Transactional check-and-insert enforcing the one-active-booking
    /// invariant, optionally burning the reserved coupon in the same
    /// transaction. Fails with `SlotUnavailable` on overlap and
    /// `AlreadyUsed` when the coupon is no longer reserved; either way
    /// nothing is written.
    async fn insert_booking_if_free(
        &self,
        booking: &Booking,
        commit_coupon: Option<CouponId>,
    ) -> Result<()>;

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>>;

    /// Persist a pickup, succeeding only if the row is still `booked`.
    async fn record_pickup(&self, booking: &Booking) -> Result<bool>;

    /// Persist a drop, succeeding only if the row is still `picked_up`.
    async fn record_drop(&self, booking: &Booking) -> Result<bool>;

    /// Persist a cancellation, succeeding only if the row is still
    /// `booked`.
    async fn record_cancellation(&self, booking: &Booking) -> Result<bool>;

    /// Charge a late fee exactly once per booking.
    async fn mark_late_fee_charged(
        &self,
        id: BookingId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<bool>;

    /// Picked-up bookings whose scheduled end passed the cutoff and which
    /// have not yet been charged a late fee.
    async fn list_overdue_pickups(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>>;
}

/// Coupon storage; also plays the part of the external coupon lookup
#[async_trait]
pub trait CouponStore: Send + Sync {
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()>;

    /// Raw lookup in the collaborator's convention: the discount
    /// percentage, or -1 when the code is unknown.
    async fn lookup_discount(&self, code: &str) -> Result<i64>;

    async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>>;

    /// CAS available -> reserved for the owning renter.
    async fn reserve(&self, code: &str, renter_id: UserId) -> Result<bool>;

    /// CAS reserved -> available, for abandoned drafts.
    async fn release(&self, id: CouponId) -> Result<bool>;
}

/// Refund, penalty and payout storage
#[async_trait]
pub trait SettlementStore: Send + Sync {
    async fn insert_refund(&self, refund: &Refund) -> Result<()>;
    async fn get_refund(&self, id: RefundId) -> Result<Option<Refund>>;
    /// CAS pending -> processing, recording the payout destination.
    async fn claim_refund(&self, id: RefundId, destination: &str) -> Result<bool>;
    /// CAS processing -> completed, driven by external settlement.
    async fn complete_refund(&self, id: RefundId) -> Result<bool>;

    async fn insert_penalty(&self, penalty: &Penalty) -> Result<()>;
    async fn get_penalty(&self, id: PenaltyId) -> Result<Option<Penalty>>;
    /// CAS unpaid -> paid, recording the gateway payment reference.
    async fn mark_penalty_paid(&self, id: PenaltyId, gateway_payment_id: &str) -> Result<bool>;

    async fn insert_payout(&self, payout: &Payout) -> Result<()>;
    async fn get_payout(&self, id: PayoutId) -> Result<Option<Payout>>;
    /// CAS pending -> processing, recording the payout destination.
    async fn claim_payout(&self, id: PayoutId, destination: &str) -> Result<bool>;
    /// CAS processing -> claimed, driven by external settlement.
    async fn settle_payout(&self, id: PayoutId) -> Result<bool>;
}

/// SQLite implementation of all stores
#[derive(Debug, Clone)]
pub struct SqliteStores {
    db: Database,
}

impl SqliteStores {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn db_err(e: sqlx::Error) -> WheelbaseError {
    StorageError::QueryFailed(e.to_string()).into()
}

fn parse_uuid(s: &str, table: &str) -> Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| WheelbaseError::Database(format!("corrupt id in {}: {}", table, e)))
}

fn money_from(v: i64, column: &str) -> Result<Money> {
    Money::new(v)
        .map_err(|_| WheelbaseError::Database(format!("negative amount in {}: {}", column, v)))
}

fn photos_to_json(photos: &Option<PhotoSet>) -> Result<Option<String>> {
    photos
        .as_ref()
        .map(|p| {
            serde_json::to_string(p)
                .map_err(|e| WheelbaseError::Internal(format!("photo encoding failed: {}", e)))
        })
        .transpose()
}

fn photos_from_json(json: Option<String>) -> Result<Option<PhotoSet>> {
    json.map(|s| {
        serde_json::from_str(&s)
            .map_err(|e| WheelbaseError::Database(format!("corrupt photo set: {}", e)))
    })
    .transpose()
}

fn booking_from_row(row: &SqliteRow) -> Result<Booking> {
    let status = BookingStatus::from_str(&row.get::<String, _>("status"))
        .map_err(WheelbaseError::Database)?;
    Ok(Booking {
        id: parse_uuid(&row.get::<String, _>("id"), "bookings")?,
        car_id: parse_uuid(&row.get::<String, _>("car_id"), "bookings")?,
        owner_id: parse_uuid(&row.get::<String, _>("owner_id"), "bookings")?,
        renter_id: parse_uuid(&row.get::<String, _>("renter_id"), "bookings")?,
        start: row.get("start_datetime"),
        end: row.get("end_datetime"),
        total_hours: row.get::<i64, _>("total_hours") as u32,
        price_per_hour: money_from(row.get("price_per_hour"), "price_per_hour")?,
        discount_amount: money_from(row.get("discount_amount"), "discount_amount")?,
        main_amount: money_from(row.get("main_amount"), "main_amount")?,
        security_deposit: money_from(row.get("security_deposit"), "security_deposit")?,
        total_amount: money_from(row.get("total_amount"), "total_amount")?,
        coupon_id: row
            .get::<Option<String>, _>("coupon_id")
            .map(|s| parse_uuid(&s, "bookings"))
            .transpose()?,
        payment_id: row.get("payment_id"),
        pickup_otp: types::Otp::from(row.get::<String, _>("pickup_otp")),
        drop_otp: types::Otp::from(row.get::<String, _>("drop_otp")),
        pickup_time: row.get("pickup_time"),
        drop_time: row.get("drop_time"),
        before_photos: photos_from_json(row.get("before_photos"))?,
        after_photos: photos_from_json(row.get("after_photos"))?,
        status,
        late_fees_charged: row.get("late_fees_charged"),
        late_fees_amount: money_from(row.get("late_fees_amount"), "late_fees_amount")?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn coupon_from_row(row: &SqliteRow) -> Result<Coupon> {
    let state = CouponState::from_str(&row.get::<String, _>("state"))
        .map_err(WheelbaseError::Database)?;
    Ok(Coupon {
        id: parse_uuid(&row.get::<String, _>("id"), "coupons")?,
        code: row.get("code"),
        discount_percentage: row.get::<i64, _>("discount_percentage") as u8,
        issued_for: row.get("issued_for"),
        renter_id: parse_uuid(&row.get::<String, _>("renter_id"), "coupons")?,
        state,
        created_at: row.get("created_at"),
    })
}

fn refund_from_row(row: &SqliteRow) -> Result<Refund> {
    Ok(Refund {
        id: parse_uuid(&row.get::<String, _>("id"), "refunds")?,
        booking_id: parse_uuid(&row.get::<String, _>("booking_id"), "refunds")?,
        reason: RefundReason::from_str(&row.get::<String, _>("reason"))
            .map_err(WheelbaseError::Database)?,
        refund_amount: money_from(row.get("refund_amount"), "refund_amount")?,
        deduction_amount: money_from(row.get("deduction_amount"), "deduction_amount")?,
        deduction_reason: row.get("deduction_reason"),
        status: RefundStatus::from_str(&row.get::<String, _>("status"))
            .map_err(WheelbaseError::Database)?,
        destination: row.get("destination"),
        created_at: row.get("created_at"),
    })
}

fn penalty_from_row(row: &SqliteRow) -> Result<Penalty> {
    Ok(Penalty {
        id: parse_uuid(&row.get::<String, _>("id"), "penalties")?,
        booking_id: parse_uuid(&row.get::<String, _>("booking_id"), "penalties")?,
        reason: PenaltyReason::from_str(&row.get::<String, _>("reason"))
            .map_err(WheelbaseError::Database)?,
        penalty_amount: money_from(row.get("penalty_amount"), "penalty_amount")?,
        payment_status: PenaltyPaymentStatus::from_str(&row.get::<String, _>("payment_status"))
            .map_err(WheelbaseError::Database)?,
        gateway_payment_id: row.get("gateway_payment_id"),
        created_at: row.get("created_at"),
    })
}

fn payout_from_row(row: &SqliteRow) -> Result<Payout> {
    Ok(Payout {
        id: parse_uuid(&row.get::<String, _>("id"), "payouts")?,
        booking_id: parse_uuid(&row.get::<String, _>("booking_id"), "payouts")?,
        car_id: parse_uuid(&row.get::<String, _>("car_id"), "payouts")?,
        price_per_hour: money_from(row.get("price_per_hour"), "price_per_hour")?,
        total_hours: row.get::<i64, _>("total_hours") as u32,
        late_charge: money_from(row.get("late_charge"), "late_charge")?,
        coupon_discount_percentage: row.get::<i64, _>("coupon_discount_percentage") as u8,
        payout_amount: money_from(row.get("payout_amount"), "payout_amount")?,
        status: PayoutStatus::from_str(&row.get::<String, _>("status"))
            .map_err(WheelbaseError::Database)?,
        destination: row.get("destination"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl CarStore for SqliteStores {
    async fn insert_car(&self, car: &Car) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO cars (id, owner_id, price_per_hour, address, latitude,
                longitude, visible, verification, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(car.id.to_string())
        .bind(car.owner_id.to_string())
        .bind(car.price_per_hour.major_units())
        .bind(&car.location.address)
        .bind(car.location.latitude)
        .bind(car.location.longitude)
        .bind(car.visible)
        .bind(car.verification.as_str())
        .bind(car.created_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_car(&self, id: CarId) -> Result<Option<Car>> {
        let row = sqlx::query("SELECT * FROM cars WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;

        row.map(|row| {
            Ok(Car {
                id: parse_uuid(&row.get::<String, _>("id"), "cars")?,
                owner_id: parse_uuid(&row.get::<String, _>("owner_id"), "cars")?,
                price_per_hour: money_from(row.get("price_per_hour"), "price_per_hour")?,
                location: Location {
                    address: row.get("address"),
                    latitude: row.get("latitude"),
                    longitude: row.get("longitude"),
                },
                visible: row.get("visible"),
                verification: VerificationStatus::from_str(
                    &row.get::<String, _>("verification"),
                )
                .map_err(WheelbaseError::Database)?,
                created_at: row.get("created_at"),
            })
        })
        .transpose()
    }
}

#[async_trait]
impl BookingStore for SqliteStores {
    async fn insert_booking_if_free(
        &self,
        booking: &Booking,
        commit_coupon: Option<CouponId>,
    ) -> Result<()> {
        let mut tx = self.db.pool().begin().await.map_err(db_err)?;

        // Overlap check against active bookings; the datetime columns all
        // carry the same encoder's formatting, so text comparison orders
        // chronologically
        let overlapping: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt FROM bookings
            WHERE car_id = ?1
              AND status IN ('booked', 'picked_up')
              AND start_datetime < ?2
              AND end_datetime > ?3
            "#,
        )
        .bind(booking.car_id.to_string())
        .bind(booking.end)
        .bind(booking.start)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?
        .get("cnt");

        if overlapping > 0 {
            return Err(WheelbaseError::SlotUnavailable {
                car_id: booking.car_id.to_string(),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO bookings (id, car_id, owner_id, renter_id,
                start_datetime, end_datetime, total_hours, price_per_hour,
                discount_amount, main_amount, security_deposit, total_amount,
                coupon_id, payment_id, pickup_otp, drop_otp, status,
                late_fees_charged, late_fees_amount, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)
            "#,
        )
        .bind(booking.id.to_string())
        .bind(booking.car_id.to_string())
        .bind(booking.owner_id.to_string())
        .bind(booking.renter_id.to_string())
        .bind(booking.start)
        .bind(booking.end)
        .bind(i64::from(booking.total_hours))
        .bind(booking.price_per_hour.major_units())
        .bind(booking.discount_amount.major_units())
        .bind(booking.main_amount.major_units())
        .bind(booking.security_deposit.major_units())
        .bind(booking.total_amount.major_units())
        .bind(booking.coupon_id.map(|id| id.to_string()))
        .bind(&booking.payment_id)
        .bind(booking.pickup_otp.as_str())
        .bind(booking.drop_otp.as_str())
        .bind(booking.status.as_str())
        .bind(booking.late_fees_charged)
        .bind(booking.late_fees_amount.major_units())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if let Some(coupon_id) = commit_coupon {
            let result = sqlx::query(
                "UPDATE coupons SET state = 'used' WHERE id = ?1 AND state = 'reserved'",
            )
            .bind(coupon_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            if result.rows_affected() == 0 {
                // Dropped transaction rolls the booking insert back
                return Err(WheelbaseError::AlreadyUsed {
                    code: coupon_id.to_string(),
                });
            }
        }

        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let row = sqlx::query("SELECT * FROM bookings WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;

        row.map(|row| booking_from_row(&row)).transpose()
    }

    async fn record_pickup(&self, booking: &Booking) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'picked_up', pickup_time = ?2, before_photos = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = 'booked'
            "#,
        )
        .bind(booking.id.to_string())
        .bind(booking.pickup_time)
        .bind(photos_to_json(&booking.before_photos)?)
        .bind(booking.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_drop(&self, booking: &Booking) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'completed', drop_time = ?2, after_photos = ?3,
                late_fees_charged = ?4, late_fees_amount = ?5, updated_at = ?6
            WHERE id = ?1 AND status = 'picked_up'
            "#,
        )
        .bind(booking.id.to_string())
        .bind(booking.drop_time)
        .bind(photos_to_json(&booking.after_photos)?)
        .bind(booking.late_fees_charged)
        .bind(booking.late_fees_amount.major_units())
        .bind(booking.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_cancellation(&self, booking: &Booking) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = ?2, updated_at = ?3
            WHERE id = ?1 AND status = 'booked'
            "#,
        )
        .bind(booking.id.to_string())
        .bind(booking.status.as_str())
        .bind(booking.updated_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_late_fee_charged(
        &self,
        id: BookingId,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET late_fees_charged = 1, late_fees_amount = ?2, updated_at = ?3
            WHERE id = ?1 AND status = 'picked_up' AND late_fees_charged = 0
            "#,
        )
        .bind(id.to_string())
        .bind(amount.major_units())
        .bind(now)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_overdue_pickups(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM bookings
            WHERE status = 'picked_up'
              AND end_datetime < ?1
              AND late_fees_charged = 0
            "#,
        )
        .bind(cutoff)
        .fetch_all(self.db.pool())
        .await
        .map_err(db_err)?;

        rows.iter().map(booking_from_row).collect()
    }
}

#[async_trait]
impl CouponStore for SqliteStores {
    async fn insert_coupon(&self, coupon: &Coupon) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO coupons (id, code, discount_percentage, issued_for,
                renter_id, state, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(coupon.id.to_string())
        .bind(&coupon.code)
        .bind(i64::from(coupon.discount_percentage))
        .bind(&coupon.issued_for)
        .bind(coupon.renter_id.to_string())
        .bind(coupon.state.as_str())
        .bind(coupon.created_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn lookup_discount(&self, code: &str) -> Result<i64> {
        let row = sqlx::query("SELECT discount_percentage FROM coupons WHERE code = ?1")
            .bind(code)
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;

        Ok(row
            .map(|r| r.get::<i64, _>("discount_percentage"))
            .unwrap_or(COUPON_NOT_FOUND_SENTINEL))
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>> {
        let row = sqlx::query("SELECT * FROM coupons WHERE code = ?1")
            .bind(code)
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;

        row.map(|row| coupon_from_row(&row)).transpose()
    }

    async fn reserve(&self, code: &str, renter_id: UserId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE coupons SET state = 'reserved'
            WHERE code = ?1 AND renter_id = ?2 AND state = 'available'
            "#,
        )
        .bind(code)
        .bind(renter_id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, id: CouponId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE coupons SET state = 'available' WHERE id = ?1 AND state = 'reserved'",
        )
        .bind(id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SettlementStore for SqliteStores {
    async fn insert_refund(&self, refund: &Refund) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO refunds (id, booking_id, reason, refund_amount,
                deduction_amount, deduction_reason, status, destination,
                created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(refund.id.to_string())
        .bind(refund.booking_id.to_string())
        .bind(refund.reason.as_str())
        .bind(refund.refund_amount.major_units())
        .bind(refund.deduction_amount.major_units())
        .bind(&refund.deduction_reason)
        .bind(refund.status.as_str())
        .bind(&refund.destination)
        .bind(refund.created_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_refund(&self, id: RefundId) -> Result<Option<Refund>> {
        let row = sqlx::query("SELECT * FROM refunds WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;

        row.map(|row| refund_from_row(&row)).transpose()
    }

    async fn claim_refund(&self, id: RefundId, destination: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refunds SET status = 'processing', destination = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id.to_string())
        .bind(destination)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn complete_refund(&self, id: RefundId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE refunds SET status = 'completed' WHERE id = ?1 AND status = 'processing'",
        )
        .bind(id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_penalty(&self, penalty: &Penalty) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO penalties (id, booking_id, reason, penalty_amount,
                payment_status, gateway_payment_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(penalty.id.to_string())
        .bind(penalty.booking_id.to_string())
        .bind(penalty.reason.as_str())
        .bind(penalty.penalty_amount.major_units())
        .bind(penalty.payment_status.as_str())
        .bind(&penalty.gateway_payment_id)
        .bind(penalty.created_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_penalty(&self, id: PenaltyId) -> Result<Option<Penalty>> {
        let row = sqlx::query("SELECT * FROM penalties WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;

        row.map(|row| penalty_from_row(&row)).transpose()
    }

    async fn mark_penalty_paid(&self, id: PenaltyId, gateway_payment_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE penalties SET payment_status = 'paid', gateway_payment_id = ?2
            WHERE id = ?1 AND payment_status = 'unpaid'
            "#,
        )
        .bind(id.to_string())
        .bind(gateway_payment_id)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_payout(&self, payout: &Payout) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payouts (id, booking_id, car_id, price_per_hour,
                total_hours, late_charge, coupon_discount_percentage,
                payout_amount, status, destination, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(payout.id.to_string())
        .bind(payout.booking_id.to_string())
        .bind(payout.car_id.to_string())
        .bind(payout.price_per_hour.major_units())
        .bind(i64::from(payout.total_hours))
        .bind(payout.late_charge.major_units())
        .bind(i64::from(payout.coupon_discount_percentage))
        .bind(payout.payout_amount.major_units())
        .bind(payout.status.as_str())
        .bind(&payout.destination)
        .bind(payout.created_at)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_payout(&self, id: PayoutId) -> Result<Option<Payout>> {
        let row = sqlx::query("SELECT * FROM payouts WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await
            .map_err(db_err)?;

        row.map(|row| payout_from_row(&row)).transpose()
    }

    async fn claim_payout(&self, id: PayoutId, destination: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE payouts SET status = 'processing', destination = ?2
            WHERE id = ?1 AND status = 'pending'
            "#,
        )
        .bind(id.to_string())
        .bind(destination)
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn settle_payout(&self, id: PayoutId) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE payouts SET status = 'claimed' WHERE id = ?1 AND status = 'processing'",
        )
        .bind(id.to_string())
        .execute(self.db.pool())
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}
