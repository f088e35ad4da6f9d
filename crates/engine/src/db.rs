//! Database operations and connection management

use config::DatabaseConfig;
use sqlx::{sqlite::SqlitePool, Pool, Sqlite};
use types::{Result, StorageError, WheelbaseError};

/// Database connection manager
#[derive(Debug, Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Create a new database connection
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = SqlitePool::connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(config.url.strip_prefix("sqlite:").unwrap_or(&config.url))
                .create_if_missing(true)
                .busy_timeout(std::time::Duration::from_secs(
                    config.connection_timeout_seconds,
                ))
                .journal_mode(if config.wal_mode {
                    sqlx::sqlite::SqliteJournalMode::Wal
                } else {
                    sqlx::sqlite::SqliteJournalMode::Delete
                }),
        )
        .await
        .map_err(|e| WheelbaseError::from(StorageError::ConnectionFailed(e.to_string())))?;

        Ok(Self { pool })
    }

    /// Create an in-memory database for testing
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePool::connect(":memory:")
            .await
            .map_err(|e| WheelbaseError::from(StorageError::ConnectionFailed(e.to_string())))?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cars (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                price_per_hour INTEGER NOT NULL,
                address TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                visible INTEGER NOT NULL DEFAULT 1,
                verification TEXT NOT NULL DEFAULT 'pending',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(migration_error("cars"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS bookings (
                id TEXT PRIMARY KEY,
                car_id TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                renter_id TEXT NOT NULL,
                start_datetime TEXT NOT NULL,
                end_datetime TEXT NOT NULL,
                total_hours INTEGER NOT NULL,
                price_per_hour INTEGER NOT NULL,
                discount_amount INTEGER NOT NULL DEFAULT 0,
                main_amount INTEGER NOT NULL,
                security_deposit INTEGER NOT NULL,
                total_amount INTEGER NOT NULL,
                coupon_id TEXT,
                payment_id TEXT NOT NULL,
                pickup_otp TEXT NOT NULL,
                drop_otp TEXT NOT NULL,
                pickup_time TEXT,
                drop_time TEXT,
                before_photos TEXT,
                after_photos TEXT,
                status TEXT NOT NULL DEFAULT 'booked',
                late_fees_charged INTEGER NOT NULL DEFAULT 0,
                late_fees_amount INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (car_id) REFERENCES cars(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(migration_error("bookings"))?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_bookings_car_window
            ON bookings(car_id, status, start_datetime, end_datetime)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(migration_error("bookings index"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coupons (
                id TEXT PRIMARY KEY,
                code TEXT NOT NULL UNIQUE,
                discount_percentage INTEGER NOT NULL,
                issued_for TEXT,
                renter_id TEXT NOT NULL,
                state TEXT NOT NULL DEFAULT 'available',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(migration_error("coupons"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS refunds (
                id TEXT PRIMARY KEY,
                booking_id TEXT NOT NULL,
                reason TEXT NOT NULL,
                refund_amount INTEGER NOT NULL,
                deduction_amount INTEGER NOT NULL DEFAULT 0,
                deduction_reason TEXT,
                status TEXT NOT NULL DEFAULT 'pending',
                destination TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (booking_id) REFERENCES bookings(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(migration_error("refunds"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS penalties (
                id TEXT PRIMARY KEY,
                booking_id TEXT NOT NULL,
                reason TEXT NOT NULL,
                penalty_amount INTEGER NOT NULL,
                payment_status TEXT NOT NULL DEFAULT 'unpaid',
                gateway_payment_id TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (booking_id) REFERENCES bookings(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(migration_error("penalties"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payouts (
                id TEXT PRIMARY KEY,
                booking_id TEXT NOT NULL,
                car_id TEXT NOT NULL,
                price_per_hour INTEGER NOT NULL,
                total_hours INTEGER NOT NULL,
                late_charge INTEGER NOT NULL DEFAULT 0,
                coupon_discount_percentage INTEGER NOT NULL DEFAULT 0,
                payout_amount INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending',
                destination TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (booking_id) REFERENCES bookings(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(migration_error("payouts"))?;

        Ok(())
    }

    /// Perform a health check on the database
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| WheelbaseError::Database(format!("health check failed: {}", e)))?;
        Ok(())
    }

    /// Close the database connection
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the database pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

fn migration_error(table: &'static str) -> impl Fn(sqlx::Error) -> WheelbaseError {
    move |e| WheelbaseError::Database(format!("failed to create {} table: {}", table, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new_in_memory().await.unwrap();
        assert!(db.health_check().await.is_ok());
    }

    #[tokio::test]
    async fn test_database_migration() {
        let db = Database::new_in_memory().await.unwrap();

        // Check that tables were created
        let result = sqlx::query("SELECT name FROM sqlite_master WHERE type='table'")
            .fetch_all(db.pool())
            .await
            .unwrap();

        let table_names: Vec<String> = result
            .iter()
            .map(|row| sqlx::Row::get::<String, _>(row, "name"))
            .collect();

        for table in ["cars", "bookings", "coupons", "refunds", "penalties", "payouts"] {
            assert!(table_names.contains(&table.to_string()), "missing {}", table);
        }
    }

    #[tokio::test]
    async fn test_migration_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        assert!(db.migrate().await.is_ok());
        assert!(db.migrate().await.is_ok());
    }
}
