//! SQLite ledger adapter.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use fundilink_types::{
    AttemptId, Booking, BookingId, FundiId, PaymentAttempt, PaymentConfirmation, PaymentLedger,
    RepoError, TrackingPair,
};

use crate::types::{DbAttempt, DbBooking};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite ledger implementation.
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Creates a new SQLite ledger with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            // Remove query parameters
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_payment_attempts.sql");
        sqlx::query(ddl).execute(&pool).await?;

        let ddl_bookings = include_str!("../migrations/0002_create_bookings.sql");
        sqlx::query(ddl_bookings).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const ATTEMPT_COLUMNS: &str = "id, merchant_request_id, checkout_request_id, phone, amount, \
     booking_id, status, result_code, result_description, receipt_number, amount_confirmed, \
     confirmed_phone, created_at, resolved_at";

const BOOKING_COLUMNS: &str =
    "id, client_name, phone, location, message, claimed, fundi_id, paid_by_fundi, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// Ledger implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentLedger for SqliteLedger {
    async fn create_attempt(&self, attempt: PaymentAttempt) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payment_attempts
               (id, merchant_request_id, checkout_request_id, phone, amount, booking_id, status, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(attempt.id.to_string())
        .bind(&attempt.tracking.merchant_request_id)
        .bind(&attempt.tracking.checkout_request_id)
        .bind(attempt.phone.as_str())
        .bind(attempt.amount)
        .bind(attempt.booking_id.map(|id| id.to_string()))
        .bind(attempt.status.to_string())
        .bind(attempt.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<PaymentAttempt>, RepoError> {
        let row: Option<DbAttempt> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbAttempt::into_domain).transpose()
    }

    async fn find_by_tracking(
        &self,
        tracking: &TrackingPair,
    ) -> Result<Option<PaymentAttempt>, RepoError> {
        let row: Option<DbAttempt> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts
             WHERE merchant_request_id = ? AND checkout_request_id = ?"
        ))
        .bind(&tracking.merchant_request_id)
        .bind(&tracking.checkout_request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbAttempt::into_domain).transpose()
    }

    async fn list_attempts(&self) -> Result<Vec<PaymentAttempt>, RepoError> {
        let rows: Vec<DbAttempt> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbAttempt::into_domain).collect()
    }

    async fn mark_succeeded(
        &self,
        tracking: &TrackingPair,
        confirmation: PaymentConfirmation,
    ) -> Result<bool, RepoError> {
        // The status guard makes the transition conditional: a duplicate or
        // concurrent callback matches zero rows instead of re-applying.
        let result = sqlx::query(
            r#"UPDATE payment_attempts
               SET status = 'SUCCEEDED', result_code = 0, result_description = ?,
                   receipt_number = ?, amount_confirmed = ?, confirmed_phone = ?, resolved_at = ?
               WHERE merchant_request_id = ? AND checkout_request_id = ? AND status = 'PENDING'"#,
        )
        .bind(&confirmation.result_description)
        .bind(&confirmation.receipt_number)
        .bind(confirmation.amount_confirmed)
        .bind(&confirmation.confirmed_phone)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&tracking.merchant_request_id)
        .bind(&tracking.checkout_request_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(
        &self,
        tracking: &TrackingPair,
        result_code: i64,
        result_description: &str,
    ) -> Result<bool, RepoError> {
        let result = sqlx::query(
            r#"UPDATE payment_attempts
               SET status = 'FAILED', result_code = ?, result_description = ?, resolved_at = ?
               WHERE merchant_request_id = ? AND checkout_request_id = ? AND status = 'PENDING'"#,
        )
        .bind(result_code)
        .bind(result_description)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(&tracking.merchant_request_id)
        .bind(&tracking.checkout_request_id)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_booking(&self, booking: Booking) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO bookings
               (id, client_name, phone, location, message, claimed, fundi_id, paid_by_fundi, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(booking.id.to_string())
        .bind(&booking.client_name)
        .bind(booking.phone.as_str())
        .bind(&booking.location)
        .bind(&booking.message)
        .bind(booking.claimed)
        .bind(booking.fundi_id.map(|id| id.to_string()))
        .bind(booking.paid_by_fundi)
        .bind(booking.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, RepoError> {
        let row: Option<DbBooking> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbBooking::into_domain).transpose()
    }

    async fn list_bookings(&self) -> Result<Vec<Booking>, RepoError> {
        let rows: Vec<DbBooking> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        rows.into_iter().map(DbBooking::into_domain).collect()
    }

    async fn claim_booking(&self, id: BookingId, fundi: FundiId) -> Result<Booking, RepoError> {
        let result = sqlx::query(
            r#"UPDATE bookings SET claimed = 1, fundi_id = ? WHERE id = ? AND claimed = 0"#,
        )
        .bind(fundi.to_string())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Distinguish "missing" from "already claimed".
            return match self.get_booking(id).await? {
                Some(_) => Err(RepoError::Conflict(format!(
                    "Booking {} is already claimed",
                    id
                ))),
                None => Err(RepoError::NotFound),
            };
        }

        self.get_booking(id).await?.ok_or(RepoError::NotFound)
    }

    async fn mark_booking_paid(&self, id: BookingId) -> Result<(), RepoError> {
        let result = sqlx::query(r#"UPDATE bookings SET paid_by_fundi = 1 WHERE id = ?"#)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
