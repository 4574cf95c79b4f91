//! PostgreSQL ledger adapter.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use fundilink_types::{
    AttemptId, Booking, BookingId, FundiId, PaymentAttempt, PaymentConfirmation, PaymentLedger,
    RepoError, TrackingPair,
};

use crate::types::{DbAttempt, DbBooking};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Ledger
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL ledger implementation.
pub struct PostgresLedger {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_payment_attempts_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_bookings_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresLedger {
    /// Creates a new PostgreSQL ledger with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
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
impl PaymentLedger for PostgresLedger {
    async fn create_attempt(&self, attempt: PaymentAttempt) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payment_attempts
               (id, merchant_request_id, checkout_request_id, phone, amount, booking_id, status, created_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(attempt.id.into_uuid())
        .bind(&attempt.tracking.merchant_request_id)
        .bind(&attempt.tracking.checkout_request_id)
        .bind(attempt.phone.as_str())
        .bind(attempt.amount)
        .bind(attempt.booking_id.map(BookingId::into_uuid))
        .bind(attempt.status.to_string())
        .bind(attempt.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<Option<PaymentAttempt>, RepoError> {
        let row: Option<DbAttempt> = sqlx::query_as(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM payment_attempts WHERE id = $1"
        ))
        .bind(id.into_uuid())
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
             WHERE merchant_request_id = $1 AND checkout_request_id = $2"
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
               SET status = 'SUCCEEDED', result_code = 0, result_description = $1,
                   receipt_number = $2, amount_confirmed = $3, confirmed_phone = $4, resolved_at = $5
               WHERE merchant_request_id = $6 AND checkout_request_id = $7 AND status = 'PENDING'"#,
        )
        .bind(&confirmation.result_description)
        .bind(&confirmation.receipt_number)
        .bind(confirmation.amount_confirmed)
        .bind(&confirmation.confirmed_phone)
        .bind(Utc::now())
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
               SET status = 'FAILED', result_code = $1, result_description = $2, resolved_at = $3
               WHERE merchant_request_id = $4 AND checkout_request_id = $5 AND status = 'PENDING'"#,
        )
        .bind(result_code)
        .bind(result_description)
        .bind(Utc::now())
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
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
        )
        .bind(booking.id.into_uuid())
        .bind(&booking.client_name)
        .bind(booking.phone.as_str())
        .bind(&booking.location)
        .bind(&booking.message)
        .bind(booking.claimed)
        .bind(booking.fundi_id.map(FundiId::into_uuid))
        .bind(booking.paid_by_fundi)
        .bind(booking.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }

    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, RepoError> {
        let row: Option<DbBooking> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id.into_uuid())
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
            r#"UPDATE bookings SET claimed = TRUE, fundi_id = $1 WHERE id = $2 AND claimed = FALSE"#,
        )
        .bind(fundi.into_uuid())
        .bind(id.into_uuid())
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
        let result = sqlx::query(r#"UPDATE bookings SET paid_by_fundi = TRUE WHERE id = $1"#)
            .bind(id.into_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }
}
