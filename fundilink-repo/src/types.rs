//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use sqlx::FromRow;

use fundilink_types::{
    AttemptId, Booking, BookingId, FundiId, PaymentAttempt, PaymentStatus, PhoneNumber, RepoError,
    TrackingPair,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(not(feature = "sqlite"))]
use chrono::{DateTime, Utc};
#[cfg(not(feature = "sqlite"))]
use uuid::Uuid;

#[cfg(feature = "sqlite")]
fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| RepoError::Database(format!("invalid timestamp '{}': {}", raw, e)))
}

#[cfg(feature = "sqlite")]
fn parse_uuid(raw: &str) -> Result<uuid::Uuid, RepoError> {
    uuid::Uuid::parse_str(raw).map_err(|e| RepoError::Database(format!("invalid uuid: {}", e)))
}

fn parse_status(raw: &str) -> Result<PaymentStatus, RepoError> {
    match raw {
        "PENDING" => Ok(PaymentStatus::Pending),
        "SUCCEEDED" => Ok(PaymentStatus::Succeeded),
        "FAILED" => Ok(PaymentStatus::Failed),
        other => Err(RepoError::Database(format!(
            "unknown payment status '{}'",
            other
        ))),
    }
}

fn parse_phone(raw: &str) -> Result<PhoneNumber, RepoError> {
    PhoneNumber::parse(raw)
        .map_err(|e| RepoError::Database(format!("stored phone failed validation: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Payment attempt row from database.
#[derive(FromRow)]
pub struct DbAttempt {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub merchant_request_id: String,
    pub checkout_request_id: String,
    pub phone: String,
    pub amount: i64,

    #[cfg(not(feature = "sqlite"))]
    pub booking_id: Option<Uuid>,
    #[cfg(feature = "sqlite")]
    pub booking_id: Option<String>,

    pub status: String,
    pub result_code: Option<i64>,
    pub result_description: Option<String>,
    pub receipt_number: Option<String>,
    pub amount_confirmed: Option<i64>,
    pub confirmed_phone: Option<String>,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,

    #[cfg(not(feature = "sqlite"))]
    pub resolved_at: Option<DateTime<Utc>>,
    #[cfg(feature = "sqlite")]
    pub resolved_at: Option<String>,
}

impl DbAttempt {
    pub fn into_domain(self) -> Result<PaymentAttempt, RepoError> {
        let status = parse_status(&self.status)?;
        let phone = parse_phone(&self.phone)?;

        #[cfg(feature = "sqlite")]
        let (id, booking_id, created_at, resolved_at) = (
            AttemptId::from_uuid(parse_uuid(&self.id)?),
            self.booking_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?
                .map(BookingId::from_uuid),
            parse_timestamp(&self.created_at)?,
            self.resolved_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        );

        #[cfg(not(feature = "sqlite"))]
        let (id, booking_id, created_at, resolved_at) = (
            AttemptId::from_uuid(self.id),
            self.booking_id.map(BookingId::from_uuid),
            self.created_at,
            self.resolved_at,
        );

        Ok(PaymentAttempt {
            id,
            tracking: TrackingPair::new(self.merchant_request_id, self.checkout_request_id),
            phone,
            amount: self.amount,
            booking_id,
            status,
            result_code: self.result_code,
            result_description: self.result_description,
            receipt_number: self.receipt_number,
            amount_confirmed: self.amount_confirmed,
            confirmed_phone: self.confirmed_phone,
            created_at,
            resolved_at,
        })
    }
}

/// Booking row from database.
#[derive(FromRow)]
pub struct DbBooking {
    #[cfg(not(feature = "sqlite"))]
    pub id: Uuid,
    #[cfg(feature = "sqlite")]
    pub id: String,

    pub client_name: String,
    pub phone: String,
    pub location: String,
    pub message: Option<String>,
    pub claimed: bool,

    #[cfg(not(feature = "sqlite"))]
    pub fundi_id: Option<Uuid>,
    #[cfg(feature = "sqlite")]
    pub fundi_id: Option<String>,

    pub paid_by_fundi: bool,

    #[cfg(not(feature = "sqlite"))]
    pub created_at: DateTime<Utc>,
    #[cfg(feature = "sqlite")]
    pub created_at: String,
}

impl DbBooking {
    pub fn into_domain(self) -> Result<Booking, RepoError> {
        let phone = parse_phone(&self.phone)?;

        #[cfg(feature = "sqlite")]
        let (id, fundi_id, created_at) = (
            BookingId::from_uuid(parse_uuid(&self.id)?),
            self.fundi_id
                .as_deref()
                .map(parse_uuid)
                .transpose()?
                .map(FundiId::from_uuid),
            parse_timestamp(&self.created_at)?,
        );

        #[cfg(not(feature = "sqlite"))]
        let (id, fundi_id, created_at) = (
            BookingId::from_uuid(self.id),
            self.fundi_id.map(FundiId::from_uuid),
            self.created_at,
        );

        Ok(Booking {
            id,
            client_name: self.client_name,
            phone,
            location: self.location,
            message: self.message,
            claimed: self.claimed,
            fundi_id,
            paid_by_fundi: self.paid_by_fundi,
            created_at,
        })
    }
}
