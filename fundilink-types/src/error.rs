//! Error types for the payments service.

use crate::domain::BookingId;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Amount must be a positive integer, got {0}")]
    NonPositiveAmount(i64),

    #[error("Booking {0} is already claimed")]
    AlreadyClaimed(BookingId),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Errors from the payment gateway boundary.
///
/// `Auth` means the gateway rejected our credentials or token; it is never
/// retried automatically since repeated bad-credential calls can trigger
/// provider throttling.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Gateway authentication failed: {0}")]
    Auth(String),

    #[error("Gateway request failed: {0}")]
    Http(String),

    #[error("Gateway rejected request ({code}): {description}")]
    Rejected { code: String, description: String },

    #[error("Unexpected gateway response: {0}")]
    Malformed(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream gateway error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => AppError::BadRequest(e.to_string()),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::BadRequest(e),
        }
    }
}
