//! Payment ledger port trait.
//!
//! This is the primary port in our hexagonal architecture.
//! Adapters (Postgres, SQLite, InMemory) will implement this trait.

use crate::domain::{
    AttemptId, Booking, BookingId, FundiId, PaymentAttempt, PaymentConfirmation, TrackingPair,
};
use crate::error::RepoError;

/// The durable record of issued and completed payment attempts, plus the
/// bookings they may settle.
///
/// State transitions MUST be conditional on the row still being `PENDING`
/// so that duplicate or concurrent callbacks produce at most one terminal
/// transition per attempt.
#[async_trait::async_trait]
pub trait PaymentLedger: Send + Sync + 'static {
    // ─────────────────────────────────────────────────────────────────────────
    // Attempt Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Records a freshly submitted attempt (always `Pending`).
    async fn create_attempt(&self, attempt: PaymentAttempt) -> Result<(), RepoError>;

    /// Gets an attempt by its ledger id.
    async fn get_attempt(&self, id: AttemptId) -> Result<Option<PaymentAttempt>, RepoError>;

    /// Looks up an attempt by the gateway-assigned tracking pair.
    async fn find_by_tracking(
        &self,
        tracking: &TrackingPair,
    ) -> Result<Option<PaymentAttempt>, RepoError>;

    /// Lists all attempts, newest first.
    async fn list_attempts(&self) -> Result<Vec<PaymentAttempt>, RepoError>;

    /// Transitions a `Pending` attempt to `Succeeded`.
    ///
    /// Returns `Ok(true)` if the transition happened, `Ok(false)` if the
    /// attempt was missing or already terminal (idempotent no-op).
    async fn mark_succeeded(
        &self,
        tracking: &TrackingPair,
        confirmation: PaymentConfirmation,
    ) -> Result<bool, RepoError>;

    /// Transitions a `Pending` attempt to `Failed`, with the same
    /// conditional semantics as [`PaymentLedger::mark_succeeded`].
    async fn mark_failed(
        &self,
        tracking: &TrackingPair,
        result_code: i64,
        result_description: &str,
    ) -> Result<bool, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────
    // Booking Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Stores a new booking.
    async fn create_booking(&self, booking: Booking) -> Result<(), RepoError>;

    /// Gets a booking by ID.
    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, RepoError>;

    /// Lists all bookings, newest first.
    async fn list_bookings(&self) -> Result<Vec<Booking>, RepoError>;

    /// Claims an unclaimed booking for a fundi.
    ///
    /// Fails with `RepoError::Conflict` if already claimed, or
    /// `RepoError::NotFound` if the booking does not exist.
    async fn claim_booking(&self, id: BookingId, fundi: FundiId) -> Result<Booking, RepoError>;

    /// Sets `paid_by_fundi = true`. One-way and idempotent.
    async fn mark_booking_paid(&self, id: BookingId) -> Result<(), RepoError>;
}
