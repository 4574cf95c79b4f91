//! Booking domain model.
//!
//! Bookings themselves are boilerplate CRUD; they appear here because a
//! payment attempt may resolve against one, flipping its `paid_by_fundi`
//! flag exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::phone::PhoneNumber;
use crate::error::DomainError;

/// Unique identifier for a Booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random BookingId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a BookingId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BookingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Unique identifier for a Fundi (service provider).
///
/// Fundi accounts live outside this core; the id is an opaque reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct FundiId(Uuid);

impl FundiId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for FundiId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FundiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for FundiId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A client's request for a fundi's services.
///
/// Invariants:
/// - `claimed == true` implies `fundi_id` is set
/// - `paid_by_fundi` only ever goes `false -> true`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    /// Unique identifier
    pub id: BookingId,
    /// Name of the requesting client
    pub client_name: String,
    /// Client contact phone (normalized)
    pub phone: PhoneNumber,
    /// Where the work is needed
    pub location: String,
    /// Free-form description of the job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether a fundi has claimed this booking
    pub claimed: bool,
    /// The fundi that claimed it, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fundi_id: Option<FundiId>,
    /// Set once a payment attempt against this booking succeeds
    pub paid_by_fundi: bool,
    /// When the booking was created
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a new unclaimed, unpaid booking.
    pub fn new(
        client_name: String,
        phone: PhoneNumber,
        location: String,
        message: Option<String>,
    ) -> Result<Self, DomainError> {
        if client_name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Client name cannot be empty".into(),
            ));
        }
        if location.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Location cannot be empty".into(),
            ));
        }

        Ok(Self {
            id: BookingId::new(),
            client_name,
            phone,
            location,
            message,
            claimed: false,
            fundi_id: None,
            paid_by_fundi: false,
            created_at: Utc::now(),
        })
    }

    /// Claims the booking for a fundi. A booking can only be claimed once.
    pub fn claim(&mut self, fundi: FundiId) -> Result<(), DomainError> {
        if self.claimed {
            return Err(DomainError::AlreadyClaimed(self.id));
        }
        self.claimed = true;
        self.fundi_id = Some(fundi);
        Ok(())
    }

    /// Records a successful payment. Idempotent: the flag never reverses.
    pub fn mark_paid(&mut self) {
        self.paid_by_fundi = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking() -> Booking {
        Booking::new(
            "Wanjiku".into(),
            PhoneNumber::parse("0712345678").unwrap(),
            "Nairobi".into(),
            Some("Leaking sink".into()),
        )
        .unwrap()
    }

    #[test]
    fn test_new_booking_unclaimed() {
        let b = booking();
        assert!(!b.claimed);
        assert!(b.fundi_id.is_none());
        assert!(!b.paid_by_fundi);
    }

    #[test]
    fn test_claim_sets_fundi() {
        let mut b = booking();
        let fundi = FundiId::new();
        b.claim(fundi).unwrap();
        assert!(b.claimed);
        assert_eq!(b.fundi_id, Some(fundi));
    }

    #[test]
    fn test_double_claim_rejected() {
        let mut b = booking();
        b.claim(FundiId::new()).unwrap();
        assert!(b.claim(FundiId::new()).is_err());
    }

    #[test]
    fn test_mark_paid_is_monotonic() {
        let mut b = booking();
        b.mark_paid();
        assert!(b.paid_by_fundi);
        b.mark_paid();
        assert!(b.paid_by_fundi);
    }

    #[test]
    fn test_empty_fields_rejected() {
        let phone = PhoneNumber::parse("0712345678").unwrap();
        assert!(Booking::new("".into(), phone.clone(), "Nairobi".into(), None).is_err());
        assert!(Booking::new("Wanjiku".into(), phone, "  ".into(), None).is_err());
    }
}
