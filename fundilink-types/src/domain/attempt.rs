//! Payment attempt domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::booking::BookingId;
use super::phone::PhoneNumber;

/// Unique identifier for a PaymentAttempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct AttemptId(Uuid);

impl AttemptId {
    /// Creates a new random AttemptId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an AttemptId from an existing UUID.
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

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AttemptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AttemptId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The gateway-assigned identifier pair for one push-payment submission.
///
/// Both halves are assigned by the gateway in the synchronous response and
/// echoed back in the asynchronous callback; together they are the only
/// correlation between the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct TrackingPair {
    /// Gateway-assigned merchant request identifier
    pub merchant_request_id: String,
    /// Gateway-assigned checkout request identifier
    pub checkout_request_id: String,
}

impl TrackingPair {
    pub fn new(merchant_request_id: impl Into<String>, checkout_request_id: impl Into<String>) -> Self {
        Self {
            merchant_request_id: merchant_request_id.into(),
            checkout_request_id: checkout_request_id.into(),
        }
    }
}

/// Lifecycle state of a payment attempt.
///
/// An attempt is created `Pending` and makes at most one transition to a
/// terminal state, driven solely by the gateway callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Push sent, awaiting the gateway callback
    Pending,
    /// Callback reported ResultCode 0
    Succeeded,
    /// Callback reported a non-zero ResultCode
    Failed,
}

impl PaymentStatus {
    /// Whether the attempt has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "PENDING"),
            PaymentStatus::Succeeded => write!(f, "SUCCEEDED"),
            PaymentStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// The durable record of one STK push submission.
///
/// Created in `Pending` state when the gateway accepts the push; resolved
/// exactly once by a matching callback. The initiator and the reconciler
/// communicate only through this record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentAttempt {
    /// Unique identifier
    pub id: AttemptId,
    /// Gateway-assigned tracking pair, used to correlate the callback
    #[serde(flatten)]
    pub tracking: TrackingPair,
    /// Payer phone number (normalized)
    pub phone: PhoneNumber,
    /// Requested amount in the smallest currency unit
    pub amount: i64,
    /// Booking this payment settles, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
    /// Current lifecycle state
    pub status: PaymentStatus,
    /// Gateway result code from the callback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_code: Option<i64>,
    /// Gateway result description, stored verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_description: Option<String>,
    /// M-Pesa receipt number, set only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    /// Amount the gateway confirmed, set only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_confirmed: Option<i64>,
    /// Phone number the gateway confirmed, set only on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_phone: Option<String>,
    /// When the push was submitted
    pub created_at: DateTime<Utc>,
    /// When the callback resolved the attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl PaymentAttempt {
    /// Creates a new attempt in `Pending` state, keyed by the tracking pair
    /// the gateway returned for the submission.
    pub fn pending(
        tracking: TrackingPair,
        phone: PhoneNumber,
        amount: i64,
        booking_id: Option<BookingId>,
    ) -> Self {
        Self {
            id: AttemptId::new(),
            tracking,
            phone,
            amount,
            booking_id,
            status: PaymentStatus::Pending,
            result_code: None,
            result_description: None,
            receipt_number: None,
            amount_confirmed: None,
            confirmed_phone: None,
            created_at: Utc::now(),
            resolved_at: None,
        }
    }

    /// Whether the attempt is still awaiting its callback.
    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

/// The confirmed outcome carried by a successful callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub result_description: String,
    pub receipt_number: Option<String>,
    pub amount_confirmed: Option<i64>,
    pub confirmed_phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_creation() {
        let tracking = TrackingPair::new("29115-34620561-1", "ws_CO_191220191020363925");
        let phone = PhoneNumber::parse("0712345678").unwrap();
        let attempt = PaymentAttempt::pending(tracking.clone(), phone, 500, None);

        assert_eq!(attempt.status, PaymentStatus::Pending);
        assert!(attempt.is_pending());
        assert_eq!(attempt.tracking, tracking);
        assert!(attempt.receipt_number.is_none());
        assert!(attempt.resolved_at.is_none());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!PaymentStatus::Pending.is_terminal());
        assert!(PaymentStatus::Succeeded.is_terminal());
        assert!(PaymentStatus::Failed.is_terminal());
    }
}
