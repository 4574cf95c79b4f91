//! Data Transfer Objects (DTOs) for requests and responses.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{AttemptId, BookingId, FundiId};

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to initiate an STK push payment.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitiatePaymentRequest {
    /// Payer phone number; `07...` or `254...` formats accepted
    #[schema(example = "0712345678")]
    pub phone: String,
    /// Amount in the smallest currency unit
    #[schema(example = 500)]
    pub amount: i64,
    /// Booking this payment settles, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<BookingId>,
}

/// Response after the gateway accepts a push for processing.
///
/// This acknowledges submission only; settlement arrives later via the
/// callback and is observable through the attempt's status.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InitiatePaymentResponse {
    /// Ledger identifier for the new attempt
    pub attempt_id: AttemptId,
    /// Gateway-assigned merchant request identifier
    #[schema(example = "29115-34620561-1")]
    pub merchant_request_id: String,
    /// Gateway-assigned checkout request identifier
    #[schema(example = "ws_CO_191220191020363925")]
    pub checkout_request_id: String,
}

/// Fixed acknowledgment body returned to the gateway for every callback
/// delivery, regardless of internal outcome.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CallbackAck {
    #[schema(example = "received")]
    pub message: String,
}

impl CallbackAck {
    pub fn received() -> Self {
        Self {
            message: "received".into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Booking DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Request to create a new booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Name of the requesting client
    #[schema(example = "Wanjiku")]
    pub client_name: String,
    /// Client contact phone
    #[schema(example = "0712345678")]
    pub phone: String,
    /// Where the work is needed
    #[schema(example = "Nairobi")]
    pub location: String,
    /// Free-form description of the job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request for a fundi to claim a booking.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClaimBookingRequest {
    /// The claiming fundi
    pub fundi_id: FundiId,
}
