//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use fundilink_types::{
    AppError, AttemptId, BookingId, CallbackAck, ClaimBookingRequest, CreateBookingRequest,
    InitiatePaymentRequest, PaymentLedger, StkCallbackEnvelope, StkGateway,
};

use crate::PaymentService;

/// Application state shared across handlers.
pub struct AppState<L: PaymentLedger, G: StkGateway> {
    pub service: PaymentService<L, G>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

/// Initiate an STK push payment.
#[tracing::instrument(skip(state, req), fields(amount = req.amount))]
pub async fn initiate_payment<L: PaymentLedger, G: StkGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.service.initiate(req).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Receive the gateway's asynchronous STK callback.
///
/// The gateway retries any non-200 response indefinitely, so this handler
/// is infallible: malformed payloads are logged and acknowledged, and every
/// internal outcome produces the same `{"message": "received"}` body.
#[tracing::instrument(skip(state, body))]
pub async fn payment_callback<L: PaymentLedger, G: StkGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    body: Bytes,
) -> impl IntoResponse {
    match serde_json::from_slice::<StkCallbackEnvelope>(&body) {
        Ok(envelope) => {
            let outcome = state.service.reconcile(envelope).await;
            tracing::debug!(?outcome, "callback reconciled");
        }
        Err(e) => {
            tracing::warn!(error = %e, "discarding malformed callback payload");
        }
    }

    (StatusCode::OK, Json(CallbackAck::received()))
}

/// Get a payment attempt by ID.
#[tracing::instrument(skip(state), fields(attempt_id = %id))]
pub async fn get_payment<L: PaymentLedger, G: StkGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let attempt_id: AttemptId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid payment ID".into()))?;

    let attempt = state.service.get_payment(attempt_id).await?;
    Ok(Json(attempt))
}

/// List all payment attempts.
#[tracing::instrument(skip(state))]
pub async fn list_payments<L: PaymentLedger, G: StkGateway>(
    State(state): State<Arc<AppState<L, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let attempts = state.service.list_payments().await?;
    Ok(Json(attempts))
}

// ─────────────────────────────────────────────────────────────────────────────
// Bookings
// ─────────────────────────────────────────────────────────────────────────────

/// Create a new booking.
#[tracing::instrument(skip(state, req), fields(client = %req.client_name))]
pub async fn create_booking<L: PaymentLedger, G: StkGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.service.create_booking(req).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// List all bookings.
#[tracing::instrument(skip(state))]
pub async fn list_bookings<L: PaymentLedger, G: StkGateway>(
    State(state): State<Arc<AppState<L, G>>>,
) -> Result<impl IntoResponse, ApiError> {
    let bookings = state.service.list_bookings().await?;
    Ok(Json(bookings))
}

/// Claim a booking for a fundi.
#[tracing::instrument(skip(state, req), fields(booking_id = %id))]
pub async fn claim_booking<L: PaymentLedger, G: StkGateway>(
    State(state): State<Arc<AppState<L, G>>>,
    Path(id): Path<String>,
    Json(req): Json<ClaimBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let booking_id: BookingId = id
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid booking ID".into()))?;

    let booking = state.service.claim_booking(booking_id, req).await?;
    Ok(Json(booking))
}
