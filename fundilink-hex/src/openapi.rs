//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use fundilink_types::domain::{
    AttemptId, Booking, BookingId, FundiId, PaymentAttempt, PaymentStatus, PhoneNumber,
    TrackingPair,
};
use fundilink_types::dto::{
    CallbackAck, ClaimBookingRequest, CreateBookingRequest, InitiatePaymentRequest,
    InitiatePaymentResponse,
};
use utoipa::OpenApi;

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Initiate an STK push payment
#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "payments",
    request_body = InitiatePaymentRequest,
    responses(
        (status = 201, description = "Push accepted for processing; settlement arrives via callback", body = InitiatePaymentResponse),
        (status = 400, description = "Invalid phone number or amount"),
        (status = 404, description = "Referenced booking does not exist"),
        (status = 502, description = "Payment gateway rejected or failed the submission")
    )
)]
async fn initiate_payment() {}

/// List all payment attempts
#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "payments",
    responses(
        (status = 200, description = "All payment attempts, newest first", body = Vec<PaymentAttempt>)
    )
)]
async fn list_payments() {}

/// Get a payment attempt by ID
#[utoipa::path(
    get,
    path = "/api/payments/{id}",
    tag = "payments",
    params(
        ("id" = String, Path, description = "Payment attempt ID")
    ),
    responses(
        (status = 200, description = "The payment attempt", body = PaymentAttempt),
        (status = 404, description = "Payment attempt not found")
    )
)]
async fn get_payment() {}

/// Gateway callback webhook (consumed by the payment provider)
#[utoipa::path(
    post,
    path = "/api/payments/callback",
    tag = "payments",
    responses(
        (status = 200, description = "Always acknowledged, regardless of internal outcome", body = CallbackAck)
    )
)]
async fn payment_callback() {}

/// Create a new booking
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Missing required field or invalid phone")
    )
)]
async fn create_booking() {}

/// List all bookings
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "bookings",
    responses(
        (status = 200, description = "All bookings, newest first", body = Vec<Booking>)
    )
)]
async fn list_bookings() {}

/// Claim a booking for a fundi
#[utoipa::path(
    post,
    path = "/api/bookings/{id}/claim",
    tag = "bookings",
    params(
        ("id" = String, Path, description = "Booking ID")
    ),
    request_body = ClaimBookingRequest,
    responses(
        (status = 200, description = "Booking claimed", body = Booking),
        (status = 400, description = "Booking already claimed"),
        (status = 404, description = "Booking not found")
    )
)]
async fn claim_booking() {}

/// The OpenAPI document served at `/docs`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FundiLink Payments API",
        description = "M-Pesa STK push initiation and callback reconciliation for the FundiLink marketplace",
        version = "0.1.0"
    ),
    paths(
        health,
        initiate_payment,
        list_payments,
        get_payment,
        payment_callback,
        create_booking,
        list_bookings,
        claim_booking,
    ),
    components(schemas(
        AttemptId,
        BookingId,
        FundiId,
        PaymentAttempt,
        PaymentStatus,
        PhoneNumber,
        TrackingPair,
        Booking,
        InitiatePaymentRequest,
        InitiatePaymentResponse,
        CallbackAck,
        CreateBookingRequest,
        ClaimBookingRequest,
    )),
    tags(
        (name = "payments", description = "STK push payment flow"),
        (name = "bookings", description = "Booking management"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
