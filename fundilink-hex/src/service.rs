//! Payment Application Service
//!
//! Orchestrates the push-payment flow through the ledger and gateway ports.
//! Contains NO infrastructure logic - pure business orchestration.

use fundilink_types::{
    AppError, AttemptId, Booking, BookingId, ClaimBookingRequest, CreateBookingRequest,
    InitiatePaymentRequest, InitiatePaymentResponse, PaymentAttempt, PaymentConfirmation,
    PaymentLedger, PhoneNumber, StkCallbackEnvelope, StkGateway, StkPushRequest,
};

/// What the reconciler did with one callback delivery. The HTTP handler
/// acknowledges the gateway identically in every case; this exists so the
/// decision is observable in logs and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The attempt transitioned to a terminal state
    Applied,
    /// The attempt was already terminal; duplicate delivery ignored
    AlreadyResolved,
    /// No attempt matches the tracking pair
    Unknown,
    /// The ledger failed; the gateway will redeliver and we retry then
    StorageError,
}

/// Application service for the payment flow.
///
/// Generic over `L: PaymentLedger` and `G: StkGateway` - the adapters are
/// injected at compile time. This enables:
/// - Swapping the database or gateway without code changes
/// - Testing with in-memory doubles
/// - Compile-time checks for port implementation
pub struct PaymentService<L, G> {
    ledger: L,
    gateway: G,
}

impl<L: PaymentLedger, G: StkGateway> PaymentService<L, G> {
    /// Creates a new payment service with the given adapters.
    pub fn new(ledger: L, gateway: G) -> Self {
        Self { ledger, gateway }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns a reference to the underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Payment Initiation
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates the request, submits an STK push, and records a `Pending`
    /// attempt keyed by the gateway's tracking pair.
    ///
    /// A successful return means the push was accepted for processing, not
    /// that the payment settled. On any gateway failure no ledger entry is
    /// created - there is no partial state to clean up.
    pub async fn initiate(
        &self,
        req: InitiatePaymentRequest,
    ) -> Result<InitiatePaymentResponse, AppError> {
        if req.amount <= 0 {
            return Err(AppError::BadRequest(
                "Amount must be a positive integer".into(),
            ));
        }

        let phone = PhoneNumber::parse(&req.phone)?;

        if let Some(booking_id) = req.booking_id {
            self.ledger
                .get_booking(booking_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::NotFound(format!("Booking {}", booking_id)))?;
        }

        let push = StkPushRequest {
            phone: phone.clone(),
            amount: req.amount,
            account_reference: "FundiLink".into(),
            description: "Fundi payment".into(),
        };

        let tracking = self.gateway.stk_push(&push).await?;

        let attempt = PaymentAttempt::pending(tracking.clone(), phone, req.amount, req.booking_id);
        let attempt_id = attempt.id;
        self.ledger.create_attempt(attempt).await?;

        tracing::info!(
            attempt_id = %attempt_id,
            merchant_request_id = %tracking.merchant_request_id,
            "payment attempt recorded as pending"
        );

        Ok(InitiatePaymentResponse {
            attempt_id,
            merchant_request_id: tracking.merchant_request_id,
            checkout_request_id: tracking.checkout_request_id,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Callback Reconciliation
    // ─────────────────────────────────────────────────────────────────────────

    /// Applies one callback delivery to the ledger.
    ///
    /// Infallible by design: whatever happens here, the HTTP layer must
    /// acknowledge the gateway with a 200, otherwise it redelivers forever.
    pub async fn reconcile(&self, envelope: StkCallbackEnvelope) -> ReconcileOutcome {
        let callback = envelope.body.stk_callback;
        let tracking = callback.tracking();

        let attempt = match self.ledger.find_by_tracking(&tracking).await {
            Ok(Some(attempt)) => attempt,
            Ok(None) => {
                tracing::warn!(
                    merchant_request_id = %tracking.merchant_request_id,
                    checkout_request_id = %tracking.checkout_request_id,
                    "callback for unknown tracking pair, discarding"
                );
                return ReconcileOutcome::Unknown;
            }
            Err(e) => {
                tracing::error!(error = %e, "ledger lookup failed during reconciliation");
                return ReconcileOutcome::StorageError;
            }
        };

        if !attempt.is_pending() {
            tracing::info!(
                attempt_id = %attempt.id,
                status = %attempt.status,
                "duplicate callback for resolved attempt, ignoring"
            );
            return ReconcileOutcome::AlreadyResolved;
        }

        let transitioned = if callback.is_success() {
            let confirmation = PaymentConfirmation {
                result_description: callback.result_desc.clone(),
                receipt_number: callback.receipt_number(),
                amount_confirmed: callback.amount(),
                confirmed_phone: callback.phone_number(),
            };
            match self.ledger.mark_succeeded(&tracking, confirmation).await {
                Ok(applied) => applied,
                Err(e) => {
                    tracing::error!(error = %e, attempt_id = %attempt.id, "failed to record success");
                    return ReconcileOutcome::StorageError;
                }
            }
        } else {
            match self
                .ledger
                .mark_failed(&tracking, callback.result_code, &callback.result_desc)
                .await
            {
                Ok(applied) => applied,
                Err(e) => {
                    tracing::error!(error = %e, attempt_id = %attempt.id, "failed to record failure");
                    return ReconcileOutcome::StorageError;
                }
            }
        };

        if !transitioned {
            // Lost the race against a concurrent delivery of the same result.
            return ReconcileOutcome::AlreadyResolved;
        }

        if callback.is_success() {
            if let Some(booking_id) = attempt.booking_id {
                if let Err(e) = self.ledger.mark_booking_paid(booking_id).await {
                    // The attempt is already resolved; the paid flag can be
                    // repaired from the ledger, so log rather than unwind.
                    tracing::error!(
                        error = %e,
                        booking_id = %booking_id,
                        "payment succeeded but booking paid flag was not set"
                    );
                }
            }
            tracing::info!(
                attempt_id = %attempt.id,
                receipt = ?callback.receipt_number(),
                "payment succeeded"
            );
        } else {
            tracing::info!(
                attempt_id = %attempt.id,
                result_code = callback.result_code,
                result_desc = %callback.result_desc,
                "payment failed"
            );
        }

        ReconcileOutcome::Applied
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attempt Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Gets a payment attempt by ID.
    pub async fn get_payment(&self, id: AttemptId) -> Result<PaymentAttempt, AppError> {
        self.ledger
            .get_attempt(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Payment {}", id))))
    }

    /// Lists all payment attempts.
    pub async fn list_payments(&self) -> Result<Vec<PaymentAttempt>, AppError> {
        self.ledger.list_attempts().await.map_err(Into::into)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Booking Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Creates a new booking.
    pub async fn create_booking(&self, req: CreateBookingRequest) -> Result<Booking, AppError> {
        let phone = PhoneNumber::parse(&req.phone)?;
        let booking = Booking::new(req.client_name, phone, req.location, req.message)?;

        self.ledger.create_booking(booking.clone()).await?;
        Ok(booking)
    }

    /// Gets a booking by ID.
    pub async fn get_booking(&self, id: BookingId) -> Result<Booking, AppError> {
        self.ledger
            .get_booking(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound(format!("Booking {}", id))))
    }

    /// Lists all bookings.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, AppError> {
        self.ledger.list_bookings().await.map_err(Into::into)
    }

    /// Claims a booking for a fundi.
    pub async fn claim_booking(
        &self,
        id: BookingId,
        req: ClaimBookingRequest,
    ) -> Result<Booking, AppError> {
        self.ledger
            .claim_booking(id, req.fundi_id)
            .await
            .map_err(Into::into)
    }
}
