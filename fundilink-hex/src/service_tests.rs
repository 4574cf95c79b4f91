//! PaymentService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use fundilink_types::{
        AppError, AttemptId, Booking, BookingId, FundiId, GatewayError, InitiatePaymentRequest,
        PaymentAttempt, PaymentConfirmation, PaymentLedger, PaymentStatus, PhoneNumber,
        RepoError, StkCallbackEnvelope, StkGateway, StkPushRequest, TrackingPair,
    };

    use crate::service::{PaymentService, ReconcileOutcome};

    /// Simple in-memory ledger for testing the service layer.
    pub struct MockLedger {
        attempts: Mutex<Vec<PaymentAttempt>>,
        bookings: Mutex<HashMap<BookingId, Booking>>,
    }

    impl MockLedger {
        pub fn new() -> Self {
            Self {
                attempts: Mutex::new(Vec::new()),
                bookings: Mutex::new(HashMap::new()),
            }
        }

        fn attempt_count(&self) -> usize {
            self.attempts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PaymentLedger for MockLedger {
        async fn create_attempt(&self, attempt: PaymentAttempt) -> Result<(), RepoError> {
            self.attempts.lock().unwrap().push(attempt);
            Ok(())
        }

        async fn get_attempt(&self, id: AttemptId) -> Result<Option<PaymentAttempt>, RepoError> {
            Ok(self
                .attempts
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned())
        }

        async fn find_by_tracking(
            &self,
            tracking: &TrackingPair,
        ) -> Result<Option<PaymentAttempt>, RepoError> {
            Ok(self
                .attempts
                .lock()
                .unwrap()
                .iter()
                .find(|a| &a.tracking == tracking)
                .cloned())
        }

        async fn list_attempts(&self) -> Result<Vec<PaymentAttempt>, RepoError> {
            Ok(self.attempts.lock().unwrap().clone())
        }

        async fn mark_succeeded(
            &self,
            tracking: &TrackingPair,
            confirmation: PaymentConfirmation,
        ) -> Result<bool, RepoError> {
            let mut attempts = self.attempts.lock().unwrap();
            let Some(attempt) = attempts
                .iter_mut()
                .find(|a| &a.tracking == tracking && a.is_pending())
            else {
                return Ok(false);
            };
            attempt.status = PaymentStatus::Succeeded;
            attempt.result_code = Some(0);
            attempt.result_description = Some(confirmation.result_description);
            attempt.receipt_number = confirmation.receipt_number;
            attempt.amount_confirmed = confirmation.amount_confirmed;
            attempt.confirmed_phone = confirmation.confirmed_phone;
            attempt.resolved_at = Some(chrono::Utc::now());
            Ok(true)
        }

        async fn mark_failed(
            &self,
            tracking: &TrackingPair,
            result_code: i64,
            result_description: &str,
        ) -> Result<bool, RepoError> {
            let mut attempts = self.attempts.lock().unwrap();
            let Some(attempt) = attempts
                .iter_mut()
                .find(|a| &a.tracking == tracking && a.is_pending())
            else {
                return Ok(false);
            };
            attempt.status = PaymentStatus::Failed;
            attempt.result_code = Some(result_code);
            attempt.result_description = Some(result_description.to_string());
            attempt.resolved_at = Some(chrono::Utc::now());
            Ok(true)
        }

        async fn create_booking(&self, booking: Booking) -> Result<(), RepoError> {
            self.bookings.lock().unwrap().insert(booking.id, booking);
            Ok(())
        }

        async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>, RepoError> {
            Ok(self.bookings.lock().unwrap().get(&id).cloned())
        }

        async fn list_bookings(&self) -> Result<Vec<Booking>, RepoError> {
            Ok(self.bookings.lock().unwrap().values().cloned().collect())
        }

        async fn claim_booking(&self, id: BookingId, fundi: FundiId) -> Result<Booking, RepoError> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings.get_mut(&id).ok_or(RepoError::NotFound)?;
            booking
                .claim(fundi)
                .map_err(|e| RepoError::Conflict(e.to_string()))?;
            Ok(booking.clone())
        }

        async fn mark_booking_paid(&self, id: BookingId) -> Result<(), RepoError> {
            let mut bookings = self.bookings.lock().unwrap();
            let booking = bookings.get_mut(&id).ok_or(RepoError::NotFound)?;
            booking.mark_paid();
            Ok(())
        }
    }

    /// Gateway double that hands out sequential tracking pairs, or fails.
    pub struct MockGateway {
        pushes: AtomicU32,
        fail: bool,
    }

    impl MockGateway {
        pub fn new() -> Self {
            Self {
                pushes: AtomicU32::new(0),
                fail: false,
            }
        }

        pub fn failing() -> Self {
            Self {
                pushes: AtomicU32::new(0),
                fail: true,
            }
        }

        fn push_count(&self) -> u32 {
            self.pushes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StkGateway for MockGateway {
        async fn stk_push(&self, _request: &StkPushRequest) -> Result<TrackingPair, GatewayError> {
            let n = self.pushes.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(GatewayError::Rejected {
                    code: "500".into(),
                    description: "Unable to lock subscriber".into(),
                });
            }
            Ok(TrackingPair::new(
                format!("merchant-{}", n),
                format!("checkout-{}", n),
            ))
        }
    }

    fn service() -> PaymentService<MockLedger, MockGateway> {
        PaymentService::new(MockLedger::new(), MockGateway::new())
    }

    fn initiate_request(booking_id: Option<BookingId>) -> InitiatePaymentRequest {
        InitiatePaymentRequest {
            phone: "0712345678".into(),
            amount: 500,
            booking_id,
        }
    }

    fn success_envelope(merchant: &str, checkout: &str) -> StkCallbackEnvelope {
        serde_json::from_value(serde_json::json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": merchant,
                    "CheckoutRequestID": checkout,
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            {"Name": "Amount", "Value": 500},
                            {"Name": "MpesaReceiptNumber", "Value": "ABC123"},
                            {"Name": "PhoneNumber", "Value": 254712345678u64}
                        ]
                    }
                }
            }
        }))
        .unwrap()
    }

    fn failure_envelope(merchant: &str, checkout: &str) -> StkCallbackEnvelope {
        serde_json::from_value(serde_json::json!({
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": merchant,
                    "CheckoutRequestID": checkout,
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        }))
        .unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initiation
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_initiate_records_pending_attempt() {
        let service = service();

        let response = service.initiate(initiate_request(None)).await.unwrap();

        let attempt = service.get_payment(response.attempt_id).await.unwrap();
        assert_eq!(attempt.status, PaymentStatus::Pending);
        assert_eq!(attempt.phone.as_str(), "254712345678");
        assert_eq!(attempt.amount, 500);
        assert_eq!(attempt.tracking.merchant_request_id, response.merchant_request_id);
    }

    #[tokio::test]
    async fn test_initiate_rejects_bad_phone() {
        let service = service();

        let result = service
            .initiate(InitiatePaymentRequest {
                phone: "+254712345678".into(),
                amount: 500,
                booking_id: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert_eq!(service.ledger().attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_initiate_rejects_non_positive_amount() {
        let service = service();

        for amount in [0, -1] {
            let result = service
                .initiate(InitiatePaymentRequest {
                    phone: "0712345678".into(),
                    amount,
                    booking_id: None,
                })
                .await;
            assert!(matches!(result, Err(AppError::BadRequest(_))));
        }
        assert_eq!(service.ledger().attempt_count(), 0);
    }

    #[tokio::test]
    async fn test_initiate_rejects_unknown_booking() {
        let service = service();

        let result = service.initiate(initiate_request(Some(BookingId::new()))).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        // Rejected before the gateway was ever called.
        assert_eq!(service.gateway().push_count(), 0);
    }

    #[tokio::test]
    async fn test_gateway_failure_creates_no_ledger_entry() {
        let service = PaymentService::new(MockLedger::new(), MockGateway::failing());

        let result = service.initiate(initiate_request(None)).await;

        assert!(matches!(result, Err(AppError::Upstream(_))));
        assert_eq!(service.ledger().attempt_count(), 0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_success_callback_resolves_attempt() {
        let service = service();
        let response = service.initiate(initiate_request(None)).await.unwrap();

        let outcome = service
            .reconcile(success_envelope(
                &response.merchant_request_id,
                &response.checkout_request_id,
            ))
            .await;

        assert_eq!(outcome, ReconcileOutcome::Applied);
        let attempt = service.get_payment(response.attempt_id).await.unwrap();
        assert_eq!(attempt.status, PaymentStatus::Succeeded);
        assert_eq!(attempt.receipt_number.as_deref(), Some("ABC123"));
        assert_eq!(attempt.amount_confirmed, Some(500));
        assert_eq!(attempt.confirmed_phone.as_deref(), Some("254712345678"));
        assert!(attempt.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_replayed_callback_is_a_noop() {
        let service = service();
        let response = service.initiate(initiate_request(None)).await.unwrap();
        let envelope = success_envelope(
            &response.merchant_request_id,
            &response.checkout_request_id,
        );

        assert_eq!(service.reconcile(envelope.clone()).await, ReconcileOutcome::Applied);
        assert_eq!(
            service.reconcile(envelope).await,
            ReconcileOutcome::AlreadyResolved
        );

        let attempt = service.get_payment(response.attempt_id).await.unwrap();
        assert_eq!(attempt.status, PaymentStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_unknown_tracking_pair_is_discarded() {
        let service = service();
        service.initiate(initiate_request(None)).await.unwrap();

        let outcome = service
            .reconcile(success_envelope("no-such-merchant", "no-such-checkout"))
            .await;

        assert_eq!(outcome, ReconcileOutcome::Unknown);
        let attempts = service.list_payments().await.unwrap();
        assert!(attempts.iter().all(|a| a.status == PaymentStatus::Pending));
    }

    #[tokio::test]
    async fn test_failure_callback_stores_description_verbatim() {
        let service = service();
        let response = service.initiate(initiate_request(None)).await.unwrap();

        let outcome = service
            .reconcile(failure_envelope(
                &response.merchant_request_id,
                &response.checkout_request_id,
            ))
            .await;

        assert_eq!(outcome, ReconcileOutcome::Applied);
        let attempt = service.get_payment(response.attempt_id).await.unwrap();
        assert_eq!(attempt.status, PaymentStatus::Failed);
        assert_eq!(attempt.result_code, Some(1032));
        assert_eq!(
            attempt.result_description.as_deref(),
            Some("Request cancelled by user")
        );
        assert!(attempt.receipt_number.is_none());
    }

    #[tokio::test]
    async fn test_success_flips_booking_paid_flag_once() {
        let service = service();
        let booking = service
            .create_booking(fundilink_types::CreateBookingRequest {
                client_name: "Wanjiku".into(),
                phone: "0712345678".into(),
                location: "Nairobi".into(),
                message: None,
            })
            .await
            .unwrap();

        let response = service
            .initiate(initiate_request(Some(booking.id)))
            .await
            .unwrap();
        let envelope = success_envelope(
            &response.merchant_request_id,
            &response.checkout_request_id,
        );

        service.reconcile(envelope.clone()).await;
        assert!(service.get_booking(booking.id).await.unwrap().paid_by_fundi);

        // Re-delivery leaves the flag set.
        service.reconcile(envelope).await;
        assert!(service.get_booking(booking.id).await.unwrap().paid_by_fundi);
    }

    #[tokio::test]
    async fn test_failed_payment_leaves_booking_unpaid() {
        let service = service();
        let booking = service
            .create_booking(fundilink_types::CreateBookingRequest {
                client_name: "Wanjiku".into(),
                phone: "0712345678".into(),
                location: "Nairobi".into(),
                message: None,
            })
            .await
            .unwrap();

        let response = service
            .initiate(initiate_request(Some(booking.id)))
            .await
            .unwrap();
        service
            .reconcile(failure_envelope(
                &response.merchant_request_id,
                &response.checkout_request_id,
            ))
            .await;

        assert!(!service.get_booking(booking.id).await.unwrap().paid_by_fundi);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Bookings
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_claim_booking() {
        let service = service();
        let booking = service
            .create_booking(fundilink_types::CreateBookingRequest {
                client_name: "Wanjiku".into(),
                phone: "0712345678".into(),
                location: "Nairobi".into(),
                message: None,
            })
            .await
            .unwrap();

        let fundi = FundiId::new();
        let claimed = service
            .claim_booking(booking.id, fundilink_types::ClaimBookingRequest { fundi_id: fundi })
            .await
            .unwrap();

        assert!(claimed.claimed);
        assert_eq!(claimed.fundi_id, Some(fundi));

        let again = service
            .claim_booking(
                booking.id,
                fundilink_types::ClaimBookingRequest {
                    fundi_id: FundiId::new(),
                },
            )
            .await;
        assert!(matches!(again, Err(AppError::BadRequest(_))));
    }
}
