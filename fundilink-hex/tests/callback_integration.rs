//! Integration tests for the payment callback endpoint.
//!
//! The gateway retries any non-200 response indefinitely, so the webhook
//! must acknowledge every delivery with `200 {"message": "received"}`:
//! well-formed results, garbage payloads, and ledger failures alike.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fundilink_hex::{PaymentService, inbound::HttpServer};
use fundilink_repo::SqliteLedger;
use fundilink_types::{GatewayError, StkGateway, StkPushRequest, TrackingPair};

/// Gateway stub that accepts every push with a fixed tracking pair.
struct AcceptingGateway;

#[async_trait::async_trait]
impl StkGateway for AcceptingGateway {
    async fn stk_push(&self, _request: &StkPushRequest) -> Result<TrackingPair, GatewayError> {
        Ok(TrackingPair::new(
            "29115-34620561-1",
            "ws_CO_191220191020363925",
        ))
    }
}

/// Helper to create a test server backed by in-memory SQLite.
async fn create_test_server() -> HttpServer<SqliteLedger, AcceptingGateway> {
    let ledger = SqliteLedger::new("sqlite::memory:").await.unwrap();
    let service = PaymentService::new(ledger, AcceptingGateway);
    HttpServer::new(service)
}

/// Helper to POST a raw payload to the callback endpoint.
fn callback_request(payload: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/payments/callback")
        .header("Content-Type", "application/json")
        .body(payload.into())
        .unwrap()
}

fn success_callback_payload() -> String {
    serde_json::json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": "ws_CO_191220191020363925",
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
    })
    .to_string()
}

/// Helper to assert the fixed acknowledgment body.
async fn assert_received_ack(response: axum::response::Response) {
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["message"], "received");
}

#[tokio::test]
async fn test_malformed_callback_is_acknowledged() {
    let server = create_test_server().await;
    let app = server.router();

    // Not even JSON - the gateway must still get its 200.
    let response = app
        .clone()
        .oneshot(callback_request("{not json at all"))
        .await
        .unwrap();
    assert_received_ack(response).await;

    // Valid JSON with the wrong shape is acknowledged too.
    let response = app
        .oneshot(callback_request(r#"{"hello": "world"}"#))
        .await
        .unwrap();
    assert_received_ack(response).await;
}

#[tokio::test]
async fn test_ledger_failure_still_acknowledged() {
    let ledger = SqliteLedger::new("sqlite::memory:").await.unwrap();
    let pool = ledger.pool().clone();
    let service = PaymentService::new(ledger, AcceptingGateway);
    let app = HttpServer::new(service).router();

    // Take the database away so reconciliation hits a storage error.
    pool.close().await;

    let response = app
        .oneshot(callback_request(success_callback_payload()))
        .await
        .unwrap();
    assert_received_ack(response).await;
}

#[tokio::test]
async fn test_push_then_callback_resolves_attempt() {
    let server = create_test_server().await;
    let app = server.router();

    let initiate = Request::builder()
        .method(Method::POST)
        .uri("/api/payments")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"phone": "0712345678", "amount": 500}"#))
        .unwrap();
    let response = app.clone().oneshot(initiate).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let created: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let attempt_id = created["attempt_id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(callback_request(success_callback_payload()))
        .await
        .unwrap();
    assert_received_ack(response).await;

    let get = Request::builder()
        .uri(format!("/api/payments/{attempt_id}"))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(get).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let attempt: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(attempt["status"], "SUCCEEDED");
    assert_eq!(attempt["receipt_number"], "ABC123");
}
