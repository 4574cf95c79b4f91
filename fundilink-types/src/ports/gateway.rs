//! Push-payment gateway port trait.

use crate::domain::{PhoneNumber, TrackingPair};
use crate::error::GatewayError;

/// A validated, ready-to-submit push-payment request.
///
/// Immutable once built; the service validates phone and amount before
/// constructing one.
#[derive(Debug, Clone)]
pub struct StkPushRequest {
    /// Payer phone, already normalized
    pub phone: PhoneNumber,
    /// Amount in the smallest currency unit, strictly positive
    pub amount: i64,
    /// Account reference shown to the payer
    pub account_reference: String,
    /// Short transaction description shown to the payer
    pub description: String,
}

/// Outbound port to the mobile-payment gateway.
///
/// A successful return means "push accepted for processing", never
/// settlement; the outcome arrives later through the callback webhook.
#[async_trait::async_trait]
pub trait StkGateway: Send + Sync + 'static {
    /// Submits an STK push and returns the gateway-assigned tracking pair.
    async fn stk_push(&self, request: &StkPushRequest) -> Result<TrackingPair, GatewayError>;
}
