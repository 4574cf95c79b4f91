//! HTTP gateway implementing the `StkGateway` port.

use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use fundilink_types::{GatewayError, StkGateway, StkPushRequest, TrackingPair};

use crate::auth::{Credentials, OAuthClient, TokenCache};
use crate::signer::{stk_password, stk_timestamp};

/// Environment-sourced gateway settings. All of them are required; the
/// binary fails at startup when one is missing.
#[derive(Debug, Clone)]
pub struct DarajaConfig {
    /// Gateway base URL, e.g. `https://sandbox.safaricom.co.ke`
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    /// Business shortcode (PayBill number)
    pub shortcode: String,
    /// Lipa Na M-Pesa passkey for password derivation
    pub passkey: String,
    /// Publicly reachable URL the gateway posts the callback to
    pub callback_url: String,
}

/// The Daraja STK push client.
///
/// Owns the token cache; everything else about a push is derived fresh per
/// request (timestamp, password) so there is no other shared state.
pub struct DarajaGateway {
    http: reqwest::Client,
    base_url: String,
    shortcode: String,
    passkey: String,
    callback_url: String,
    tokens: TokenCache<OAuthClient>,
}

impl DarajaGateway {
    pub fn new(config: DarajaConfig) -> Self {
        let http = reqwest::Client::new();
        let credentials = Credentials::new(config.consumer_key, config.consumer_secret);
        let tokens = TokenCache::new(OAuthClient::new(
            http.clone(),
            config.base_url.clone(),
            credentials,
        ));

        Self {
            http,
            base_url: config.base_url,
            shortcode: config.shortcode,
            passkey: config.passkey,
            callback_url: config.callback_url,
            tokens,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire formats (Daraja's PascalCase JSON)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct StkPushBody<'a> {
    #[serde(rename = "BusinessShortCode")]
    business_short_code: &'a str,
    #[serde(rename = "Password")]
    password: String,
    #[serde(rename = "Timestamp")]
    timestamp: String,
    #[serde(rename = "TransactionType")]
    transaction_type: &'static str,
    #[serde(rename = "Amount")]
    amount: i64,
    #[serde(rename = "PartyA")]
    party_a: &'a str,
    #[serde(rename = "PartyB")]
    party_b: &'a str,
    #[serde(rename = "PhoneNumber")]
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    callback_url: &'a str,
    #[serde(rename = "AccountReference")]
    account_reference: &'a str,
    #[serde(rename = "TransactionDesc")]
    transaction_desc: &'a str,
}

#[derive(Debug, Deserialize)]
struct StkPushResponse {
    #[serde(rename = "MerchantRequestID")]
    merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    checkout_request_id: String,
    #[serde(rename = "ResponseCode")]
    response_code: String,
    #[serde(rename = "ResponseDescription")]
    response_description: String,
}

#[async_trait::async_trait]
impl StkGateway for DarajaGateway {
    #[tracing::instrument(skip(self, request), fields(phone = %request.phone, amount = request.amount))]
    async fn stk_push(&self, request: &StkPushRequest) -> Result<TrackingPair, GatewayError> {
        let bearer = self.tokens.token().await?;

        // Password and timestamp must agree; derive both from one instant.
        let timestamp = stk_timestamp(Utc::now());
        let password = stk_password(&self.shortcode, &self.passkey, &timestamp);

        let body = StkPushBody {
            business_short_code: &self.shortcode,
            password,
            timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount: request.amount,
            party_a: request.phone.as_str(),
            party_b: &self.shortcode,
            phone_number: request.phone.as_str(),
            callback_url: &self.callback_url,
            account_reference: &request.account_reference,
            transaction_desc: &request.description,
        };

        let response = self
            .http
            .post(format!("{}/mpesa/stkpush/v1/processrequest", self.base_url))
            .bearer_auth(bearer)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            // The push endpoint refused the token; drop it so the next
            // attempt re-authorizes instead of replaying a dead bearer.
            self.tokens.invalidate().await;
            return Err(GatewayError::Auth(
                "push endpoint rejected the access token".into(),
            ));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                code: status.as_u16().to_string(),
                description: detail,
            });
        }

        let parsed: StkPushResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        if parsed.response_code != "0" {
            return Err(GatewayError::Rejected {
                code: parsed.response_code,
                description: parsed.response_description,
            });
        }

        tracing::info!(
            merchant_request_id = %parsed.merchant_request_id,
            checkout_request_id = %parsed.checkout_request_id,
            "STK push accepted for processing"
        );

        Ok(TrackingPair::new(
            parsed.merchant_request_id,
            parsed.checkout_request_id,
        ))
    }
}
