//! OAuth credential cache for the Daraja gateway.
//!
//! Daraja issues bearer tokens with a declared lifetime (~3600s). The cache
//! reuses a token for its whole validity window minus a safety margin, so
//! concurrent initiations within the window cost exactly one authorization
//! round trip. On any authorization failure the cache stays empty and the
//! error propagates; the provider throttles repeated bad-credential calls,
//! so silent retries are off the table.

use std::time::Duration;

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use tokio::sync::Mutex;

use fundilink_types::GatewayError;

/// Leave this much of the declared lifetime unused, so a token is never
/// presented moments before the gateway expires it.
const REFRESH_MARGIN: Duration = Duration::from_secs(30);

/// Consumer key/secret pair for the authorization endpoint.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
}

impl Credentials {
    pub fn new(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// `base64(consumer_key:consumer_secret)` for the Basic auth header.
    pub fn basic_auth(&self) -> String {
        general_purpose::STANDARD.encode(format!("{}:{}", self.consumer_key, self.consumer_secret))
    }
}

/// A token as issued by the authorization endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// Declared lifetime in seconds. Daraja sends this as a JSON string
    /// (`"3599"`); tolerate a plain number too.
    #[serde(deserialize_with = "lenient_u64")]
    pub expires_in: u64,
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// Source of fresh tokens. Implemented by [`OAuthClient`] for the real
/// gateway and by test doubles.
#[async_trait::async_trait]
pub trait Authorize: Send + Sync {
    async fn authorize(&self) -> Result<IssuedToken, GatewayError>;
}

/// HTTP implementation of [`Authorize`] against the Daraja OAuth endpoint.
pub struct OAuthClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl OAuthClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            credentials,
        }
    }
}

#[async_trait::async_trait]
impl Authorize for OAuthClient {
    async fn authorize(&self) -> Result<IssuedToken, GatewayError> {
        let url = format!(
            "{}/oauth/v1/generate?grant_type=client_credentials",
            self.base_url
        );

        let response = self
            .http
            .get(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Basic {}", self.credentials.basic_auth()),
            )
            .send()
            .await
            .map_err(|e| GatewayError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GatewayError::Auth(format!(
                "authorization endpoint rejected credentials ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(GatewayError::Auth(format!(
                "authorization endpoint returned {}",
                status
            )));
        }

        response
            .json::<IssuedToken>()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))
    }
}

struct CachedToken {
    bearer: String,
    expires_at: DateTime<Utc>,
}

/// Caches the gateway's short-lived access token.
///
/// The single shared mutable resource in the payment flow. The mutex is held
/// across a refresh, so concurrent callers during an expired window wait for
/// one fetch instead of racing the authorization endpoint.
pub struct TokenCache<A> {
    source: A,
    slot: Mutex<Option<CachedToken>>,
}

impl<A: Authorize> TokenCache<A> {
    pub fn new(source: A) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, refreshing through the source only when
    /// the cached one has expired (or never existed).
    pub async fn token(&self) -> Result<String, GatewayError> {
        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if Utc::now() < cached.expires_at {
                return Ok(cached.bearer.clone());
            }
        }

        // Expired or empty: the slot stays empty until a fetch succeeds.
        *slot = None;
        let issued = self.source.authorize().await?;
        let lifetime = issued.expires_in.saturating_sub(REFRESH_MARGIN.as_secs());
        let expires_at = Utc::now() + chrono::Duration::seconds(lifetime as i64);

        *slot = Some(CachedToken {
            bearer: issued.access_token.clone(),
            expires_at,
        });

        Ok(issued.access_token)
    }

    /// Drops the cached token, forcing the next call to re-authorize.
    /// Called when the push endpoint reports the token was not accepted.
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}
