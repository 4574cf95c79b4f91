//! Time-bound transaction password for STK push requests.
//!
//! The gateway validates `base64(shortcode + passkey + timestamp)` against
//! the timestamp field of the same request. A clock skewed from what the
//! gateway expects fails signature validation *silently* - the push is
//! accepted and the failure only surfaces in the error callback - so the
//! timestamp is always generated fresh, in UTC, at submission time.

use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};

/// Formats an instant as the gateway's 14-digit `YYYYMMDDHHmmss` timestamp.
pub fn stk_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Derives the transaction password for one push request.
pub fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    general_purpose::STANDARD.encode(format!("{shortcode}{passkey}{timestamp}"))
}
