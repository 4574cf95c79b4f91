//! Normalized Kenyan mobile number.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::DomainError;

/// A payer phone number normalized to international format (`254XXXXXXXXX`).
///
/// The gateway only accepts the `254` prefix, so normalization happens once,
/// at the edge, and the rest of the system never sees a raw phone string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "254712345678")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses and normalizes a raw phone string.
    ///
    /// Accepted inputs:
    /// - `0XXXXXXXXX` (10 digits) - leading `0` replaced with `254`
    /// - `254XXXXXXXXX` (12 digits) - passed through unchanged
    ///
    /// Anything else (other prefixes, `+` signs, wrong lengths) is rejected.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let digits = raw.trim();

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::InvalidPhone(raw.to_string()));
        }

        if digits.len() == 10 && digits.starts_with('0') {
            return Ok(Self(format!("254{}", &digits[1..])));
        }

        if digits.len() == 12 && digits.starts_with("254") {
            return Ok(Self(digits.to_string()));
        }

        Err(DomainError::InvalidPhone(raw.to_string()))
    }

    /// Returns the normalized number.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value, returning the normalized number.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for PhoneNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_format_normalized() {
        let phone = PhoneNumber::parse("0712345678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");
    }

    #[test]
    fn test_international_format_passthrough() {
        let phone = PhoneNumber::parse("254712345678").unwrap();
        assert_eq!(phone.as_str(), "254712345678");
    }

    #[test]
    fn test_whitespace_trimmed() {
        let phone = PhoneNumber::parse(" 0712345678 ").unwrap();
        assert_eq!(phone.as_str(), "254712345678");
    }

    #[test]
    fn test_plus_prefix_rejected() {
        assert!(PhoneNumber::parse("+254712345678").is_err());
    }

    #[test]
    fn test_foreign_prefix_rejected() {
        assert!(PhoneNumber::parse("255712345678").is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(PhoneNumber::parse("07123456").is_err());
        assert!(PhoneNumber::parse("25471234567890").is_err());
        assert!(PhoneNumber::parse("").is_err());
    }

    #[test]
    fn test_non_digit_rejected() {
        assert!(PhoneNumber::parse("07123abc78").is_err());
    }
}
