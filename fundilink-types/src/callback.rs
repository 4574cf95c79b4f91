//! The gateway's asynchronous STK callback envelope.
//!
//! Daraja delivers the result of a push as a deeply nested JSON document.
//! Metadata items are loosely typed on the wire (`Amount` arrives as a
//! number, `MpesaReceiptNumber` as a string, `PhoneNumber` as a number),
//! so accessors normalize each into the type the ledger stores.

use serde::{Deserialize, Serialize};

use crate::domain::TrackingPair;

/// Top-level callback document: `{"Body": {"stkCallback": {...}}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

/// The result of one push-payment submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    /// Present only when the payment succeeded.
    #[serde(rename = "CallbackMetadata", skip_serializing_if = "Option::is_none")]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item")]
    pub item: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    /// Some items (e.g. `Balance`) arrive with no value at all.
    #[serde(rename = "Value", default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl StkCallback {
    /// The tracking pair correlating this callback to a payment attempt.
    pub fn tracking(&self) -> TrackingPair {
        TrackingPair::new(
            self.merchant_request_id.clone(),
            self.checkout_request_id.clone(),
        )
    }

    /// ResultCode 0 is the gateway's only success code.
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    fn metadata_value(&self, name: &str) -> Option<&serde_json::Value> {
        self.callback_metadata
            .as_ref()?
            .item
            .iter()
            .find(|item| item.name == name)?
            .value
            .as_ref()
    }

    /// `MpesaReceiptNumber` metadata item, if present.
    pub fn receipt_number(&self) -> Option<String> {
        self.metadata_value("MpesaReceiptNumber")
            .and_then(|v| v.as_str().map(str::to_string))
    }

    /// `Amount` metadata item in the smallest currency unit, if present.
    /// The gateway sends whole shillings, sometimes as a float.
    pub fn amount(&self) -> Option<i64> {
        let value = self.metadata_value("Amount")?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    /// `PhoneNumber` metadata item, if present. Arrives as a JSON number.
    pub fn phone_number(&self) -> Option<String> {
        let value = self.metadata_value("PhoneNumber")?;
        value
            .as_i64()
            .map(|n| n.to_string())
            .or_else(|| value.as_str().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_payload() -> &'static str {
        r#"{
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            {"Name": "Amount", "Value": 500.00},
                            {"Name": "MpesaReceiptNumber", "Value": "ABC123"},
                            {"Name": "Balance"},
                            {"Name": "TransactionDate", "Value": 20191219102115},
                            {"Name": "PhoneNumber", "Value": 254712345678}
                        ]
                    }
                }
            }
        }"#
    }

    #[test]
    fn test_parse_success_callback() {
        let envelope: StkCallbackEnvelope = serde_json::from_str(success_payload()).unwrap();
        let cb = &envelope.body.stk_callback;

        assert!(cb.is_success());
        assert_eq!(cb.tracking().merchant_request_id, "29115-34620561-1");
        assert_eq!(cb.receipt_number().as_deref(), Some("ABC123"));
        assert_eq!(cb.amount(), Some(500));
        assert_eq!(cb.phone_number().as_deref(), Some("254712345678"));
    }

    #[test]
    fn test_parse_failure_callback() {
        let payload = r#"{
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }
            }
        }"#;
        let envelope: StkCallbackEnvelope = serde_json::from_str(payload).unwrap();
        let cb = &envelope.body.stk_callback;

        assert!(!cb.is_success());
        assert_eq!(cb.result_code, 1032);
        assert_eq!(cb.result_desc, "Request cancelled by user");
        assert!(cb.receipt_number().is_none());
        assert!(cb.amount().is_none());
    }

    #[test]
    fn test_missing_envelope_is_an_error() {
        let result: Result<StkCallbackEnvelope, _> = serde_json::from_str(r#"{"hello": "world"}"#);
        assert!(result.is_err());
    }
}
