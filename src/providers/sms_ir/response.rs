//! Response parsing for the SMS.ir API.
//!
//! Every SMS.ir reply uses the same envelope:
//!
//! ```json
//! {"status": 1, "message": "موفق", "data": {"packId": "...", "messageIds": [1], "cost": 1.0}}
//! ```

use super::errors::{STATUS_SUCCESS, SmsIrServiceError};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// Envelope wrapping every SMS.ir response.
#[derive(Debug, Deserialize)]
pub struct SmsIrResponse<T> {
    pub status: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> SmsIrResponse<T> {
    /// Convert the envelope into a Result.
    pub fn into_result(self) -> Result<Option<T>, SmsIrServiceError> {
        if self.status == STATUS_SUCCESS {
            Ok(self.data)
        } else {
            Err(SmsIrServiceError {
                status: self.status,
                message: self.message,
            })
        }
    }
}

impl<T: DeserializeOwned> SmsIrResponse<T> {
    /// Parse an SMS.ir response from raw text.
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// `data` of a `/v1/send/bulk` reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSendResult {
    #[serde(default)]
    pub pack_id: Option<String>,
    #[serde(default)]
    pub message_ids: Vec<i64>,
    #[serde(default)]
    pub cost: Option<f64>,
}

/// `data` of a `/v1/send/verify` reply.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifySendResult {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub cost: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success() {
        let text = r#"{
            "status": 1,
            "message": "موفق",
            "data": {"packId": "a1b2", "messageIds": [101, 102], "cost": 2.0}
        }"#;

        let data = SmsIrResponse::<BulkSendResult>::from_text(text)
            .unwrap()
            .into_result()
            .unwrap()
            .unwrap();

        assert_eq!(data.pack_id.as_deref(), Some("a1b2"));
        assert_eq!(data.message_ids, vec![101, 102]);
    }

    #[test]
    fn test_parse_failure_status() {
        let text = r#"{"status": 0, "message": "کلید وب سرویس نامعتبر است", "data": null}"#;

        let error = SmsIrResponse::<BulkSendResult>::from_text(text)
            .unwrap()
            .into_result()
            .unwrap_err();

        assert_eq!(error.status, 0);
        assert!(error.is_authentication());
        assert_eq!(error.message, "کلید وب سرویس نامعتبر است");
    }

    #[test]
    fn test_missing_data_is_allowed() {
        let text = r#"{"status": 1, "message": "ok"}"#;

        let data = SmsIrResponse::<VerifySendResult>::from_text(text)
            .unwrap()
            .into_result()
            .unwrap();

        assert!(data.is_none());
    }
}
