//! Error types for the Twilio backend.

use serde::Deserialize;
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Error body returned by the Twilio REST API.
///
/// ```json
/// {"code": 21211, "message": "The 'To' number is not a valid phone number.",
///  "more_info": "https://www.twilio.com/docs/errors/21211", "status": 400}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("Twilio error {} (HTTP {status}): {message}", code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()))]
pub struct TwilioApiError {
    /// Twilio error code, e.g. 21211.
    #[serde(default)]
    pub code: Option<u32>,
    /// Human-readable description.
    #[serde(default)]
    pub message: String,
    /// Link to the error documentation.
    #[serde(default)]
    pub more_info: Option<String>,
    /// HTTP status code.
    #[serde(default)]
    pub status: u16,
}

impl TwilioApiError {
    /// Build the error from a non-success response.
    ///
    /// Falls back to the raw body when it is not Twilio's JSON error shape.
    pub fn from_response(status: u16, body: &str) -> Self {
        let error = match serde_json::from_str::<TwilioApiError>(body) {
            Ok(mut error) => {
                if error.status == 0 {
                    error.status = status;
                }
                if error.message.is_empty() {
                    error.message = body.trim().to_string();
                }
                error
            }
            Err(_) => TwilioApiError {
                code: None,
                message: body.trim().to_string(),
                more_info: None,
                status,
            },
        };

        #[cfg(feature = "tracing")]
        warn!(
            status = error.status,
            code = ?error.code,
            message = %error.message,
            "Twilio API returned error"
        );

        error
    }
}

/// Main error type for Twilio client operations.
#[derive(Debug, Error)]
pub enum TwilioError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// The configured base URL cannot carry a path.
    #[error("Invalid Twilio endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: String },

    /// Failed to encode the form body.
    #[error("Failed to encode Twilio request: {0}")]
    EncodeForm(#[source] serde_urlencoded::ser::Error),

    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// Twilio rejected the request.
    #[error("{0}")]
    Api(#[source] TwilioApiError),

    /// Failed to deserialize JSON response.
    #[error("Failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TwilioError>;
