//! Error types for the SMS.ir backend.

use thiserror::Error;

/// Status code SMS.ir reports for a successful call.
pub const STATUS_SUCCESS: i64 = 1;

/// Error reported in the `status`/`message` envelope of an SMS.ir response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SMS.ir error {status}: {message}")]
pub struct SmsIrServiceError {
    /// SMS.ir status code (anything but `1`).
    pub status: i64,
    /// Message returned by SMS.ir.
    pub message: String,
}

impl SmsIrServiceError {
    /// The request was refused because of the API key (status `0` or `401`).
    pub fn is_authentication(&self) -> bool {
        matches!(self.status, 0 | 401)
    }
}

/// Main error type for SMS.ir client operations.
#[derive(Debug, Error)]
pub enum SmsIrError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// The configured base URL cannot carry a path.
    #[error("Invalid SMS.ir endpoint: {endpoint}")]
    InvalidEndpoint { endpoint: String },

    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read the response body.
    #[error("Failed to read response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// SMS.ir answered with a non-success status.
    #[error("{0}")]
    Service(#[source] SmsIrServiceError),

    /// Non-success HTTP status without an SMS.ir envelope.
    #[error("SMS.ir returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// Failed to deserialize JSON response.
    #[error("Failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SmsIrError>;
