//! Twilio provider implementation.
//!
//! Single sends go through the Messages API. Verification codes go through
//! Twilio Verify with a custom code, which needs `VERIFY_SERVICE_SID` in the
//! provider settings.
//!
//! ```toml
//! [provider]
//! NAME = "twilio"
//! API_KEY = "ACxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"
//! AUTH_TOKEN = "your_auth_token"
//! LINE_NUMBER = "+15005550006"
//! VERIFY_SERVICE_SID = "VAxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxxx"
//! ```

pub mod backend;
pub mod client;
pub mod errors;

// Re-export commonly used types
pub use backend::{BACKEND_NAME, TwilioBackend};
pub use client::{MessageRequest, TwilioApi, TwilioClient, VerificationRequest};
pub use errors::{TwilioApiError, TwilioError};
