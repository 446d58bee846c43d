//! SMS.ir provider implementation.
//!
//! Integration with the SMS.ir REST API (`https://api.sms.ir/v1`). Registered
//! as `smsir` with the alias `sms_ir`; numbers are validated against the `IR`
//! region unless the settings name another one.
//!
//! ```toml
//! [provider]
//! NAME = "sms_ir"
//! API_KEY = "your_api_key"
//! LINE_NUMBER = "30007732000000"
//! TEMPLATE_ID = "100000"
//! ```

pub mod backend;
pub mod client;
pub mod errors;
mod response;

// Re-export commonly used types
pub use backend::{BACKEND_ALIAS, BACKEND_NAME, SmsIrBackend};
pub use client::{BulkRequest, SmsIrApi, SmsIrClient, VerifyParameter, VerifyRequest};
pub use errors::{SmsIrError, SmsIrServiceError};
pub use response::{BulkSendResult, VerifySendResult};
