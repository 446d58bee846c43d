//! # SMS Dispatch
//!
//! A pluggable dispatch layer for sending SMS through interchangeable
//! providers.
//!
//! Applications send single, bulk or verification-code messages through one
//! contract ([`SmsBackend`]) and pick the vendor by name in their settings.
//! Every backend validates destination numbers against the numbering plan and
//! normalizes them to E.164 before anything leaves the process.
//!
//! ## Supported Backends
//!
//! | Backend | Names | Feature | Website |
//! |---------|-------|---------|---------|
//! | Console | `console` | always | - |
//! | Twilio | `twilio` | `twilio` (default) | <https://www.twilio.com> |
//! | SMS.ir | `smsir`, `sms_ir` | `sms-ir` (default) | <https://sms.ir> |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sms_dispatch::{SmsService, SmsSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // [provider] NAME = "twilio", API_KEY, AUTH_TOKEN, LINE_NUMBER
//!     let settings = SmsSettings::load("sms.toml")?;
//!
//!     let service = SmsService::from_settings(&settings)?;
//!     service
//!         .send_one_message("+1 (202) 555-0173", "Your order has shipped", None)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SmsService<B>              (delivery-error policy)
//!         │
//!         ▼
//! SmsBackendFactory          (provider.NAME -> ResolvedBackend)
//!         │
//!         ▼
//! BackendRegistry            (base path + canonical name -> constructor)
//!         │
//!         ▼
//!    SmsBackend              (trait: ConsoleBackend, TwilioBackend, SmsIrBackend)
//!         │
//!         ▼
//! PhoneNumberValidator       (E.164 normalization)
//! ```
//!
//! ## Features
//!
//! - `twilio` - Twilio backend (enabled by default)
//! - `sms-ir` - SMS.ir backend (enabled by default)
//! - `tracing` - OpenTelemetry tracing instrumentation (enabled by default)
//!
//! A backend whose feature is disabled still resolves by name, but building it
//! fails with [`SmsError::DependencyMissing`].

pub mod errors;
pub mod factory;
pub mod providers;
pub mod service;
pub mod settings;
pub mod types;
pub mod validator;

// Re-export commonly used types at the crate root
pub use errors::{ErrorKind, Operation, Result, SmsError, ValidationError, ValidationReason};
pub use factory::SmsBackendFactory;
pub use providers::{
    BackendConstructor, BackendRegistry, DEFAULT_BACKEND_PATH, ResolvedBackend, SmsBackend,
    register_backend, unregister_backend,
};
pub use service::SmsService;
pub use settings::{DeliveryErrorPolicy, ProviderSettings, SmsSettings};
pub use types::{BackendName, ValidatedPhoneNumber};
pub use validator::PhoneNumberValidator;
