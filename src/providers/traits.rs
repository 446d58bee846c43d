//! Provider contract definition.

use crate::errors::{Operation, Result, SmsError};
use async_trait::async_trait;
use std::fmt::Debug;

/// Core trait that all SMS backends must implement.
///
/// This trait defines the three operations every backend exposes:
/// - Sending a single message
/// - Sending one message to many recipients
/// - Sending a verification code
///
/// Backends validate destination numbers before any network call and
/// translate vendor failures into [`SmsError::Delivery`] at their boundary, so
/// callers only ever see the crate's error taxonomy.
///
/// Bulk and verification sends are optional. The default implementations
/// return [`SmsError::NotImplemented`] without touching the network; callers
/// must not expect an automatic fallback to single sends.
///
/// # Concurrency
///
/// A backend exclusively owns its vendor client. The bundled HTTP clients are
/// safe to share, but other vendor clients may not be; the contract adds no
/// locking of its own.
///
/// # Example
///
/// ```rust,ignore
/// use sms_dispatch::{Result, SmsBackend};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct MyBackend { /* ... */ }
///
/// #[async_trait]
/// impl SmsBackend for MyBackend {
///     fn name(&self) -> &str {
///         "mybackend"
///     }
///
///     async fn send_one_message(
///         &self,
///         phone_number: &str,
///         message: &str,
///         line_number: Option<&str>,
///     ) -> Result<()> {
///         // Validate the number, then call the vendor
///     }
/// }
/// ```
#[async_trait]
pub trait SmsBackend: Send + Sync + Debug {
    /// Canonical name of the backend (e.g. `twilio`).
    fn name(&self) -> &str;

    /// Send a single SMS.
    ///
    /// # Arguments
    /// * `phone_number` - Recipient number in any common notation
    /// * `message` - Message body
    /// * `line_number` - Sender line; overrides the configured `LINE_NUMBER`
    async fn send_one_message(
        &self,
        phone_number: &str,
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()>;

    /// Send the same SMS to several recipients.
    ///
    /// Every number is validated before anything is sent.
    async fn send_bulk_messages(
        &self,
        phone_numbers: &[String],
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let _ = (phone_numbers, message, line_number);
        Err(SmsError::not_implemented(self.name(), Operation::SendBulk))
    }

    /// Send a one-time verification value through the vendor's
    /// verification channel.
    async fn send_verify_message(&self, phone_number: &str, value: &str) -> Result<()> {
        let _ = (phone_number, value);
        Err(SmsError::not_implemented(self.name(), Operation::SendVerify))
    }

    /// Whether the backend implements the given operation.
    ///
    /// Default implementation reports single sends only.
    fn supports(&self, operation: Operation) -> bool {
        operation == Operation::SendOne
    }
}

#[async_trait]
impl<B: SmsBackend + ?Sized> SmsBackend for Box<B> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn send_one_message(
        &self,
        phone_number: &str,
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        (**self)
            .send_one_message(phone_number, message, line_number)
            .await
    }

    async fn send_bulk_messages(
        &self,
        phone_numbers: &[String],
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        (**self)
            .send_bulk_messages(phone_numbers, message, line_number)
            .await
    }

    async fn send_verify_message(&self, phone_number: &str, value: &str) -> Result<()> {
        (**self).send_verify_message(phone_number, value).await
    }

    fn supports(&self, operation: Operation) -> bool {
        (**self).supports(operation)
    }
}
