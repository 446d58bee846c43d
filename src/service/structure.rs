//! Main service implementation.

use crate::errors::{Operation, Result, SmsError};
use crate::factory::SmsBackendFactory;
use crate::providers::traits::SmsBackend;
use crate::settings::SmsSettings;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// SMS service that owns one backend.
///
/// The service forwards every call to its backend and applies the
/// delivery-error policy of the settings it was built with: delivery failures
/// are returned to the caller unless `debug` is off and `on_delivery_error` is
/// `suppress`, in which case they are logged and reported as success.
/// Validation, configuration and `NotImplemented` errors are always returned.
///
/// # Type Parameters
///
/// - `B`: The backend (defaults to a boxed backend from the factory)
///
/// # Example
///
/// ```rust,ignore
/// use sms_dispatch::{SmsBackendFactory, SmsService, SmsSettings};
///
/// let settings = SmsSettings::from_file("sms.toml")?;
/// let mut service = SmsService::from_settings(&settings)?;
///
/// service.send_one_message("+1 (202) 555-0173", "Hello", None).await?;
///
/// // Swap the backend, e.g. to print messages during a maintenance window
/// let console = SmsBackendFactory::with_default_path(SmsSettings::for_provider("console"))
///     .create_backend()?;
/// service.set_provider(console);
/// ```
#[derive(Debug)]
pub struct SmsService<B: SmsBackend = Box<dyn SmsBackend>> {
    provider: B,
    surface_delivery_errors: bool,
}

impl SmsService<Box<dyn SmsBackend>> {
    /// Resolve and build the backend named in `settings` from the bundled
    /// backends, and apply the settings' delivery-error policy.
    pub fn from_settings(settings: &SmsSettings) -> Result<Self> {
        let provider = SmsBackendFactory::with_default_path(settings.clone()).create_backend()?;
        Ok(Self::with_settings(provider, settings))
    }
}

impl<B: SmsBackend> SmsService<B> {
    /// Create a service that surfaces every error.
    pub fn new(provider: B) -> Self {
        Self {
            provider,
            surface_delivery_errors: true,
        }
    }

    /// Create a service using the delivery-error policy of `settings`.
    pub fn with_settings(provider: B, settings: &SmsSettings) -> Self {
        Self {
            provider,
            surface_delivery_errors: settings.surfaces_delivery_errors(),
        }
    }

    /// Get reference to the underlying backend.
    pub fn provider(&self) -> &B {
        &self.provider
    }

    /// Get mutable reference to the underlying backend.
    pub fn provider_mut(&mut self) -> &mut B {
        &mut self.provider
    }

    /// Replace the backend, keeping the delivery-error policy.
    pub fn set_provider(&mut self, provider: B) {
        #[cfg(feature = "tracing")]
        debug!(
            from = self.provider.name(),
            to = provider.name(),
            "Switching SMS backend"
        );

        self.provider = provider;
    }

    /// Whether delivery failures are returned to the caller.
    pub fn surfaces_delivery_errors(&self) -> bool {
        self.surface_delivery_errors
    }

    /// Send a single SMS.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "sms_service.send_one_message",
            skip_all,
            fields(backend = %self.provider.name())
        )
    )]
    pub async fn send_one_message(
        &self,
        phone_number: &str,
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let result = self
            .provider
            .send_one_message(phone_number, message, line_number)
            .await;
        self.apply_policy(Operation::SendOne, result)
    }

    /// Send the same SMS to several recipients.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "sms_service.send_bulk_messages",
            skip_all,
            fields(backend = %self.provider.name(), recipients = phone_numbers.len())
        )
    )]
    pub async fn send_bulk_messages(
        &self,
        phone_numbers: &[String],
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let result = self
            .provider
            .send_bulk_messages(phone_numbers, message, line_number)
            .await;
        self.apply_policy(Operation::SendBulk, result)
    }

    /// Send a verification value.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "sms_service.send_verify_message",
            skip_all,
            fields(backend = %self.provider.name())
        )
    )]
    pub async fn send_verify_message(&self, phone_number: &str, value: &str) -> Result<()> {
        let result = self.provider.send_verify_message(phone_number, value).await;
        self.apply_policy(Operation::SendVerify, result)
    }

    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn apply_policy(&self, operation: Operation, result: Result<()>) -> Result<()> {
        match result {
            Err(error @ SmsError::Delivery { .. }) if !self.surface_delivery_errors => {
                #[cfg(feature = "tracing")]
                warn!(
                    operation = %operation,
                    error = %error,
                    "Suppressed SMS delivery failure"
                );

                Ok(())
            }
            other => other,
        }
    }
}
