//! Twilio backend implementation.

use super::client::{MessageRequest, TwilioApi, TwilioClient, VerificationRequest};
use crate::errors::{Operation, Result, SmsError};
use crate::providers::traits::SmsBackend;
use crate::settings::SmsSettings;
use crate::validator::PhoneNumberValidator;
use async_trait::async_trait;

#[cfg(feature = "tracing")]
use tracing::{error, info};

/// Name the Twilio backend is registered under.
pub const BACKEND_NAME: &str = "twilio";

/// Region used for validation when the settings do not name one.
pub const DEFAULT_REGION: &str = "US";

/// Provider key naming the Verify service used by `send_verify_message`.
pub const VERIFY_SERVICE_SID: &str = "VERIFY_SERVICE_SID";

const VERIFY_CHANNEL: &str = "sms";

/// Twilio backend.
///
/// Reads `API_KEY` (account SID) and `AUTH_TOKEN` from the provider settings.
/// Bulk sends are not offered. Verification codes go through Twilio Verify
/// when `VERIFY_SERVICE_SID` is configured.
///
/// # Example
///
/// ```rust,ignore
/// use sms_dispatch::providers::twilio::TwilioBackend;
/// use sms_dispatch::{SmsBackend, SmsSettings};
///
/// let settings = SmsSettings::from_file("sms.toml")?;
/// let backend = TwilioBackend::from_settings(&settings)?;
/// backend.send_one_message("+1 (202) 555-0173", "Hello", None).await?;
/// ```
#[derive(Debug)]
pub struct TwilioBackend<C: TwilioApi = TwilioClient> {
    client: C,
    validator: PhoneNumberValidator,
    region: String,
    line_number: Option<String>,
    verify_service_sid: Option<String>,
}

impl TwilioBackend<TwilioClient> {
    /// Build the backend and its HTTP client from settings.
    pub fn from_settings(settings: &SmsSettings) -> Result<Self> {
        let account_sid = settings.provider.require_api_key(BACKEND_NAME)?;
        let auth_token = settings.provider.require_auth_token(BACKEND_NAME)?;

        let client = TwilioClient::new(account_sid, auth_token).map_err(|e| {
            SmsError::configuration(format!("failed to build Twilio client: {e}"))
        })?;

        Ok(Self::with_client(client, settings))
    }

    /// Registry constructor.
    pub fn construct(settings: &SmsSettings) -> Result<Box<dyn SmsBackend>> {
        Ok(Box::new(Self::from_settings(settings)?))
    }
}

impl<C: TwilioApi> TwilioBackend<C> {
    /// Build the backend around an existing client.
    pub fn with_client(client: C, settings: &SmsSettings) -> Self {
        Self {
            client,
            validator: PhoneNumberValidator::new(),
            region: settings.provider.region_or(DEFAULT_REGION).to_string(),
            line_number: settings.provider.default_line_number().map(str::to_string),
            verify_service_sid: settings.provider.get(VERIFY_SERVICE_SID).map(str::to_string),
        }
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    fn sender<'a>(&'a self, line_number: Option<&'a str>) -> Result<&'a str> {
        line_number
            .filter(|line| !line.trim().is_empty())
            .or(self.line_number.as_deref())
            .ok_or_else(|| {
                SmsError::configuration(
                    "twilio requires a sender: set provider.LINE_NUMBER or pass a line number",
                )
            })
    }
}

#[async_trait]
impl<C: TwilioApi> SmsBackend for TwilioBackend<C> {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "TwilioBackend::send_one_message", skip_all)
    )]
    async fn send_one_message(
        &self,
        phone_number: &str,
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let to = self.validator.validate(phone_number, &self.region)?;
        let from = self.sender(line_number)?;

        let request = MessageRequest {
            to: to.as_str(),
            from,
            body: message,
        };

        match self.client.send_message(&request).await {
            Ok(_response) => {
                #[cfg(feature = "tracing")]
                info!(to = %to.redacted(), sid = %_response.sid, "Message accepted by Twilio");
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!(to = %to.redacted(), error = %e, "Twilio rejected message");
                Err(SmsError::delivery(BACKEND_NAME, e))
            }
        }
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "TwilioBackend::send_verify_message", skip_all)
    )]
    async fn send_verify_message(&self, phone_number: &str, value: &str) -> Result<()> {
        let Some(service_sid) = self.verify_service_sid.as_deref() else {
            return Err(SmsError::not_implemented(BACKEND_NAME, Operation::SendVerify));
        };

        let to = self.validator.validate(phone_number, &self.region)?;

        let request = VerificationRequest {
            to: to.as_str(),
            channel: VERIFY_CHANNEL,
            custom_code: Some(value),
        };

        match self.client.start_verification(service_sid, &request).await {
            Ok(_response) => {
                #[cfg(feature = "tracing")]
                info!(to = %to.redacted(), sid = %_response.sid, "Verification started");
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!(to = %to.redacted(), error = %e, "Twilio rejected verification");
                Err(SmsError::delivery(BACKEND_NAME, e))
            }
        }
    }

    fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::SendOne => true,
            Operation::SendBulk => false,
            Operation::SendVerify => self.verify_service_sid.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::providers::twilio::client::{MessageResponse, VerificationResponse};
    use crate::providers::twilio::errors::{Result as TwilioResult, TwilioApiError, TwilioError};
    use crate::settings::ProviderSettings;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct SentMessage {
        to: String,
        from: String,
        body: String,
    }

    #[derive(Debug, Default)]
    struct StubClient {
        messages: Mutex<Vec<SentMessage>>,
        verifications: Mutex<Vec<(String, String, Option<String>)>>,
        reject_with: Option<TwilioApiError>,
    }

    impl StubClient {
        fn rejecting(error: TwilioApiError) -> Self {
            Self {
                reject_with: Some(error),
                ..Self::default()
            }
        }

        fn messages(&self) -> Vec<SentMessage> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TwilioApi for StubClient {
        async fn send_message(
            &self,
            request: &MessageRequest<'_>,
        ) -> TwilioResult<MessageResponse> {
            self.messages.lock().unwrap().push(SentMessage {
                to: request.to.to_string(),
                from: request.from.to_string(),
                body: request.body.to_string(),
            });
            match &self.reject_with {
                Some(error) => Err(TwilioError::Api(error.clone())),
                None => Ok(MessageResponse {
                    sid: "SM123".to_string(),
                    status: "queued".to_string(),
                }),
            }
        }

        async fn start_verification(
            &self,
            service_sid: &str,
            request: &VerificationRequest<'_>,
        ) -> TwilioResult<VerificationResponse> {
            self.verifications.lock().unwrap().push((
                service_sid.to_string(),
                request.to.to_string(),
                request.custom_code.map(str::to_string),
            ));
            Ok(VerificationResponse {
                sid: "VE123".to_string(),
                status: "pending".to_string(),
            })
        }
    }

    fn settings() -> SmsSettings {
        SmsSettings::for_provider(BACKEND_NAME).with_provider(
            ProviderSettings::new(BACKEND_NAME)
                .api_key("AC123")
                .auth_token("token")
                .line_number("+15005550006"),
        )
    }

    #[tokio::test]
    async fn test_send_one_message_normalizes_recipient() {
        let backend = TwilioBackend::with_client(StubClient::default(), &settings());

        backend
            .send_one_message("+1 (202) 555-0173", "Hello", None)
            .await
            .unwrap();

        assert_eq!(
            backend.client().messages(),
            vec![SentMessage {
                to: "+12025550173".to_string(),
                from: "+15005550006".to_string(),
                body: "Hello".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_line_number_argument_overrides_settings() {
        let backend = TwilioBackend::with_client(StubClient::default(), &settings());

        backend
            .send_one_message("+12025550173", "Hi", Some("+15005550001"))
            .await
            .unwrap();

        assert_eq!(backend.client().messages()[0].from, "+15005550001");
    }

    #[tokio::test]
    async fn test_invalid_number_makes_no_call() {
        let backend = TwilioBackend::with_client(StubClient::default(), &settings());

        let err = backend
            .send_one_message("12345", "Hello", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(backend.client().messages().is_empty());
    }

    #[tokio::test]
    async fn test_missing_sender_is_configuration_error() {
        let settings = SmsSettings::for_provider(BACKEND_NAME)
            .with_provider(ProviderSettings::new(BACKEND_NAME).api_key("AC1").auth_token("t"));
        let backend = TwilioBackend::with_client(StubClient::default(), &settings);

        let err = backend
            .send_one_message("+12025550173", "Hello", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(backend.client().messages().is_empty());
    }

    #[tokio::test]
    async fn test_vendor_rejection_becomes_delivery_error() {
        let client = StubClient::rejecting(TwilioApiError {
            code: Some(21610),
            message: "Attempt to send to unsubscribed recipient".to_string(),
            more_info: None,
            status: 400,
        });
        let backend = TwilioBackend::with_client(client, &settings());

        let err = backend
            .send_one_message("+12025550173", "Hello", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Delivery);
        assert!(err.to_string().contains("Attempt to send to unsubscribed recipient"));
    }

    #[tokio::test]
    async fn test_bulk_is_not_implemented() {
        let backend = TwilioBackend::with_client(StubClient::default(), &settings());
        let numbers = vec!["+12025550173".to_string()];

        let err = backend
            .send_bulk_messages(&numbers, "Hello", None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SmsError::NotImplemented { operation: Operation::SendBulk, .. }
        ));
        assert!(backend.client().messages().is_empty());
        assert!(!backend.supports(Operation::SendBulk));
    }

    #[tokio::test]
    async fn test_verify_without_service_is_not_implemented() {
        let backend = TwilioBackend::with_client(StubClient::default(), &settings());

        let err = backend
            .send_verify_message("+12025550173", "482913")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        assert!(!backend.supports(Operation::SendVerify));
    }

    #[tokio::test]
    async fn test_verify_through_verify_service() {
        let settings = settings().with_provider(
            ProviderSettings::new(BACKEND_NAME)
                .api_key("AC123")
                .auth_token("token")
                .option(VERIFY_SERVICE_SID, "VA42"),
        );
        let backend = TwilioBackend::with_client(StubClient::default(), &settings);
        assert!(backend.supports(Operation::SendVerify));

        backend
            .send_verify_message("(202) 555-0173", "482913")
            .await
            .unwrap();

        let verifications = backend.client().verifications.lock().unwrap().clone();
        assert_eq!(
            verifications,
            vec![(
                "VA42".to_string(),
                "+12025550173".to_string(),
                Some("482913".to_string())
            )]
        );
    }

    #[test]
    fn test_from_settings_requires_credentials() {
        let settings = SmsSettings::for_provider(BACKEND_NAME);
        let err = TwilioBackend::from_settings(&settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("API_KEY"));

        let settings = settings.with_provider(ProviderSettings::new(BACKEND_NAME).api_key("AC1"));
        let err = TwilioBackend::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("AUTH_TOKEN"));
    }
}
