//! SMS.ir backend implementation.

use super::client::{BulkRequest, SmsIrApi, SmsIrClient, VerifyParameter, VerifyRequest};
use crate::errors::{Operation, Result, SmsError};
use crate::providers::traits::SmsBackend;
use crate::settings::SmsSettings;
use crate::types::ValidatedPhoneNumber;
use crate::validator::PhoneNumberValidator;
use async_trait::async_trait;

#[cfg(feature = "tracing")]
use tracing::{error, info};

/// Name the SMS.ir backend is registered under.
pub const BACKEND_NAME: &str = "smsir";

/// Alias accepted for [`BACKEND_NAME`].
pub const BACKEND_ALIAS: &str = "sms_ir";

/// Region used for validation when the settings do not name one.
pub const DEFAULT_REGION: &str = "IR";

/// Provider key holding the verification template id.
pub const TEMPLATE_ID: &str = "TEMPLATE_ID";

/// Provider key naming the template parameter that receives the code.
pub const VERIFY_PARAMETER: &str = "VERIFY_PARAMETER";

const DEFAULT_VERIFY_PARAMETER: &str = "Code";

/// SMS.ir backend.
///
/// Single and bulk sends share the `/v1/send/bulk` endpoint. Verification
/// messages need a `TEMPLATE_ID` registered in the SMS.ir panel; the code is
/// passed as the `Code` template parameter unless `VERIFY_PARAMETER` says
/// otherwise.
#[derive(Debug)]
pub struct SmsIrBackend<C: SmsIrApi = SmsIrClient> {
    client: C,
    validator: PhoneNumberValidator,
    region: String,
    line_number: Option<String>,
    template_id: Option<u64>,
    verify_parameter: String,
}

impl SmsIrBackend<SmsIrClient> {
    /// Build the backend and its HTTP client from settings.
    pub fn from_settings(settings: &SmsSettings) -> Result<Self> {
        let api_key = settings.provider.require_api_key(BACKEND_NAME)?;

        let client = SmsIrClient::with_api_key(api_key).map_err(|e| {
            SmsError::configuration(format!("failed to build SMS.ir client: {e}"))
        })?;

        Self::with_client(client, settings)
    }

    /// Registry constructor.
    pub fn construct(settings: &SmsSettings) -> Result<Box<dyn SmsBackend>> {
        Ok(Box::new(Self::from_settings(settings)?))
    }
}

impl<C: SmsIrApi> SmsIrBackend<C> {
    /// Build the backend around an existing client.
    ///
    /// Fails when `TEMPLATE_ID` is set but not numeric.
    pub fn with_client(client: C, settings: &SmsSettings) -> Result<Self> {
        let provider = &settings.provider;

        let template_id = provider
            .get(TEMPLATE_ID)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    SmsError::configuration(format!(
                        "{BACKEND_NAME} requires a numeric provider.{TEMPLATE_ID}, got '{raw}'"
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            client,
            validator: PhoneNumberValidator::new(),
            region: provider.region_or(DEFAULT_REGION).to_string(),
            line_number: provider.default_line_number().map(str::to_string),
            template_id,
            verify_parameter: provider
                .get(VERIFY_PARAMETER)
                .unwrap_or(DEFAULT_VERIFY_PARAMETER)
                .to_string(),
        })
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Sender line as the numeric id SMS.ir expects.
    fn sender(&self, line_number: Option<&str>) -> Result<u64> {
        let line = line_number
            .filter(|line| !line.trim().is_empty())
            .or(self.line_number.as_deref())
            .ok_or_else(|| {
                SmsError::configuration(
                    "smsir requires a sender: set provider.LINE_NUMBER or pass a line number",
                )
            })?;

        let digits = line.trim();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(SmsError::configuration(format!(
                "smsir line number must be numeric, got '{line}'"
            )));
        }

        digits.parse().map_err(|_| {
            SmsError::configuration(format!("smsir line number is out of range, got '{line}'"))
        })
    }

    async fn dispatch(
        &self,
        recipients: &[ValidatedPhoneNumber],
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let request = BulkRequest {
            line_number: self.sender(line_number)?,
            message_text: message,
            mobiles: recipients.iter().map(ValidatedPhoneNumber::as_str).collect(),
        };

        match self.client.send_bulk(&request).await {
            Ok(_result) => {
                #[cfg(feature = "tracing")]
                info!(
                    recipients = recipients.len(),
                    pack_id = ?_result.pack_id,
                    "Message accepted by SMS.ir"
                );
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!(
                    recipients = ?recipients.iter().map(ValidatedPhoneNumber::redacted).collect::<Vec<_>>(),
                    error = %e,
                    "SMS.ir rejected message"
                );
                Err(SmsError::delivery(BACKEND_NAME, e))
            }
        }
    }
}

#[async_trait]
impl<C: SmsIrApi> SmsBackend for SmsIrBackend<C> {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "SmsIrBackend::send_one_message", skip_all)
    )]
    async fn send_one_message(
        &self,
        phone_number: &str,
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let recipient = self.validator.validate(phone_number, &self.region)?;
        self.dispatch(&[recipient], message, line_number).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsIrBackend::send_bulk_messages",
            skip_all,
            fields(recipients = phone_numbers.len())
        )
    )]
    async fn send_bulk_messages(
        &self,
        phone_numbers: &[String],
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let recipients = self.validator.validate_all(phone_numbers, &self.region)?;
        if recipients.is_empty() {
            return Ok(());
        }
        self.dispatch(&recipients, message, line_number).await
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "SmsIrBackend::send_verify_message", skip_all)
    )]
    async fn send_verify_message(&self, phone_number: &str, value: &str) -> Result<()> {
        let Some(template_id) = self.template_id else {
            return Err(SmsError::not_implemented(BACKEND_NAME, Operation::SendVerify));
        };

        let recipient = self.validator.validate(phone_number, &self.region)?;

        let request = VerifyRequest {
            mobile: recipient.as_str(),
            template_id,
            parameters: vec![VerifyParameter {
                name: &self.verify_parameter,
                value,
            }],
        };

        match self.client.send_verify(&request).await {
            Ok(_result) => {
                #[cfg(feature = "tracing")]
                info!(
                    to = %recipient.redacted(),
                    message_id = ?_result.message_id,
                    "Verification message accepted by SMS.ir"
                );
                Ok(())
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                error!(to = %recipient.redacted(), error = %e, "SMS.ir rejected verification");
                Err(SmsError::delivery(BACKEND_NAME, e))
            }
        }
    }

    fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::SendOne | Operation::SendBulk => true,
            Operation::SendVerify => self.template_id.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::providers::sms_ir::errors::{Result as SmsIrResult, SmsIrError, SmsIrServiceError};
    use crate::providers::sms_ir::response::{BulkSendResult, VerifySendResult};
    use crate::settings::ProviderSettings;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct SentBulk {
        line_number: u64,
        message_text: String,
        mobiles: Vec<String>,
    }

    #[derive(Debug, Default)]
    struct StubClient {
        bulk: Mutex<Vec<SentBulk>>,
        verify: Mutex<Vec<(String, u64, Vec<(String, String)>)>>,
        fail_status: Option<i64>,
    }

    impl StubClient {
        fn failing(status: i64) -> Self {
            Self {
                fail_status: Some(status),
                ..Self::default()
            }
        }

        fn bulk(&self) -> Vec<SentBulk> {
            self.bulk.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SmsIrApi for StubClient {
        async fn send_bulk(&self, request: &BulkRequest<'_>) -> SmsIrResult<BulkSendResult> {
            self.bulk.lock().unwrap().push(SentBulk {
                line_number: request.line_number,
                message_text: request.message_text.to_string(),
                mobiles: request.mobiles.iter().map(|m| m.to_string()).collect(),
            });
            match self.fail_status {
                Some(status) => Err(SmsIrError::Service(SmsIrServiceError {
                    status,
                    message: "line number is not valid".to_string(),
                })),
                None => Ok(BulkSendResult::default()),
            }
        }

        async fn send_verify(&self, request: &VerifyRequest<'_>) -> SmsIrResult<VerifySendResult> {
            self.verify.lock().unwrap().push((
                request.mobile.to_string(),
                request.template_id,
                request
                    .parameters
                    .iter()
                    .map(|p| (p.name.to_string(), p.value.to_string()))
                    .collect(),
            ));
            Ok(VerifySendResult::default())
        }
    }

    fn provider() -> ProviderSettings {
        ProviderSettings::new(BACKEND_NAME)
            .api_key("key")
            .line_number("30007732000000")
    }

    fn backend(client: StubClient, provider: ProviderSettings) -> SmsIrBackend<StubClient> {
        let settings = SmsSettings::for_provider(BACKEND_NAME).with_provider(provider);
        SmsIrBackend::with_client(client, &settings).unwrap()
    }

    #[tokio::test]
    async fn test_send_one_message_uses_iran_region() {
        let backend = backend(StubClient::default(), provider());

        backend
            .send_one_message("0912 123 4567", "سلام", None)
            .await
            .unwrap();

        assert_eq!(
            backend.client().bulk(),
            vec![SentBulk {
                line_number: 30007732000000,
                message_text: "سلام".to_string(),
                mobiles: vec!["+989121234567".to_string()],
            }]
        );
    }

    #[tokio::test]
    async fn test_bulk_sends_one_request() {
        let backend = backend(StubClient::default(), provider());
        let numbers = vec!["09121234567".to_string(), "+98 935 123 4567".to_string()];

        backend
            .send_bulk_messages(&numbers, "Sale!", Some("3000505"))
            .await
            .unwrap();

        let sent = backend.client().bulk();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].line_number, 3000505);
        assert_eq!(sent[0].mobiles, vec!["+989121234567", "+989351234567"]);
    }

    #[tokio::test]
    async fn test_bulk_with_invalid_number_sends_nothing() {
        let backend = backend(StubClient::default(), provider());
        let numbers = vec!["09121234567".to_string(), "12345".to_string()];

        let err = backend
            .send_bulk_messages(&numbers, "Sale!", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(backend.client().bulk().is_empty());
    }

    #[tokio::test]
    async fn test_failure_status_is_delivery_error() {
        let backend = backend(StubClient::failing(13), provider());

        let err = backend
            .send_one_message("09121234567", "Hi", None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Delivery);
        assert!(err.to_string().contains("line number is not valid"));
    }

    #[tokio::test]
    async fn test_non_numeric_line_number() {
        let backend = backend(StubClient::default(), provider());

        let err = backend
            .send_one_message("09121234567", "Hi", Some("+15005550006"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("must be numeric"));
        assert!(backend.client().bulk().is_empty());
    }

    #[tokio::test]
    async fn test_signed_line_numbers_are_rejected() {
        let backend = backend(StubClient::default(), provider());

        for line in ["+3000", "-3000", "30 00"] {
            let err = backend
                .send_one_message("09121234567", "Hi", Some(line))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{line}");
        }
        assert!(backend.client().bulk().is_empty());
    }

    #[tokio::test]
    async fn test_verify_without_template_is_not_implemented() {
        let backend = backend(StubClient::default(), provider());

        let err = backend
            .send_verify_message("09121234567", "482913")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotImplemented);
        assert!(!backend.supports(Operation::SendVerify));
    }

    #[tokio::test]
    async fn test_verify_with_template() {
        let backend = backend(
            StubClient::default(),
            provider().option(TEMPLATE_ID, "100000"),
        );
        assert!(backend.supports(Operation::SendVerify));

        backend
            .send_verify_message("09121234567", "482913")
            .await
            .unwrap();

        let sent = backend.client().verify.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![(
                "+989121234567".to_string(),
                100000,
                vec![("Code".to_string(), "482913".to_string())]
            )]
        );
    }

    #[test]
    fn test_invalid_template_id_fails_construction() {
        let settings = SmsSettings::for_provider(BACKEND_NAME)
            .with_provider(provider().option(TEMPLATE_ID, "welcome"));

        let err = SmsIrBackend::with_client(StubClient::default(), &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_from_settings_requires_api_key() {
        let settings = SmsSettings::for_provider(BACKEND_NAME);
        let err = SmsIrBackend::from_settings(&settings).unwrap_err();
        assert!(err.to_string().contains("API_KEY"));
    }
}
