//! End-to-end dispatch tests.
//!
//! Backends are resolved through the factory and the process-wide registry,
//! then driven either by a recording vendor client or by a `wiremock` server
//! standing in for the vendor API.

use async_trait::async_trait;
use sms_dispatch::providers::sms_ir::{SmsIrBackend, SmsIrClient};
use sms_dispatch::providers::twilio::client::{MessageResponse, VerificationResponse};
use sms_dispatch::providers::twilio::errors::Result as TwilioResult;
use sms_dispatch::providers::twilio::{
    MessageRequest, TwilioApi, TwilioBackend, TwilioClient, VerificationRequest,
};
use sms_dispatch::{
    DeliveryErrorPolicy, ErrorKind, Operation, SmsBackend, SmsBackendFactory, SmsError,
    SmsService, SmsSettings, register_backend,
};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TWILIO_SETTINGS: &str = r#"
    [provider]
    NAME = "twilio"
    API_KEY = "k"
    AUTH_TOKEN = "t"
    LINE_NUMBER = "+15005550006"
"#;

// =============================================================================
// Recording Twilio client
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct SentMessage {
    to: String,
    from: String,
    body: String,
}

#[derive(Debug, Clone, Default)]
struct RecordingClient {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

#[async_trait]
impl TwilioApi for RecordingClient {
    async fn send_message(&self, request: &MessageRequest<'_>) -> TwilioResult<MessageResponse> {
        self.sent.lock().unwrap().push(SentMessage {
            to: request.to.to_string(),
            from: request.from.to_string(),
            body: request.body.to_string(),
        });
        Ok(MessageResponse {
            sid: "SM00000000000000000000000000000001".to_string(),
            status: "queued".to_string(),
        })
    }

    async fn start_verification(
        &self,
        _service_sid: &str,
        _request: &VerificationRequest<'_>,
    ) -> TwilioResult<VerificationResponse> {
        unreachable!("verification is not configured in these tests")
    }
}

/// Register a `twilio` backend backed by a recording client under `path`.
fn register_recording_twilio(path: &str) -> Arc<Mutex<Vec<SentMessage>>> {
    let client = RecordingClient::default();
    let sent = Arc::clone(&client.sent);

    register_backend(path, "twilio", move |settings| {
        Ok(Box::new(TwilioBackend::with_client(client.clone(), settings)) as Box<dyn SmsBackend>)
    })
    .unwrap();

    sent
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_twilio_send_one_message_end_to_end() {
    let sent = register_recording_twilio("e2e.send_one");
    let settings = SmsSettings::from_toml_str(TWILIO_SETTINGS).unwrap();

    let factory = SmsBackendFactory::new(settings, "e2e.send_one");
    let resolved = factory.get_backend().unwrap();
    assert_eq!(resolved.name().as_str(), "twilio");

    let backend = resolved.instantiate(factory.settings()).unwrap();
    backend
        .send_one_message("+1 (202) 555-0173", "Hello", None)
        .await
        .unwrap();

    assert_eq!(
        *sent.lock().unwrap(),
        vec![SentMessage {
            to: "+12025550173".to_string(),
            from: "+15005550006".to_string(),
            body: "Hello".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_twilio_invalid_number_never_reaches_vendor() {
    let sent = register_recording_twilio("e2e.invalid_number");
    let settings = SmsSettings::from_toml_str(TWILIO_SETTINGS).unwrap();

    let backend = SmsBackendFactory::new(settings, "e2e.invalid_number")
        .create_backend()
        .unwrap();

    let err = backend
        .send_one_message("12345", "Hello", None)
        .await
        .unwrap_err();

    assert!(matches!(err, SmsError::Validation(ref e) if e.input == "12345"));
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unsupported_operations_make_no_vendor_call() {
    let sent = register_recording_twilio("e2e.unsupported");
    let settings = SmsSettings::from_toml_str(TWILIO_SETTINGS).unwrap();

    let backend = SmsBackendFactory::new(settings, "e2e.unsupported")
        .create_backend()
        .unwrap();

    let err = backend
        .send_bulk_messages(&["+12025550173".to_string()], "Hello", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SmsError::NotImplemented { operation: Operation::SendBulk, .. }
    ));

    let err = backend
        .send_verify_message("+12025550173", "482913")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotImplemented);

    assert!(sent.lock().unwrap().is_empty());
}

#[test]
fn test_unknown_vendor_is_not_found() {
    let settings = SmsSettings::for_provider("unknownvendor");
    let err = SmsBackendFactory::with_default_path(settings)
        .get_backend()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BackendNotFound);
}

// =============================================================================
// Against a mocked vendor API
// =============================================================================

#[tokio::test]
async fn test_twilio_http_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/k/Messages.json"))
        .and(body_string("To=%2B12025550173&From=%2B15005550006&Body=Hello"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "SM0123",
            "status": "queued"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = SmsSettings::from_toml_str(TWILIO_SETTINGS).unwrap();
    let client = TwilioClient::with_endpoint(mock_server.uri(), "k", "t").unwrap();
    let service = SmsService::with_settings(TwilioBackend::with_client(client, &settings), &settings);

    service
        .send_one_message("(202) 555-0173", "Hello", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_twilio_rejection_keeps_vendor_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": 21408,
            "message": "Permission to send an SMS has not been enabled for the region",
            "more_info": "https://www.twilio.com/docs/errors/21408",
            "status": 400
        })))
        .mount(&mock_server)
        .await;

    let settings = SmsSettings::from_toml_str(TWILIO_SETTINGS).unwrap();
    let client = TwilioClient::with_endpoint(mock_server.uri(), "k", "t").unwrap();
    let service = SmsService::with_settings(TwilioBackend::with_client(client, &settings), &settings);

    let err = service
        .send_one_message("+442079460018", "Hello", None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Delivery);
    assert!(err.to_string().contains("21408"));
    assert!(err.to_string().contains("Permission to send an SMS"));
}

#[tokio::test]
async fn test_suppressed_delivery_failure_still_calls_vendor_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = SmsSettings::from_toml_str(TWILIO_SETTINGS)
        .unwrap()
        .with_delivery_error_policy(DeliveryErrorPolicy::Suppress);
    let client = TwilioClient::with_endpoint(mock_server.uri(), "k", "t").unwrap();
    let service = SmsService::with_settings(TwilioBackend::with_client(client, &settings), &settings);

    service
        .send_one_message("+12025550173", "Hello", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_sms_ir_bulk_http_round_trip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/send/bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": 1,
            "message": "موفق",
            "data": {"packId": "b7", "messageIds": [1, 2], "cost": 2.0}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let settings = SmsSettings::from_toml_str(
        r#"
        [provider]
        NAME = "sms_ir"
        API_KEY = "key"
        LINE_NUMBER = "30007732000000"
        "#,
    )
    .unwrap();
    let client = SmsIrClient::new(mock_server.uri(), "key").unwrap();
    let backend = SmsIrBackend::with_client(client, &settings).unwrap();

    backend
        .send_bulk_messages(
            &["0912 123 4567".to_string(), "09351234567".to_string()],
            "Hello",
            None,
        )
        .await
        .unwrap();
}
