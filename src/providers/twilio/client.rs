//! Twilio HTTP client.

use super::errors::{Result, TwilioApiError, TwilioError};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Default Twilio REST API URL.
pub const DEFAULT_API_URL: &str = "https://api.twilio.com";

/// Default Twilio Verify API URL.
pub const DEFAULT_VERIFY_URL: &str = "https://verify.twilio.com";

const API_VERSION: &str = "2010-04-01";

// =============================================================================
// Wire types
// =============================================================================

/// Form body of `POST /2010-04-01/Accounts/{sid}/Messages.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRequest<'a> {
    #[serde(rename = "To")]
    pub to: &'a str,
    #[serde(rename = "From")]
    pub from: &'a str,
    #[serde(rename = "Body")]
    pub body: &'a str,
}

/// Subset of the Message resource returned on creation.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    #[serde(default)]
    pub status: String,
}

/// Form body of `POST /v2/Services/{sid}/Verifications`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationRequest<'a> {
    #[serde(rename = "To")]
    pub to: &'a str,
    #[serde(rename = "Channel")]
    pub channel: &'a str,
    #[serde(rename = "CustomCode", skip_serializing_if = "Option::is_none")]
    pub custom_code: Option<&'a str>,
}

/// Subset of the Verification resource returned on creation.
#[derive(Debug, Clone, Deserialize)]
pub struct VerificationResponse {
    pub sid: String,
    #[serde(default)]
    pub status: String,
}

// =============================================================================
// TwilioApi
// =============================================================================

/// Calls the Twilio backend makes against the vendor.
///
/// [`TwilioClient`] is the real implementation; tests substitute recording
/// stubs.
#[async_trait]
pub trait TwilioApi: Send + Sync + Debug {
    /// Create an outbound message.
    async fn send_message(&self, request: &MessageRequest<'_>) -> Result<MessageResponse>;

    /// Start a verification through a Verify service.
    async fn start_verification(
        &self,
        service_sid: &str,
        request: &VerificationRequest<'_>,
    ) -> Result<VerificationResponse>;
}

// =============================================================================
// TwilioClient
// =============================================================================

/// Twilio HTTP client.
///
/// Authenticates with HTTP basic auth (`account_sid:auth_token`) and posts
/// form-encoded bodies, as the Twilio REST API expects.
///
/// # Example
///
/// ```rust,ignore
/// use sms_dispatch::providers::twilio::{MessageRequest, TwilioClient};
///
/// let client = TwilioClient::new("ACxxxxxxxx", "auth_token")?;
/// let response = client
///     .create_message(&MessageRequest {
///         to: "+12025550173",
///         from: "+15005550006",
///         body: "Hello",
///     })
///     .await?;
/// println!("Queued message {}", response.sid);
/// ```
#[derive(Clone)]
pub struct TwilioClient {
    http_client: ClientWithMiddleware,
    account_sid: String,
    auth_token: SecretString,
    api_url: Url,
    verify_url: Url,
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("verify_url", &self.verify_url)
            .finish()
    }
}

/// Builder for configuring a [`TwilioClient`].
pub struct TwilioClientBuilder {
    account_sid: String,
    auth_token: String,
    api_url: Option<Url>,
    verify_url: Option<Url>,
    http_client: Option<ClientWithMiddleware>,
}

impl TwilioClientBuilder {
    /// Create a new builder with the given credentials.
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            account_sid: account_sid.into(),
            auth_token: auth_token.into(),
            api_url: None,
            verify_url: None,
            http_client: None,
        }
    }

    /// Set a custom REST API base URL.
    pub fn api_url(mut self, url: Url) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Set a custom Verify API base URL.
    pub fn verify_url(mut self, url: Url) -> Self {
        self.verify_url = Some(url);
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the [`TwilioClient`].
    pub fn build(self) -> Result<TwilioClient> {
        let api_url = match self.api_url {
            Some(url) => url,
            None => parse_base(DEFAULT_API_URL)?,
        };
        let verify_url = match self.verify_url {
            Some(url) => url,
            None => parse_base(DEFAULT_VERIFY_URL)?,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .build()
                    .map_err(TwilioError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(TwilioClient {
            http_client,
            account_sid: self.account_sid,
            auth_token: SecretString::from(self.auth_token),
            api_url,
            verify_url,
        })
    }
}

impl TwilioClient {
    /// Create a client against the public Twilio endpoints.
    ///
    /// # Arguments
    /// * `account_sid` - Account SID (`AC...`), used as the basic auth user
    /// * `auth_token` - Auth token, used as the basic auth password
    pub fn new(account_sid: impl Into<String>, auth_token: impl Into<String>) -> Result<Self> {
        Self::builder(account_sid, auth_token).build()
    }

    /// Create a client sending both REST and Verify calls to `endpoint`.
    pub fn with_endpoint(
        endpoint: impl AsRef<str>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> Result<Self> {
        let url = parse_base(endpoint.as_ref())?;
        Self::builder(account_sid, auth_token)
            .api_url(url.clone())
            .verify_url(url)
            .build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
    ) -> TwilioClientBuilder {
        TwilioClientBuilder::new(account_sid, auth_token)
    }

    /// Account SID the client authenticates as.
    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    /// Post a form body and decode the JSON reply.
    async fn post_form<T, R>(&self, url: Url, form: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let body = serde_urlencoded::to_string(form).map_err(TwilioError::EncodeForm)?;

        let response = self
            .http_client
            .post(url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(TwilioError::HttpRequest)?;

        let status = response.status();
        let text = response.text().await.map_err(TwilioError::ParseResponse)?;

        if !status.is_success() {
            return Err(TwilioError::Api(TwilioApiError::from_response(
                status.as_u16(),
                &text,
            )));
        }

        serde_json::from_str(&text).map_err(TwilioError::DeserializeJson)
    }

    /// Create an outbound message.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "TwilioClient::create_message",
            skip_all,
            fields(message_sid)
        )
    )]
    pub async fn create_message(&self, request: &MessageRequest<'_>) -> Result<MessageResponse> {
        let url = join_segments(
            &self.api_url,
            &[API_VERSION, "Accounts", &self.account_sid, "Messages.json"],
        )?;

        let response: MessageResponse = self.post_form(url, request).await?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("message_sid", response.sid.as_str())
                .set_status(Status::Ok);
        }

        Ok(response)
    }

    /// Start a verification through the Verify service `service_sid`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "TwilioClient::create_verification",
            skip_all,
            fields(service_sid = %service_sid, verification_sid)
        )
    )]
    pub async fn create_verification(
        &self,
        service_sid: &str,
        request: &VerificationRequest<'_>,
    ) -> Result<VerificationResponse> {
        let url = join_segments(
            &self.verify_url,
            &["v2", "Services", service_sid, "Verifications"],
        )?;

        let response: VerificationResponse = self.post_form(url, request).await?;

        #[cfg(feature = "tracing")]
        {
            Span::current()
                .record("verification_sid", response.sid.as_str())
                .set_status(Status::Ok);
        }

        Ok(response)
    }
}

#[async_trait]
impl TwilioApi for TwilioClient {
    async fn send_message(&self, request: &MessageRequest<'_>) -> Result<MessageResponse> {
        self.create_message(request).await
    }

    async fn start_verification(
        &self,
        service_sid: &str,
        request: &VerificationRequest<'_>,
    ) -> Result<VerificationResponse> {
        self.create_verification(service_sid, request).await
    }
}

fn parse_base(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|_| TwilioError::InvalidEndpoint {
        endpoint: url.to_string(),
    })
}

/// Append path segments to `base`, percent-encoding each one.
fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| TwilioError::InvalidEndpoint {
                endpoint: base.to_string(),
            })?;
        path.pop_if_empty().extend(segments);
    }
    Ok(url)
}
