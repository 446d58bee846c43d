//! SMS.ir HTTP client.

use super::errors::{Result, SmsIrError};
use super::response::{BulkSendResult, SmsIrResponse, VerifySendResult};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use url::Url;

#[cfg(feature = "tracing")]
use opentelemetry::trace::Status;
#[cfg(feature = "tracing")]
use tracing::Span;
#[cfg(feature = "tracing")]
use tracing_opentelemetry::OpenTelemetrySpanExt;

/// Default SMS.ir API URL.
pub const DEFAULT_API_URL: &str = "https://api.sms.ir";

const API_KEY_HEADER: &str = "X-API-KEY";

// =============================================================================
// Wire types
// =============================================================================

/// Body of `POST /v1/send/bulk`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest<'a> {
    pub line_number: u64,
    pub message_text: &'a str,
    pub mobiles: Vec<&'a str>,
}

/// Body of `POST /v1/send/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest<'a> {
    pub mobile: &'a str,
    pub template_id: u64,
    pub parameters: Vec<VerifyParameter<'a>>,
}

/// Template parameter of a verification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyParameter<'a> {
    pub name: &'a str,
    pub value: &'a str,
}

// =============================================================================
// SmsIrApi
// =============================================================================

/// Calls the SMS.ir backend makes against the vendor.
#[async_trait]
pub trait SmsIrApi: Send + Sync + Debug {
    /// Send one text to a list of mobiles from one line.
    async fn send_bulk(&self, request: &BulkRequest<'_>) -> Result<BulkSendResult>;

    /// Send a templated verification message.
    async fn send_verify(&self, request: &VerifyRequest<'_>) -> Result<VerifySendResult>;
}

// =============================================================================
// SmsIrClient
// =============================================================================

/// SMS.ir HTTP client.
///
/// Authenticates with the `X-API-KEY` header and exchanges JSON bodies.
///
/// # Example
///
/// ```rust,ignore
/// use sms_dispatch::providers::sms_ir::{BulkRequest, SmsIrClient};
///
/// let client = SmsIrClient::with_api_key("your_api_key")?;
/// let result = client
///     .bulk_send(&BulkRequest {
///         line_number: 30007732000000,
///         message_text: "Hello",
///         mobiles: vec!["+989121234567"],
///     })
///     .await?;
/// println!("Pack {:?}", result.pack_id);
/// ```
#[derive(Clone)]
pub struct SmsIrClient {
    http_client: ClientWithMiddleware,
    api_key: SecretString,
    endpoint: Url,
}

impl std::fmt::Debug for SmsIrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsIrClient")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Builder for configuring a [`SmsIrClient`].
pub struct SmsIrClientBuilder {
    api_key: String,
    endpoint: Option<Url>,
    http_client: Option<ClientWithMiddleware>,
}

impl SmsIrClientBuilder {
    /// Create a new builder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: None,
            http_client: None,
        }
    }

    /// Set a custom API endpoint.
    pub fn endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set a custom HTTP client with middleware.
    pub fn http_client(mut self, client: ClientWithMiddleware) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Build the [`SmsIrClient`].
    pub fn build(self) -> Result<SmsIrClient> {
        let endpoint = match self.endpoint {
            Some(endpoint) => endpoint,
            None => parse_base(DEFAULT_API_URL)?,
        };

        let http_client = match self.http_client {
            Some(client) => client,
            None => {
                let client = reqwest::Client::builder()
                    .build()
                    .map_err(SmsIrError::BuildHttpClient)?;
                ClientBuilder::new(client).build()
            }
        };

        Ok(SmsIrClient {
            http_client,
            api_key: SecretString::from(self.api_key),
            endpoint,
        })
    }
}

impl SmsIrClient {
    /// Create a new SMS.ir client.
    ///
    /// # Arguments
    /// * `endpoint` - Base URL for the SMS.ir API
    /// * `api_key` - API key for authentication
    pub fn new(endpoint: impl AsRef<str>, api_key: impl Into<String>) -> Result<Self> {
        let url = parse_base(endpoint.as_ref())?;
        Self::builder(api_key).endpoint(url).build()
    }

    /// Create a new client with the default API URL.
    pub fn with_api_key(api_key: impl Into<String>) -> Result<Self> {
        Self::builder(api_key).build()
    }

    /// Create a builder for configuring the client.
    pub fn builder(api_key: impl Into<String>) -> SmsIrClientBuilder {
        SmsIrClientBuilder::new(api_key)
    }

    fn request_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| SmsIrError::InvalidEndpoint {
                    endpoint: self.endpoint.to_string(),
                })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }

    /// Post a JSON body and unwrap the SMS.ir envelope.
    async fn post_json<T, R>(&self, url: Url, body: &T) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned + Default,
    {
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .header(ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(SmsIrError::HttpRequest)?;

        let status = response.status();
        let text = response.text().await.map_err(SmsIrError::ParseResponse)?;

        let envelope = match SmsIrResponse::<R>::from_text(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SmsIrError::HttpStatus {
                    status: status.as_u16(),
                    body: text.trim().to_string(),
                });
            }
            Err(e) => return Err(SmsIrError::DeserializeJson(e)),
        };

        let data = envelope.into_result().map_err(SmsIrError::Service)?;
        Ok(data.unwrap_or_default())
    }

    /// Send one text to several mobiles.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsIrClient::bulk_send",
            skip_all,
            fields(line_number = request.line_number, recipients = request.mobiles.len(), pack_id)
        )
    )]
    pub async fn bulk_send(&self, request: &BulkRequest<'_>) -> Result<BulkSendResult> {
        let url = self.request_url(&["v1", "send", "bulk"])?;

        let result: BulkSendResult = self.post_json(url, request).await?;

        #[cfg(feature = "tracing")]
        {
            let span = Span::current();
            if let Some(pack_id) = &result.pack_id {
                span.record("pack_id", pack_id.as_str());
            }
            span.set_status(Status::Ok);
        }

        Ok(result)
    }

    /// Send a templated verification message.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsIrClient::verify_send",
            skip_all,
            fields(template_id = request.template_id, message_id)
        )
    )]
    pub async fn verify_send(&self, request: &VerifyRequest<'_>) -> Result<VerifySendResult> {
        let url = self.request_url(&["v1", "send", "verify"])?;

        let result: VerifySendResult = self.post_json(url, request).await?;

        #[cfg(feature = "tracing")]
        {
            let span = Span::current();
            if let Some(message_id) = result.message_id {
                span.record("message_id", message_id);
            }
            span.set_status(Status::Ok);
        }

        Ok(result)
    }
}

#[async_trait]
impl SmsIrApi for SmsIrClient {
    async fn send_bulk(&self, request: &BulkRequest<'_>) -> Result<BulkSendResult> {
        self.bulk_send(request).await
    }

    async fn send_verify(&self, request: &VerifyRequest<'_>) -> Result<VerifySendResult> {
        self.verify_send(request).await
    }
}

fn parse_base(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|_| SmsIrError::InvalidEndpoint {
        endpoint: url.to_string(),
    })
}
