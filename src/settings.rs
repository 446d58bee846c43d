//! Dispatch settings.
//!
//! Settings are built once by the caller and then only read: the resolver and
//! every backend constructor borrow them. They can be assembled in code, or
//! loaded from a TOML file with optional `SMS__`-prefixed environment
//! overrides:
//!
//! ```toml
//! debug = false
//! on_delivery_error = "surface"
//!
//! [provider]
//! NAME = "twilio"
//! API_KEY = "AC0123456789abcdef"
//! AUTH_TOKEN = "secret"
//! LINE_NUMBER = "+15005550006"
//! ```

use crate::errors::{Result, SmsError};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Prefix of environment variables read by [`SmsSettings::load`].
pub const ENV_PREFIX: &str = "SMS";

/// What [`SmsService`](crate::service::SmsService) does with delivery
/// failures when `debug` is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryErrorPolicy {
    /// Return delivery failures to the caller.
    #[default]
    Surface,
    /// Log delivery failures and report success.
    Suppress,
}

/// Top-level dispatch settings.
#[derive(Clone, Deserialize)]
pub struct SmsSettings {
    /// Raise every failure loudly, regardless of `on_delivery_error`.
    #[serde(default)]
    pub debug: bool,

    /// Delivery failure policy used when `debug` is off.
    #[serde(default)]
    pub on_delivery_error: DeliveryErrorPolicy,

    /// Provider selection and credentials.
    pub provider: ProviderSettings,
}

impl SmsSettings {
    /// Settings selecting `provider` with no credentials.
    pub fn for_provider(name: impl Into<String>) -> Self {
        Self {
            debug: false,
            on_delivery_error: DeliveryErrorPolicy::default(),
            provider: ProviderSettings::new(name),
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_delivery_error_policy(mut self, policy: DeliveryErrorPolicy) -> Self {
        self.on_delivery_error = policy;
        self
    }

    pub fn with_provider(mut self, provider: ProviderSettings) -> Self {
        self.provider = provider;
        self
    }

    /// Parse settings from a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Read settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Read settings from a TOML file, then apply environment overrides
    /// such as `SMS__PROVIDER__API_KEY`.
    ///
    /// Environment keys arrive lower-cased, so provider overrides are matched
    /// against the file's keys without regard to case.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut settings = Self::from_file(path)?;
        let overrides: EnvOverrides = Config::builder()
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;
        settings.apply(overrides);
        Ok(settings)
    }

    fn apply(&mut self, overrides: EnvOverrides) {
        if let Some(debug) = overrides.debug {
            self.debug = debug;
        }
        if let Some(policy) = overrides.on_delivery_error {
            self.on_delivery_error = policy;
        }
        for (key, value) in overrides.provider {
            self.provider.set(&key, value);
        }
    }

    /// Whether delivery failures must reach the caller.
    pub fn surfaces_delivery_errors(&self) -> bool {
        self.debug || self.on_delivery_error == DeliveryErrorPolicy::Surface
    }
}

impl fmt::Debug for SmsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmsSettings")
            .field("debug", &self.debug)
            .field("on_delivery_error", &self.on_delivery_error)
            .field("provider", &self.provider)
            .finish()
    }
}

/// Values read from `SMS__`-prefixed environment variables.
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    #[serde(default)]
    debug: Option<bool>,
    #[serde(default)]
    on_delivery_error: Option<DeliveryErrorPolicy>,
    #[serde(default)]
    provider: BTreeMap<String, String>,
}

/// Provider section of the settings.
///
/// Only `NAME` is interpreted by the core. Every other key is validated by the
/// backend that needs it.
#[derive(Clone, Default, Deserialize)]
pub struct ProviderSettings {
    /// Backend selector.
    #[serde(rename = "NAME", alias = "name", default)]
    pub name: String,

    #[serde(rename = "API_KEY", alias = "api_key", default)]
    pub api_key: Option<String>,

    #[serde(rename = "AUTH_TOKEN", alias = "auth_token", default)]
    pub auth_token: Option<String>,

    /// Sender line used when a send call does not pass one.
    #[serde(rename = "LINE_NUMBER", alias = "line_number", default)]
    pub line_number: Option<String>,

    /// Region hint for number validation, overriding the backend default.
    #[serde(rename = "REGION", alias = "region", default)]
    pub region: Option<String>,

    /// Provider-specific keys (`VERIFY_SERVICE_SID`, `TEMPLATE_ID`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ProviderSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn auth_token(mut self, auth_token: impl Into<String>) -> Self {
        self.auth_token = Some(auth_token.into());
        self
    }

    pub fn line_number(mut self, line_number: impl Into<String>) -> Self {
        self.line_number = Some(line_number.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a provider-specific key.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Set any provider key, matching its name without regard to case.
    fn set(&mut self, key: &str, value: String) {
        let key = key.to_ascii_uppercase();
        match key.as_str() {
            "NAME" => self.name = value,
            "API_KEY" => self.api_key = Some(value),
            "AUTH_TOKEN" => self.auth_token = Some(value),
            "LINE_NUMBER" => self.line_number = Some(value),
            "REGION" => self.region = Some(value),
            _ => {
                self.extra.retain(|existing, _| !existing.eq_ignore_ascii_case(&key));
                self.extra.insert(key, value);
            }
        }
    }

    /// Look up a provider-specific key, accepting upper- or lower-case spelling.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.extra
            .get(key)
            .or_else(|| self.extra.get(&key.to_ascii_lowercase()))
            .or_else(|| self.extra.get(&key.to_ascii_uppercase()))
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// `API_KEY`, or a configuration error naming `backend`.
    pub fn require_api_key(&self, backend: &str) -> Result<&str> {
        non_blank(self.api_key.as_deref())
            .ok_or_else(|| SmsError::configuration(format!("{backend} requires provider.API_KEY")))
    }

    /// `AUTH_TOKEN`, or a configuration error naming `backend`.
    pub fn require_auth_token(&self, backend: &str) -> Result<&str> {
        non_blank(self.auth_token.as_deref()).ok_or_else(|| {
            SmsError::configuration(format!("{backend} requires provider.AUTH_TOKEN"))
        })
    }

    /// The configured region, or `default` when none is set.
    pub fn region_or<'a>(&'a self, default: &'a str) -> &'a str {
        non_blank(self.region.as_deref()).unwrap_or(default)
    }

    /// The configured sender line, if any.
    pub fn default_line_number(&self) -> Option<&str> {
        non_blank(self.line_number.as_deref())
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("name", &self.name)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("line_number", &self.line_number)
            .field("region", &self.region)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
