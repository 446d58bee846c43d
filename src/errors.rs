//! Error types shared by the resolver, the validator and every backend.

use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, SmsError>;

/// Boxed vendor error kept as the source of a [`SmsError::Delivery`].
pub type VendorError = Box<dyn StdError + Send + Sync + 'static>;

/// Operations of the provider contract.
///
/// Used to report which operation a backend refused in
/// [`SmsError::NotImplemented`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SendOne,
    SendBulk,
    SendVerify,
}

impl Operation {
    /// Name of the contract method behind this operation.
    pub fn method_name(&self) -> &'static str {
        match self {
            Self::SendOne => "send_one_message",
            Self::SendBulk => "send_bulk_messages",
            Self::SendVerify => "send_verify_message",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Why a phone number was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// The input was empty or whitespace only.
    Empty,
    /// The region hint is not a known two-letter region code.
    UnknownRegion,
    /// The input could not be parsed as a phone number at all.
    Unparseable(String),
    /// The number parsed but breaks the numbering plan of its region.
    InvalidNumber,
}

impl Display for ValidationReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("phone number is empty"),
            Self::UnknownRegion => f.write_str("unknown region code"),
            Self::Unparseable(detail) => write!(f, "not a phone number ({detail})"),
            Self::InvalidNumber => f.write_str("not a valid number for its region"),
        }
    }
}

/// A phone number failed numbering-plan validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid phone number '{input}' (region {region}): {reason}")]
pub struct ValidationError {
    /// The offending input, trimmed.
    pub input: String,
    /// The region hint the input was validated against.
    pub region: String,
    /// What was wrong with it.
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(input: impl Into<String>, region: impl Into<String>, reason: ValidationReason) -> Self {
        Self {
            input: input.into(),
            region: region.into(),
            reason,
        }
    }
}

/// Coarse classification of [`SmsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DependencyMissing,
    BackendNotFound,
    BackendExists,
    Validation,
    Delivery,
    NotImplemented,
    Configuration,
}

/// Main error type of the dispatch layer.
#[derive(Debug, Error)]
pub enum SmsError {
    /// The vendor integration required by a backend is not part of this build.
    #[error("SMS backend '{backend}' is unavailable: {dependency} is not installed")]
    DependencyMissing { backend: String, dependency: String },

    /// No registered backend matches the configured provider name.
    #[error("No SMS backend named '{name}' is registered under '{path}'")]
    BackendNotFound { name: String, path: String },

    /// A backend with the same canonical name is already registered.
    #[error("An SMS backend named '{name}' is already registered under '{path}'")]
    BackendExists { name: String, path: String },

    /// Phone number validation failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The vendor rejected or failed to complete a send.
    #[error("Delivery through '{backend}' failed: {message}")]
    Delivery {
        backend: String,
        message: String,
        #[source]
        source: Option<VendorError>,
    },

    /// The backend does not support the requested operation.
    #[error("{operation} is not supported by the '{backend}' backend")]
    NotImplemented {
        backend: String,
        operation: Operation,
    },

    /// Settings are missing or malformed.
    #[error("Invalid SMS configuration: {0}")]
    Configuration(String),
}

impl SmsError {
    pub fn dependency_missing(backend: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::DependencyMissing {
            backend: backend.into(),
            dependency: dependency.into(),
        }
    }

    pub fn not_implemented(backend: impl Into<String>, operation: Operation) -> Self {
        Self::NotImplemented {
            backend: backend.into(),
            operation,
        }
    }

    /// Translate a vendor error into a delivery failure, keeping its message.
    pub fn delivery<E>(backend: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Delivery {
            backend: backend.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DependencyMissing { .. } => ErrorKind::DependencyMissing,
            Self::BackendNotFound { .. } => ErrorKind::BackendNotFound,
            Self::BackendExists { .. } => ErrorKind::BackendExists,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Delivery { .. } => ErrorKind::Delivery,
            Self::NotImplemented { .. } => ErrorKind::NotImplemented,
            Self::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// True when the caller can fix the problem by changing its input
    /// (e.g. asking the user for a corrected number).
    pub fn is_caller_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<config::ConfigError> for SmsError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
