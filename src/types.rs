//! Core value types for SMS dispatch.

use serde::Serialize;
use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};

// =============================================================================
// ValidatedPhoneNumber
// =============================================================================

/// A phone number that passed numbering-plan validation.
///
/// Holds the canonical E.164 form (e.g. `+12025550173`) together with the
/// region it was validated for. Values are produced fresh by
/// [`PhoneNumberValidator`](crate::validator::PhoneNumberValidator) on every
/// send and are never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ValidatedPhoneNumber {
    e164: String,
    region: String,
}

impl ValidatedPhoneNumber {
    pub(crate) fn new(e164: String, region: String) -> Self {
        Self { e164, region }
    }

    /// The E.164 representation.
    pub fn as_str(&self) -> &str {
        &self.e164
    }

    /// Two-letter region code the number was validated for.
    pub fn region(&self) -> &str {
        &self.region
    }

    /// E.164 digits without the leading `+`.
    pub fn digits(&self) -> &str {
        self.e164.trim_start_matches('+')
    }

    /// Consume the value and return the E.164 string.
    pub fn into_e164(self) -> String {
        self.e164
    }

    /// Form safe for logs: everything but the last four digits is masked.
    pub fn redacted(&self) -> String {
        redact_phone_number(&self.e164)
    }
}

impl Display for ValidatedPhoneNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.e164)
    }
}

impl AsRef<str> for ValidatedPhoneNumber {
    fn as_ref(&self) -> &str {
        &self.e164
    }
}

/// Mask all but the last four characters of a phone number.
pub fn redact_phone_number(number: &str) -> String {
    let chars: Vec<char> = number.chars().collect();
    let keep = chars.len().min(4);
    let masked = chars.len() - keep;
    let mut out = String::with_capacity(chars.len());
    out.extend(std::iter::repeat_n('*', masked));
    out.extend(&chars[masked..]);
    out
}

// =============================================================================
// BackendName
// =============================================================================

/// Canonical name of a backend.
///
/// Names are trimmed, lower-cased and `-` is mapped to `_`, so `"Twilio"`,
/// `" twilio "` and `"TWILIO"` all refer to the same backend, as do
/// `"sms-ir"` and `"sms_ir"`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BackendName(String);

impl BackendName {
    /// Canonicalize a raw provider name.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let canonical = raw
            .as_ref()
            .trim()
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        Self(canonical)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for BackendName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BackendName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for BackendName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BackendName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for BackendName {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
