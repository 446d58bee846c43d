//! Phone number validation and E.164 formatting.

use crate::errors::{ValidationError, ValidationReason};
use crate::types::ValidatedPhoneNumber;
use phonenumber::country;
use phonenumber::Mode;

/// Validates raw phone numbers against the international numbering plan.
///
/// Every backend runs destination numbers through this type before any
/// network call, so all vendors get the same guarantees: the number must
/// parse, and it must be valid for its region (length and prefix checks, not
/// just "looks like digits").
///
/// # Example
///
/// ```rust
/// use sms_dispatch::PhoneNumberValidator;
///
/// let validator = PhoneNumberValidator::new();
/// let e164 = validator.validate_and_format("+1 (202) 555-0173", "US").unwrap();
/// assert_eq!(e164, "+12025550173");
///
/// assert!(validator.validate_and_format("12345", "US").is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNumberValidator;

impl PhoneNumberValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate `raw` using `region` as a hint and return its E.164 form.
    ///
    /// `region` is a two-letter region code (case-insensitive). It is only
    /// consulted when `raw` carries no explicit country code.
    pub fn validate_and_format(&self, raw: &str, region: &str) -> Result<String, ValidationError> {
        self.validate(raw, region)
            .map(ValidatedPhoneNumber::into_e164)
    }

    /// Validate `raw` and return the E.164 form tagged with its region.
    pub fn validate(&self, raw: &str, region: &str) -> Result<ValidatedPhoneNumber, ValidationError> {
        let input = raw.trim();
        let hint = region.trim().to_ascii_uppercase();
        let reject = |reason| ValidationError::new(input, hint.as_str(), reason);

        if input.is_empty() {
            return Err(reject(ValidationReason::Empty));
        }

        let region_id = hint
            .parse::<country::Id>()
            .map_err(|_| reject(ValidationReason::UnknownRegion))?;

        let parsed = phonenumber::parse(Some(region_id), input)
            .map_err(|e| reject(ValidationReason::Unparseable(e.to_string())))?;

        if !phonenumber::is_valid(&parsed) {
            return Err(reject(ValidationReason::InvalidNumber));
        }

        let e164 = phonenumber::format(&parsed).mode(Mode::E164).to_string();
        let resolved_region = parsed
            .country()
            .id()
            .map(|id| format!("{id:?}"))
            .unwrap_or(hint);

        Ok(ValidatedPhoneNumber::new(e164, resolved_region))
    }

    /// Validate a whole batch, failing on the first invalid number.
    ///
    /// Nothing is returned unless every number is valid, so a batch is never
    /// dispatched partially.
    pub fn validate_all<S: AsRef<str>>(
        &self,
        raws: &[S],
        region: &str,
    ) -> Result<Vec<ValidatedPhoneNumber>, ValidationError> {
        raws.iter()
            .map(|raw| self.validate(raw.as_ref(), region))
            .collect()
    }
}
