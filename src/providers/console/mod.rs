//! Console backend.
//!
//! Writes messages to a writer (stdout by default) instead of calling a
//! vendor. Useful in development and tests; it validates numbers exactly like
//! the real backends do.

use crate::errors::{Operation, Result, SmsError};
use crate::providers::traits::SmsBackend;
use crate::settings::SmsSettings;
use crate::validator::PhoneNumberValidator;
use async_trait::async_trait;
use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(feature = "tracing")]
use tracing::info;

/// Name the console backend is registered under.
pub const BACKEND_NAME: &str = "console";

/// Region used for validation when the settings do not name one.
pub const DEFAULT_REGION: &str = "US";

const SEPARATOR_WIDTH: usize = 79;

/// Backend that prints messages instead of sending them.
pub struct ConsoleBackend {
    writer: Mutex<Box<dyn Write + Send>>,
    validator: PhoneNumberValidator,
    region: String,
    line_number: Option<String>,
}

impl fmt::Debug for ConsoleBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleBackend")
            .field("region", &self.region)
            .field("line_number", &self.line_number)
            .finish_non_exhaustive()
    }
}

impl ConsoleBackend {
    /// Console backend writing to stdout.
    pub fn from_settings(settings: &SmsSettings) -> Result<Self> {
        Ok(Self::with_writer(settings, io::stdout()))
    }

    /// Console backend writing to `writer`.
    pub fn with_writer(settings: &SmsSettings, writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            validator: PhoneNumberValidator::new(),
            region: settings.provider.region_or(DEFAULT_REGION).to_string(),
            line_number: settings.provider.default_line_number().map(str::to_string),
        }
    }

    /// Registry constructor.
    pub fn construct(settings: &SmsSettings) -> Result<Box<dyn SmsBackend>> {
        Ok(Box::new(Self::from_settings(settings)?))
    }

    fn write_block(&self, block: &str) -> Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        write_separated(&mut **writer, block).map_err(|e| SmsError::delivery(BACKEND_NAME, e))
    }

    fn write_message(&self, recipient: &str, message: &str, line_number: Option<&str>) -> Result<()> {
        let line_number = line_number.or(self.line_number.as_deref()).unwrap_or("-");
        self.write_block(&format!(
            "Recipient: {recipient}\nMessage: {message}\nLine Number: {line_number}"
        ))
    }
}

fn write_separated(writer: &mut dyn Write, block: &str) -> io::Result<()> {
    writeln!(writer, "\n{block}")?;
    writeln!(writer, "{}", "-".repeat(SEPARATOR_WIDTH))?;
    writer.flush()
}

#[async_trait]
impl SmsBackend for ConsoleBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn send_one_message(
        &self,
        phone_number: &str,
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let recipient = self.validator.validate(phone_number, &self.region)?;
        self.write_message(recipient.as_str(), message, line_number)?;

        #[cfg(feature = "tracing")]
        info!(to = %recipient.redacted(), "Message written to console");

        Ok(())
    }

    async fn send_bulk_messages(
        &self,
        phone_numbers: &[String],
        message: &str,
        line_number: Option<&str>,
    ) -> Result<()> {
        let recipients = self.validator.validate_all(phone_numbers, &self.region)?;
        for recipient in &recipients {
            self.write_message(recipient.as_str(), message, line_number)?;
        }

        #[cfg(feature = "tracing")]
        info!(recipients = recipients.len(), "Bulk message written to console");

        Ok(())
    }

    async fn send_verify_message(&self, phone_number: &str, value: &str) -> Result<()> {
        let recipient = self.validator.validate(phone_number, &self.region)?;
        self.write_block(&format!(
            "Recipient: {}\nVerification Code: {value}",
            recipient.as_str()
        ))?;

        #[cfg(feature = "tracing")]
        info!(to = %recipient.redacted(), "Verification code written to console");

        Ok(())
    }

    fn supports(&self, _operation: Operation) -> bool {
        true
    }
}

/// In-memory writer whose contents can be read back, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
