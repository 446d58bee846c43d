//! Send an SMS through the backend named in a settings file.
//!
//! # Running
//!
//! ```bash
//! # Prints the message instead of sending it
//! cargo run --example send_sms -- +12025550173 "Hello from sms-dispatch"
//!
//! # Real provider, with secrets taken from the environment
//! SMS_SETTINGS=sms.toml SMS__PROVIDER__AUTH_TOKEN=... \
//!     cargo run --example send_sms -- +12025550173 "Hello"
//! ```

use sms_dispatch::{Operation, SmsBackend, SmsService, SmsSettings};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let to = args.next().ok_or("usage: send_sms <phone-number> <message>")?;
    let message = args.next().unwrap_or_else(|| "Hello from sms-dispatch".to_string());

    // Fall back to the console backend when no settings file is given
    let settings = match env::var("SMS_SETTINGS") {
        Ok(path) => SmsSettings::load(path)?,
        Err(_) => SmsSettings::for_provider("console").with_debug(true),
    };

    let service = SmsService::from_settings(&settings)?;
    println!("Using backend: {}", service.provider().name());

    service.send_one_message(&to, &message, None).await?;
    println!("Message sent to {to}");

    if service.provider().supports(Operation::SendVerify) {
        service.send_verify_message(&to, "482913").await?;
        println!("Verification code sent to {to}");
    }

    Ok(())
}
