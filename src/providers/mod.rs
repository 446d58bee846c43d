//! SMS backend implementations.

pub mod console;
pub mod registry;
pub(crate) mod traits;

#[cfg(feature = "sms-ir")]
pub mod sms_ir;
#[cfg(feature = "twilio")]
pub mod twilio;

pub use registry::{
    BackendConstructor, BackendRegistry, DEFAULT_BACKEND_PATH, ResolvedBackend, global_registry,
    register_backend, unregister_backend,
};
pub use traits::SmsBackend;

/// Register the bundled backends under `path`.
///
/// Backends compiled out by their cargo feature are registered as
/// unavailable, so selecting them reports the missing feature instead of an
/// unknown name. Names already taken under `path` are left alone.
pub(crate) fn register_builtin(registry: &mut BackendRegistry, path: &str) {
    keep_existing(registry.register(
        path,
        console::BACKEND_NAME,
        console::ConsoleBackend::construct,
    ));

    #[cfg(feature = "twilio")]
    keep_existing(registry.register(
        path,
        twilio::BACKEND_NAME,
        twilio::TwilioBackend::<twilio::TwilioClient>::construct,
    ));
    #[cfg(not(feature = "twilio"))]
    keep_existing(registry.register_unavailable(path, "twilio", "the `twilio` feature"));

    #[cfg(feature = "sms-ir")]
    {
        let constructor: BackendConstructor =
            std::sync::Arc::new(sms_ir::SmsIrBackend::<sms_ir::SmsIrClient>::construct);
        keep_existing(registry.register_shared(path, sms_ir::BACKEND_NAME, constructor.clone()));
        keep_existing(registry.register_shared(path, sms_ir::BACKEND_ALIAS, constructor));
    }
    #[cfg(not(feature = "sms-ir"))]
    for name in ["smsir", "sms_ir"] {
        keep_existing(registry.register_unavailable(path, name, "the `sms-ir` feature"));
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn keep_existing(result: crate::errors::Result<()>) {
    if let Err(error) = result {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %error, "Skipped bundled SMS backend");
    }
}
