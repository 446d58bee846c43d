//! Backend resolution.

use crate::errors::{Result, SmsError};
use crate::providers::registry::{
    BackendRegistry, DEFAULT_BACKEND_PATH, ResolvedBackend, global_registry,
};
use crate::providers::traits::SmsBackend;
use crate::settings::SmsSettings;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Resolves the configured provider name to a registered backend.
///
/// The factory never mutates the settings it is given. Without an explicit
/// registry it looks names up in the process-wide one, so adapters registered
/// at startup with [`register_backend`](crate::providers::register_backend)
/// are found too.
///
/// # Example
///
/// ```rust
/// use sms_dispatch::{SmsBackend, SmsBackendFactory, SmsSettings, DEFAULT_BACKEND_PATH};
///
/// let settings = SmsSettings::for_provider("Console");
/// let factory = SmsBackendFactory::new(settings, DEFAULT_BACKEND_PATH);
///
/// let resolved = factory.get_backend().unwrap();
/// assert_eq!(resolved.name().as_str(), "console");
///
/// let backend = factory.create_backend().unwrap();
/// assert_eq!(backend.name(), "console");
/// ```
#[derive(Debug, Clone)]
pub struct SmsBackendFactory {
    settings: SmsSettings,
    base_backend_path: String,
    registry: Option<BackendRegistry>,
}

impl SmsBackendFactory {
    /// Create a factory resolving names under `base_backend_path`.
    pub fn new(settings: SmsSettings, base_backend_path: impl Into<String>) -> Self {
        Self {
            settings,
            base_backend_path: base_backend_path.into(),
            registry: None,
        }
    }

    /// Create a factory for the bundled backends.
    pub fn with_default_path(settings: SmsSettings) -> Self {
        Self::new(settings, DEFAULT_BACKEND_PATH)
    }

    /// Resolve against `registry` instead of the process-wide registry.
    pub fn with_registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Settings the factory resolves and builds with.
    pub fn settings(&self) -> &SmsSettings {
        &self.settings
    }

    /// Base lookup path.
    pub fn base_backend_path(&self) -> &str {
        &self.base_backend_path
    }

    /// Locate the backend named by `provider.NAME` without building it.
    ///
    /// # Errors
    ///
    /// - [`SmsError::Configuration`] when `provider.NAME` is missing or blank
    /// - [`SmsError::BackendNotFound`] when no backend is registered under
    ///   that name and the factory's base path
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "SmsBackendFactory::get_backend",
            skip_all,
            fields(provider = %self.settings.provider.name, path = %self.base_backend_path)
        )
    )]
    pub fn get_backend(&self) -> Result<ResolvedBackend> {
        let name = self.settings.provider.name.trim();
        if name.is_empty() {
            return Err(SmsError::configuration("provider.NAME is missing"));
        }

        let resolved = match &self.registry {
            Some(registry) => registry.resolve(&self.base_backend_path, name),
            None => global_registry().resolve(&self.base_backend_path, name),
        };

        match resolved {
            Ok(backend) => {
                #[cfg(feature = "tracing")]
                debug!(backend = %backend.name(), "Resolved SMS backend");
                Ok(backend)
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                warn!(error = %e, "Failed to resolve SMS backend");
                Err(e)
            }
        }
    }

    /// Resolve and build the configured backend in one step.
    ///
    /// Fails with [`SmsError::DependencyMissing`] when the backend's vendor
    /// integration is not part of this build.
    pub fn create_backend(&self) -> Result<Box<dyn SmsBackend>> {
        self.get_backend()?.instantiate(&self.settings)
    }
}
