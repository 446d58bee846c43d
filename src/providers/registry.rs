//! Backend registry.
//!
//! Maps `(base path, canonical name)` to a constructor. Adapter modules
//! register themselves at startup; the resolver only ever looks names up, so
//! new backends can be added without touching the core.

use super::traits::SmsBackend;
use crate::errors::{Result, SmsError};
use crate::settings::SmsSettings;
use crate::types::BackendName;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "tracing")]
use tracing::debug;

/// Base path under which the bundled backends are registered.
pub const DEFAULT_BACKEND_PATH: &str = "sms_dispatch.providers";

/// Constructor stored in the registry.
///
/// Builds a backend from settings. Constructors fail fast: a backend whose
/// vendor integration is missing returns [`SmsError::DependencyMissing`] here,
/// never at send time.
pub type BackendConstructor =
    Arc<dyn Fn(&SmsSettings) -> Result<Box<dyn SmsBackend>> + Send + Sync>;

/// A backend that has been located but not built yet.
#[derive(Clone)]
pub struct ResolvedBackend {
    name: BackendName,
    path: String,
    constructor: BackendConstructor,
}

impl ResolvedBackend {
    /// Canonical name the backend is registered under.
    pub fn name(&self) -> &BackendName {
        &self.name
    }

    /// Base path the backend was found under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Build the backend from `settings`.
    pub fn instantiate(&self, settings: &SmsSettings) -> Result<Box<dyn SmsBackend>> {
        (self.constructor)(settings)
    }
}

impl fmt::Debug for ResolvedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedBackend")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Explicit registry of backend constructors.
///
/// Names are canonicalized with [`BackendName`], so lookups are
/// case-insensitive. A `(path, name)` pair can be registered only once; the
/// first registrant wins and later attempts fail with
/// [`SmsError::BackendExists`]. Resolution therefore never sees more than one
/// candidate.
///
/// # Example
///
/// ```rust
/// use sms_dispatch::{BackendRegistry, DEFAULT_BACKEND_PATH};
///
/// let registry = BackendRegistry::with_builtin();
/// let backend = registry.resolve(DEFAULT_BACKEND_PATH, "Console").unwrap();
/// assert_eq!(backend.name().as_str(), "console");
/// ```
#[derive(Clone, Default)]
pub struct BackendRegistry {
    entries: BTreeMap<String, BTreeMap<BackendName, BackendConstructor>>,
}

impl BackendRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every bundled backend under
    /// [`DEFAULT_BACKEND_PATH`].
    ///
    /// Backends whose cargo feature is disabled are still registered, with a
    /// constructor that fails with [`SmsError::DependencyMissing`].
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        super::register_builtin(&mut registry, DEFAULT_BACKEND_PATH);
        registry
    }

    /// Register `constructor` as `name` under `path`.
    pub fn register<F>(&mut self, path: &str, name: &str, constructor: F) -> Result<()>
    where
        F: Fn(&SmsSettings) -> Result<Box<dyn SmsBackend>> + Send + Sync + 'static,
    {
        self.register_shared(path, name, Arc::new(constructor))
    }

    /// Register an already shared constructor, e.g. to add an alias.
    pub fn register_shared(
        &mut self,
        path: &str,
        name: &str,
        constructor: BackendConstructor,
    ) -> Result<()> {
        let path = normalize_path(path);
        let name = BackendName::new(name);
        if name.is_empty() {
            return Err(SmsError::configuration("backend name must not be empty"));
        }

        let backends = self.entries.entry(path.clone()).or_default();
        if backends.contains_key(&name) {
            return Err(SmsError::BackendExists {
                name: name.to_string(),
                path,
            });
        }

        #[cfg(feature = "tracing")]
        debug!(backend = %name, path = %path, "Registered SMS backend");

        backends.insert(name, constructor);
        Ok(())
    }

    /// Register a name whose vendor integration is not part of this build.
    ///
    /// Resolution succeeds, construction fails with
    /// [`SmsError::DependencyMissing`].
    pub fn register_unavailable(&mut self, path: &str, name: &str, dependency: &str) -> Result<()> {
        let backend = BackendName::new(name).to_string();
        let dependency = dependency.to_string();
        self.register(path, name, move |_| {
            Err(SmsError::dependency_missing(&backend, &dependency))
        })
    }

    /// Remove a backend. Returns true if it was registered.
    pub fn unregister(&mut self, path: &str, name: &str) -> bool {
        let path = normalize_path(path);
        let name = BackendName::new(name);
        self.entries
            .get_mut(&path)
            .is_some_and(|backends| backends.remove(&name).is_some())
    }

    /// Locate the backend registered as `name` under `path`.
    pub fn resolve(&self, path: &str, name: &str) -> Result<ResolvedBackend> {
        let path = normalize_path(path);
        let canonical = BackendName::new(name);

        let constructor = self
            .entries
            .get(&path)
            .and_then(|backends| backends.get(&canonical))
            .ok_or_else(|| SmsError::BackendNotFound {
                name: name.trim().to_string(),
                path: path.clone(),
            })?;

        Ok(ResolvedBackend {
            name: canonical,
            path,
            constructor: Arc::clone(constructor),
        })
    }

    /// Whether `name` is registered under `path`.
    pub fn contains(&self, path: &str, name: &str) -> bool {
        self.resolve(path, name).is_ok()
    }

    /// Canonical names registered under `path`, sorted.
    pub fn names(&self, path: &str) -> Vec<BackendName> {
        self.entries
            .get(&normalize_path(path))
            .map(|backends| backends.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (path, backends) in &self.entries {
            map.entry(path, &backends.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}

fn normalize_path(path: &str) -> String {
    path.trim().to_string()
}

// =============================================================================
// Process-wide registry
// =============================================================================

static GLOBAL_REGISTRY: Lazy<RwLock<BackendRegistry>> =
    Lazy::new(|| RwLock::new(BackendRegistry::with_builtin()));

/// Read access to the process-wide registry.
///
/// It starts out with the bundled backends. A poisoned lock is recovered,
/// since registry writes cannot leave it half-updated.
pub fn global_registry() -> RwLockReadGuard<'static, BackendRegistry> {
    GLOBAL_REGISTRY.read().unwrap_or_else(PoisonError::into_inner)
}

fn global_registry_mut() -> RwLockWriteGuard<'static, BackendRegistry> {
    GLOBAL_REGISTRY.write().unwrap_or_else(PoisonError::into_inner)
}

/// Register a backend in the process-wide registry.
///
/// Call this at startup from the crate providing the adapter.
pub fn register_backend<F>(path: &str, name: &str, constructor: F) -> Result<()>
where
    F: Fn(&SmsSettings) -> Result<Box<dyn SmsBackend>> + Send + Sync + 'static,
{
    global_registry_mut().register(path, name, constructor)
}

/// Remove a backend from the process-wide registry.
pub fn unregister_backend(path: &str, name: &str) -> bool {
    global_registry_mut().unregister(path, name)
}
