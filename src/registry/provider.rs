//! Registry provisioning strategies

use super::{MemoryRegistry, Registry};
use crate::error::{ContextError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Hands a context the registry to use for one refresh.
pub trait RegistryProvider: Send + Sync {
    /// `previous` is the registry of the last refresh attempt, if any.
    fn provision_registry(&self, previous: Option<Arc<dyn Registry>>) -> Result<Arc<dyn Registry>>;

    /// Whether a second refresh can obtain a new registry
    fn supports_refresh(&self) -> bool {
        false
    }
}

/// Serves one pre-built registry, exactly once.
pub struct SingleRegistryProvider {
    registry: Arc<dyn Registry>,
    provisioned: AtomicBool,
}

impl SingleRegistryProvider {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            provisioned: AtomicBool::new(false),
        }
    }
}

impl From<MemoryRegistry> for SingleRegistryProvider {
    fn from(registry: MemoryRegistry) -> Self {
        Self::new(Arc::new(registry))
    }
}

impl RegistryProvider for SingleRegistryProvider {
    fn provision_registry(&self, _previous: Option<Arc<dyn Registry>>) -> Result<Arc<dyn Registry>> {
        if self.provisioned.swap(true, Ordering::SeqCst) {
            return Err(ContextError::illegal_state(
                "Registry provider does not support multiple refresh attempts: just call 'refresh' once",
            ));
        }
        Ok(Arc::clone(&self.registry))
    }
}

type RegistryLoader = Arc<dyn Fn() -> anyhow::Result<MemoryRegistry> + Send + Sync>;

/// Builds a fresh registry from a loader on every refresh.
///
/// The previous registry is destroyed and closed only once the new one has
/// been loaded, so a failing loader leaves the old registry untouched.
pub struct RefreshableRegistryProvider {
    loader: RegistryLoader,
    refreshes: Mutex<u32>,
}

impl RefreshableRegistryProvider {
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<MemoryRegistry> + Send + Sync + 'static,
    {
        Self {
            loader: Arc::new(loader),
            refreshes: Mutex::new(0),
        }
    }

    /// Number of registries built so far
    pub fn refresh_count(&self) -> u32 {
        *self.refreshes.lock()
    }
}

impl RegistryProvider for RefreshableRegistryProvider {
    fn provision_registry(&self, previous: Option<Arc<dyn Registry>>) -> Result<Arc<dyn Registry>> {
        let registry = (self.loader)().map_err(|e| {
            ContextError::initialization(format!("I/O error loading component definitions: {}", e))
        })?;

        if let Some(previous) = previous {
            tracing::debug!("Closing previous registry before switching to the new one");
            previous.destroy_singletons();
            previous.close();
        }

        *self.refreshes.lock() += 1;
        Ok(Arc::new(registry))
    }

    fn supports_refresh(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Component;

    #[test]
    fn test_single_provider_refuses_second_refresh() {
        let provider = SingleRegistryProvider::from(MemoryRegistry::new());
        let first = provider.provision_registry(None).unwrap();

        let err = provider.provision_registry(Some(first)).err().unwrap();
        assert!(err.is_illegal_state());
        assert!(err.to_string().contains("just call 'refresh' once"));
    }

    #[test]
    fn test_refreshable_provider_closes_previous() {
        let provider = RefreshableRegistryProvider::new(|| {
            Ok(MemoryRegistry::builder()
                .instance("marker", Component::new(()))
                .build())
        });

        let first = provider.provision_registry(None).unwrap();
        let second = provider.provision_registry(Some(Arc::clone(&first))).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(first.find_by_name("marker").unwrap().is_none());
        assert!(second.find_by_name("marker").unwrap().is_some());
        assert_eq!(provider.refresh_count(), 2);
    }

    #[test]
    fn test_failed_load_keeps_previous() {
        let fail = Arc::new(AtomicBool::new(false));
        let switch = Arc::clone(&fail);
        let provider = RefreshableRegistryProvider::new(move || {
            if switch.load(Ordering::SeqCst) {
                anyhow::bail!("definitions file missing");
            }
            Ok(MemoryRegistry::builder()
                .instance("marker", Component::new(()))
                .build())
        });

        let first = provider.provision_registry(None).unwrap();
        fail.store(true, Ordering::SeqCst);
        let err = provider.provision_registry(Some(Arc::clone(&first))).err().unwrap();

        assert!(err.is_initialization());
        assert!(first.find_by_name("marker").unwrap().is_some());
    }
}
