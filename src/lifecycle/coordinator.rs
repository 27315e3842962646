//! Lifecycle Coordinator
//!
//! Starts and stops the [`Lifecycle`] components of a registry.

use super::Lifecycle;
use crate::error::{ContextError, Result};
use crate::registry::{ComponentKind, Registry};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Drives lifecycle callbacks on behalf of a context.
///
/// A component registered under `lifecycle_coordinator` replaces the default.
pub trait LifecycleCoordinator: Send + Sync {
    /// Called at the end of a successful refresh
    fn on_refresh(&self) -> Result<()>;

    /// Called while the context closes
    fn on_close(&self) -> Result<()>;

    fn start(&self) -> Result<()>;

    fn stop(&self) -> Result<()>;

    fn is_running(&self) -> bool;
}

/// Default [`LifecycleCoordinator`]
///
/// The coordinator is responsible for:
/// - Starting components in ascending [`Lifecycle::phase`] order
/// - Stopping them in descending phase order, latest registered first
/// - Failing fast on start, logging and continuing on stop
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = DefaultLifecycleCoordinator::new(Arc::clone(&registry));
///
/// coordinator.on_refresh()?;
/// // ... application runs ...
/// coordinator.on_close()?;
/// ```
pub struct DefaultLifecycleCoordinator {
    registry: Arc<dyn Registry>,
    running: AtomicBool,
}

impl DefaultLifecycleCoordinator {
    pub fn new(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry,
            running: AtomicBool::new(false),
        }
    }

    /// Lifecycle components sorted by ascending phase, registration order
    /// within a phase
    fn lifecycle_components(&self) -> Result<Vec<(String, Arc<dyn Lifecycle>)>> {
        let mut components = Vec::new();
        for name in self.registry.find_by_kind(ComponentKind::Lifecycle, false, false) {
            if let Some(lifecycle) = self.registry.find_by_name(&name)?.and_then(|c| c.lifecycle()) {
                components.push((name, lifecycle));
            }
        }
        components.sort_by_key(|(_, lifecycle)| lifecycle.phase());
        Ok(components)
    }

    fn start_components(&self, auto_startup_only: bool) -> Result<()> {
        let components = self.lifecycle_components()?;
        tracing::info!("Starting lifecycle components...");

        let mut started = 0;
        for (name, lifecycle) in &components {
            if auto_startup_only && !lifecycle.is_auto_startup() {
                continue;
            }
            if lifecycle.is_running() {
                continue;
            }
            tracing::debug!("Starting: {} (phase {})", name, lifecycle.phase());
            lifecycle.start().map_err(|e| {
                tracing::error!("Start failed for {}: {}", name, e);
                ContextError::lifecycle_failed(name.as_str(), e.to_string())
            })?;
            started += 1;
        }

        self.running.store(true, Ordering::SeqCst);
        tracing::info!("Lifecycle start complete ({} components started)", started);
        Ok(())
    }

    fn stop_components(&self) -> Result<()> {
        let components = self.lifecycle_components()?;
        tracing::info!("Stopping lifecycle components...");

        // Execute in reverse order
        for (name, lifecycle) in components.iter().rev() {
            if !lifecycle.is_running() {
                continue;
            }
            tracing::debug!("Stopping: {} (phase {})", name, lifecycle.phase());
            if let Err(e) = lifecycle.stop() {
                // Log error but continue with other components
                tracing::error!("Stop failed for {}: {}", name, e);
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Lifecycle stop complete");
        Ok(())
    }
}

impl LifecycleCoordinator for DefaultLifecycleCoordinator {
    fn on_refresh(&self) -> Result<()> {
        self.start_components(true)
    }

    fn on_close(&self) -> Result<()> {
        self.stop_components()
    }

    fn start(&self) -> Result<()> {
        self.start_components(false)
    }

    fn stop(&self) -> Result<()> {
        self.stop_components()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Component, ComponentDefinition, MemoryRegistry};
    use parking_lot::Mutex;

    struct Service {
        name: &'static str,
        phase: i32,
        auto: bool,
        fail_start: bool,
        running: AtomicBool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Lifecycle for Service {
        fn start(&self) -> anyhow::Result<()> {
            if self.fail_start {
                anyhow::bail!("port in use");
            }
            self.log.lock().push(format!("start:{}", self.name));
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) -> anyhow::Result<()> {
            self.log.lock().push(format!("stop:{}", self.name));
            self.running.store(false, Ordering::SeqCst);
            if self.name == "flaky" {
                anyhow::bail!("did not stop cleanly");
            }
            Ok(())
        }

        fn is_running(&self) -> bool {
            self.running.load(Ordering::SeqCst)
        }

        fn phase(&self) -> i32 {
            self.phase
        }

        fn is_auto_startup(&self) -> bool {
            self.auto
        }
    }

    fn register(
        registry: &MemoryRegistry,
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
        phase: i32,
        auto: bool,
        fail_start: bool,
    ) {
        let log = Arc::clone(log);
        registry
            .register_definition(
                name,
                ComponentDefinition::singleton(move |_| {
                    let service = Arc::new(Service {
                        name,
                        phase,
                        auto,
                        fail_start,
                        running: AtomicBool::new(false),
                        log: Arc::clone(&log),
                    });
                    Ok(Component::from_arc(Arc::clone(&service)).with_lifecycle(service))
                })
                .provides(ComponentKind::Lifecycle),
            )
            .unwrap();
    }

    #[test]
    fn test_start_by_phase_stop_in_reverse() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = MemoryRegistry::new();
        register(&registry, &log, "web", 10, true, false);
        register(&registry, &log, "db", -10, true, false);
        register(&registry, &log, "cache", 0, true, false);
        register(&registry, &log, "metrics", 0, true, false);

        let coordinator = DefaultLifecycleCoordinator::new(Arc::new(registry));
        coordinator.on_refresh().unwrap();
        assert!(coordinator.is_running());
        coordinator.on_close().unwrap();
        assert!(!coordinator.is_running());

        assert_eq!(
            *log.lock(),
            vec![
                "start:db", "start:cache", "start:metrics", "start:web",
                "stop:web", "stop:metrics", "stop:cache", "stop:db",
            ]
        );
    }

    #[test]
    fn test_manual_components_start_only_explicitly() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = MemoryRegistry::new();
        register(&registry, &log, "auto", 0, true, false);
        register(&registry, &log, "manual", 0, false, false);

        let coordinator = DefaultLifecycleCoordinator::new(Arc::new(registry));
        coordinator.on_refresh().unwrap();
        assert_eq!(*log.lock(), vec!["start:auto"]);

        coordinator.start().unwrap();
        assert_eq!(*log.lock(), vec!["start:auto", "start:manual"]);
    }

    #[test]
    fn test_start_failure_propagates() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = MemoryRegistry::new();
        register(&registry, &log, "broken", 0, true, true);

        let coordinator = DefaultLifecycleCoordinator::new(Arc::new(registry));
        let err = coordinator.on_refresh().unwrap_err();
        assert!(matches!(err, ContextError::LifecycleFailed { ref component, .. } if component == "broken"));
        assert!(!coordinator.is_running());
    }

    #[test]
    fn test_stop_continues_past_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = MemoryRegistry::new();
        register(&registry, &log, "first", 0, true, false);
        register(&registry, &log, "flaky", 0, true, false);

        let coordinator = DefaultLifecycleCoordinator::new(Arc::new(registry));
        coordinator.start().unwrap();
        coordinator.stop().unwrap();
        assert_eq!(
            *log.lock(),
            vec!["start:first", "start:flaky", "stop:flaky", "stop:first"]
        );
    }
}
