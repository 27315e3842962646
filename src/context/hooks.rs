use super::ApplicationContext;
use crate::config::Environment;
use crate::error::Result;
use crate::registry::Registry;
use strum_macros::{Display, EnumIter};

/// The steps of [`ApplicationContext::refresh`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter)]
pub enum RefreshPhase {
    PrepareRefresh,
    ObtainRegistry,
    PrepareRegistry,
    PostProcessRegistry,
    InvokeRegistryPostProcessors,
    RegisterInstancePostProcessors,
    InitMessageSource,
    InitEventDispatcher,
    OnRefresh,
    RegisterListeners,
    FinishRegistryInitialization,
    FinishRefresh,
}

impl RefreshPhase {
    /// 1-based position in the refresh sequence
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    /// Whether a failure in this phase destroys already created singletons
    pub fn rolls_back(self) -> bool {
        self >= RefreshPhase::PostProcessRegistry
    }
}

/// Extension points of the refresh and close sequences.
///
/// Every method has a no-op default. Errors returned from refresh hooks abort
/// the refresh like any other startup failure.
///
/// # Example
///
/// ```rust,ignore
/// struct WebServerHooks {
///     server: Arc<EmbeddedServer>,
/// }
///
/// impl RefreshHooks for WebServerHooks {
///     fn on_refresh(&self, context: &ApplicationContext) -> Result<()> {
///         self.server.bind(context.environment().get_or("server.port", "8080"))?;
///         Ok(())
///     }
///
///     fn on_close(&self, _context: &ApplicationContext) -> Result<()> {
///         self.server.shutdown();
///         Ok(())
///     }
/// }
/// ```
pub trait RefreshHooks: Send + Sync {
    /// Called right before each phase starts
    fn before_phase(&self, context: &ApplicationContext, phase: RefreshPhase) {
        let _ = (context, phase);
    }

    /// Replace or add property sources before required properties are validated
    fn init_property_sources(&self, environment: &Environment) -> Result<()> {
        let _ = environment;
        Ok(())
    }

    /// Modify the registry after its standard preparation
    fn post_process_registry(&self, context: &ApplicationContext, registry: &dyn Registry) -> Result<()> {
        let _ = (context, registry);
        Ok(())
    }

    /// Start additional subsystems once messages and events are available
    fn on_refresh(&self, context: &ApplicationContext) -> Result<()> {
        let _ = context;
        Ok(())
    }

    /// Drop transient resource caches at the end of a refresh
    fn clear_resource_caches(&self) {}

    /// Release subsystems started in [`RefreshHooks::on_refresh`]
    fn on_close(&self, context: &ApplicationContext) -> Result<()> {
        let _ = context;
        Ok(())
    }
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl RefreshHooks for NoopHooks {}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_phase_order() {
        let phases: Vec<RefreshPhase> = RefreshPhase::iter().collect();
        assert_eq!(phases.len(), 12);
        assert_eq!(phases[0], RefreshPhase::PrepareRefresh);
        assert_eq!(phases[11], RefreshPhase::FinishRefresh);
        assert!(phases.windows(2).all(|w| w[0].ordinal() + 1 == w[1].ordinal()));
    }

    #[test]
    fn test_rollback_boundary() {
        assert!(!RefreshPhase::PrepareRegistry.rolls_back());
        assert!(RefreshPhase::PostProcessRegistry.rolls_back());
        assert!(RefreshPhase::FinishRefresh.rolls_back());
        assert_eq!(RefreshPhase::OnRefresh.to_string(), "OnRefresh");
    }
}
