use super::ApplicationContext;
use crate::registry::{Component, InstancePostProcessor};
use std::sync::{Arc, Weak};

/// Implemented by components that want a handle to their owning context.
///
/// The handle is weak: components live inside the context's registry and
/// must not keep the context alive.
pub trait ContextAware: Send + Sync {
    fn set_application_context(&self, context: Weak<ApplicationContext>);
}

/// Hands the context to every [`ContextAware`] component the registry creates.
///
/// Installed by the context itself while preparing the registry.
pub(crate) struct ContextAwareProcessor {
    context: Weak<ApplicationContext>,
}

impl ContextAwareProcessor {
    pub(crate) fn new(context: Weak<ApplicationContext>) -> Arc<Self> {
        Arc::new(Self { context })
    }
}

impl InstancePostProcessor for ContextAwareProcessor {
    fn before_initialization(&self, name: &str, component: Component) -> anyhow::Result<Component> {
        if let Some(aware) = component.context_aware() {
            tracing::trace!("Injecting application context into '{}'", name);
            aware.set_application_context(Weak::clone(&self.context));
        }
        Ok(component)
    }

    fn order(&self) -> i32 {
        i32::MIN
    }
}
