//! Registry and instance post-processing

use super::{Component, ComponentKind, Registry};
use crate::error::{ContextError, Result};
use std::sync::Arc;

/// Works on the registry itself before any regular component is created,
/// e.g. to register additional definitions.
pub trait RegistryPostProcessor: Send + Sync {
    fn post_process_registry(&self, registry: &dyn Registry) -> anyhow::Result<()>;

    /// Lower values run first
    fn order(&self) -> i32 {
        0
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Sees every component the registry creates, right after its factory ran.
pub trait InstancePostProcessor: Send + Sync {
    fn before_initialization(&self, name: &str, component: Component) -> anyhow::Result<Component> {
        let _ = name;
        Ok(component)
    }

    fn after_initialization(&self, name: &str, component: Component) -> anyhow::Result<Component> {
        let _ = name;
        Ok(component)
    }

    /// Lower values are registered first
    fn order(&self) -> i32 {
        0
    }
}

/// Run the context's own registry post-processors in registration order,
/// then the ones declared in the registry sorted by [`RegistryPostProcessor::order`].
///
/// Declared processors may register further processors; discovery repeats
/// until a pass finds no new ones.
pub(crate) fn invoke_registry_post_processors(
    registry: &dyn Registry,
    context_processors: &[Arc<dyn RegistryPostProcessor>],
) -> Result<()> {
    for processor in context_processors {
        invoke(registry, processor.as_ref())?;
    }

    let mut invoked: Vec<String> = Vec::new();
    loop {
        let mut batch = Vec::new();
        for name in registry.find_by_kind(ComponentKind::RegistryPostProcessor, true, false) {
            if invoked.contains(&name) {
                continue;
            }
            let processor = registry
                .find_by_name(&name)?
                .and_then(|c| c.registry_post_processor())
                .ok_or_else(|| {
                    ContextError::initialization(format!(
                        "component '{}' does not expose a registry post-processor",
                        name
                    ))
                })?;
            batch.push(processor);
            invoked.push(name);
        }
        if batch.is_empty() {
            break;
        }
        batch.sort_by_key(|p| p.order());

        for processor in &batch {
            invoke(registry, processor.as_ref())?;
        }
    }

    tracing::debug!(
        "Invoked {} registry post-processor(s)",
        context_processors.len() + invoked.len()
    );
    Ok(())
}

fn invoke(registry: &dyn Registry, processor: &dyn RegistryPostProcessor) -> Result<()> {
    tracing::debug!("Invoking registry post-processor {}", processor.name());
    processor
        .post_process_registry(registry)
        .map_err(|source| ContextError::PostProcessorFailed {
            processor: processor.name().to_string(),
            source,
        })
}

/// Create every instance post-processor declared in the registry and install
/// them sorted by [`InstancePostProcessor::order`], so they see every
/// component created afterwards.
pub(crate) fn register_instance_post_processors(registry: &dyn Registry) -> Result<()> {
    let mut processors = Vec::new();
    for name in registry.find_by_kind(ComponentKind::InstancePostProcessor, true, false) {
        let processor = registry
            .find_by_name(&name)?
            .and_then(|c| c.instance_post_processor())
            .ok_or_else(|| {
                ContextError::initialization(format!(
                    "component '{}' does not expose an instance post-processor",
                    name
                ))
            })?;
        processors.push(processor);
    }
    processors.sort_by_key(|p| p.order());

    let count = processors.len();
    for processor in processors {
        registry.add_instance_post_processor(processor);
    }
    tracing::debug!("Registered {} instance post-processor(s)", count);
    Ok(())
}
