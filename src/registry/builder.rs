use super::{Component, ComponentDefinition, MemoryRegistry, Registry};

/// Builder for a [`MemoryRegistry`]
///
/// Collects definitions and instances before the registry is handed to a
/// context. A later registration under the same name overrides the earlier one.
///
/// # Example
/// ```rust,ignore
/// let registry = RegistryBuilder::new()
///     .instance("clock", Component::new(SystemClock))
///     .singleton("scheduler", |registry| {
///         let clock = registry.get_instance::<SystemClock>("clock")?;
///         Ok(Component::new(Scheduler::new(clock)))
///     })
///     .build();
/// ```
pub struct RegistryBuilder {
    definitions: Vec<(String, ComponentDefinition)>,
    instances: Vec<(String, Component)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            definitions: Vec::new(),
            instances: Vec::new(),
        }
    }

    /// Register an eager singleton created by `factory`
    pub fn singleton<F>(self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&dyn Registry) -> anyhow::Result<Component> + Send + Sync + 'static,
    {
        self.definition(name, ComponentDefinition::singleton(factory))
    }

    pub fn definition(mut self, name: impl Into<String>, definition: ComponentDefinition) -> Self {
        let name = name.into();
        self.definitions.retain(|(n, _)| *n != name);
        self.definitions.push((name, definition));
        self
    }

    /// Register an already created instance
    pub fn instance(mut self, name: impl Into<String>, component: Component) -> Self {
        let name = name.into();
        self.instances.retain(|(n, _)| *n != name);
        self.instances.push((name, component));
        self
    }

    /// Build the registry
    pub fn build(self) -> MemoryRegistry {
        let registry = MemoryRegistry::new();
        for (name, definition) in self.definitions {
            // A fresh registry is neither frozen nor closed
            let _ = registry.register_definition(&name, definition);
        }
        for (name, component) in self.instances {
            let _ = registry.register_singleton(&name, component);
        }
        registry
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
