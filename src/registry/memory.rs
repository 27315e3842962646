use super::{
    Component, ComponentDefinition, ComponentKind, InstancePostProcessor, Registry, RegistryBuilder,
    ValueResolver,
};
use crate::error::{ContextError, Result};
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Thread-safe in-memory component registry.
///
/// Singletons are created at most once, on first lookup or by
/// [`Registry::instantiate_eager_singletons`], and destroyed in reverse
/// creation order.
pub struct MemoryRegistry {
    definitions: DashMap<String, ComponentDefinition>,
    definition_order: RwLock<Vec<String>>,
    singletons: DashMap<String, Component>,
    creation_order: Mutex<Vec<String>>,
    creation_lock: ReentrantMutex<()>,
    in_creation: Mutex<Vec<String>>,
    post_processors: RwLock<Vec<Arc<dyn InstancePostProcessor>>>,
    resolvable: DashMap<String, Component>,
    ignored_markers: RwLock<HashSet<String>>,
    value_resolvers: RwLock<Vec<ValueResolver>>,
    temp_type_matching: AtomicBool,
    frozen: AtomicBool,
    closed: AtomicBool,
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
            definition_order: RwLock::new(Vec::new()),
            singletons: DashMap::new(),
            creation_order: Mutex::new(Vec::new()),
            creation_lock: ReentrantMutex::new(()),
            in_creation: Mutex::new(Vec::new()),
            post_processors: RwLock::new(Vec::new()),
            resolvable: DashMap::new(),
            ignored_markers: RwLock::new(HashSet::new()),
            value_resolvers: RwLock::new(Vec::new()),
            temp_type_matching: AtomicBool::new(false),
            frozen: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Number of singletons currently cached
    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    pub fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.contains_key(name)
    }

    pub fn is_ignored_marker(&self, marker: &str) -> bool {
        self.ignored_markers.read().contains(marker)
    }

    pub fn is_temp_type_matching(&self) -> bool {
        self.temp_type_matching.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn instance_post_processor_orders(&self) -> Vec<i32> {
        self.post_processors.read().iter().map(|p| p.order()).collect()
    }

    fn assert_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ContextError::illegal_state("Registry has been closed already"));
        }
        Ok(())
    }

    fn singleton(&self, name: &str) -> Option<Component> {
        self.singletons.get(name).map(|c| c.value().clone())
    }

    fn definition(&self, name: &str) -> Option<ComponentDefinition> {
        self.definitions.get(name).map(|d| d.value().clone())
    }

    fn get_or_create_singleton(&self, name: &str, definition: &ComponentDefinition) -> Result<Component> {
        let _guard = self.creation_lock.lock();
        if let Some(existing) = self.singleton(name) {
            return Ok(existing);
        }

        {
            let mut creating = self.in_creation.lock();
            if creating.iter().any(|n| n == name) {
                let mut cycle = creating.clone();
                cycle.push(name.to_string());
                return Err(ContextError::CircularDependency {
                    cycle: cycle.join(" -> "),
                });
            }
            creating.push(name.to_string());
        }

        let created = self.create(name, definition);
        self.in_creation.lock().retain(|n| n != name);
        let component = created?;

        self.singletons.insert(name.to_string(), component.clone());
        self.creation_order.lock().push(name.to_string());
        Ok(component)
    }

    fn create(&self, name: &str, definition: &ComponentDefinition) -> Result<Component> {
        tracing::debug!("Creating component '{}'", name);
        let mut component =
            definition
                .create(self)
                .map_err(|source| ContextError::ComponentCreation {
                    name: name.to_string(),
                    source,
                })?;

        let processors = self.post_processors.read().clone();
        for processor in &processors {
            component = processor
                .before_initialization(name, component)
                .map_err(|source| ContextError::ComponentCreation {
                    name: name.to_string(),
                    source,
                })?;
        }
        for processor in &processors {
            component = processor
                .after_initialization(name, component)
                .map_err(|source| ContextError::ComponentCreation {
                    name: name.to_string(),
                    source,
                })?;
        }
        Ok(component)
    }
}

impl Registry for MemoryRegistry {
    fn register_definition(&self, name: &str, definition: ComponentDefinition) -> Result<()> {
        self.assert_open()?;
        if self.frozen.load(Ordering::SeqCst) {
            return Err(ContextError::illegal_state(format!(
                "Cannot register component '{}': registry metadata is frozen",
                name
            )));
        }
        if self.definitions.insert(name.to_string(), definition).is_none() {
            self.definition_order.write().push(name.to_string());
        } else {
            tracing::debug!("Overriding definition for component '{}'", name);
        }
        Ok(())
    }

    fn register_singleton(&self, name: &str, component: Component) -> Result<()> {
        self.assert_open()?;
        let _guard = self.creation_lock.lock();
        if self.singletons.contains_key(name) {
            return Err(ContextError::illegal_state(format!(
                "Could not register component under '{}': there is already a singleton bound",
                name
            )));
        }
        self.singletons.insert(name.to_string(), component);
        self.creation_order.lock().push(name.to_string());
        Ok(())
    }

    fn find_by_name(&self, name: &str) -> Result<Option<Component>> {
        if let Some(existing) = self.singleton(name) {
            return Ok(Some(existing));
        }
        if let Some(dependency) = self.resolvable.get(name) {
            return Ok(Some(dependency.value().clone()));
        }
        let Some(definition) = self.definition(name) else {
            return Ok(None);
        };
        self.assert_open()?;

        if definition.is_singleton() {
            self.get_or_create_singleton(name, &definition).map(Some)
        } else {
            self.create(name, &definition).map(Some)
        }
    }

    fn contains_local(&self, name: &str) -> bool {
        self.definitions.contains_key(name) || self.singletons.contains_key(name)
    }

    fn find_by_kind(
        &self,
        kind: ComponentKind,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Vec<String> {
        let mut names = Vec::new();
        let order = self.definition_order.read().clone();

        for name in &order {
            let Some(definition) = self.definition(name) else {
                continue;
            };
            if !definition.is_singleton() && !include_non_singletons {
                continue;
            }
            let matches = if definition.declares(kind) {
                true
            } else if let Some(existing) = self.singleton(name) {
                existing.has_kind(kind)
            } else if allow_eager_init && definition.is_singleton() {
                match self.get_or_create_singleton(name, &definition) {
                    Ok(component) => component.has_kind(kind),
                    Err(e) => {
                        tracing::debug!("Skipping '{}' while matching {}: {}", name, kind, e);
                        false
                    }
                }
            } else {
                false
            };
            if matches {
                names.push(name.clone());
            }
        }

        // Manually registered singletons come after defined components
        let created = self.creation_order.lock().clone();
        for name in created {
            if self.definitions.contains_key(&name) || names.contains(&name) {
                continue;
            }
            if self.singleton(&name).is_some_and(|c| c.has_kind(kind)) {
                names.push(name);
            }
        }
        names
    }

    fn component_names(&self) -> Vec<String> {
        let mut names = self.definition_order.read().clone();
        for name in self.creation_order.lock().iter() {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    fn is_singleton(&self, name: &str) -> Result<bool> {
        if let Some(definition) = self.definition(name) {
            return Ok(definition.is_singleton());
        }
        if self.singletons.contains_key(name) {
            return Ok(true);
        }
        Err(ContextError::ComponentNotFound {
            name: name.to_string(),
        })
    }

    fn add_instance_post_processor(&self, processor: Arc<dyn InstancePostProcessor>) {
        let mut processors = self.post_processors.write();
        processors.retain(|p| !Arc::ptr_eq(p, &processor));
        processors.push(processor);
    }

    fn instance_post_processor_count(&self) -> usize {
        self.post_processors.read().len()
    }

    fn register_resolvable_dependency(&self, name: &str, component: Component) {
        self.resolvable.insert(name.to_string(), component);
    }

    fn ignore_dependency_marker(&self, marker: &str) {
        self.ignored_markers.write().insert(marker.to_string());
    }

    fn has_value_resolver(&self) -> bool {
        !self.value_resolvers.read().is_empty()
    }

    fn add_value_resolver(&self, resolver: ValueResolver) {
        self.value_resolvers.write().push(resolver);
    }

    fn resolve_embedded_value(&self, value: &str) -> String {
        let resolvers = self.value_resolvers.read().clone();
        resolvers
            .iter()
            .fold(value.to_string(), |current, resolver| resolver(&current))
    }

    fn set_temp_type_matching(&self, enabled: bool) {
        self.temp_type_matching.store(enabled, Ordering::SeqCst);
    }

    fn freeze_metadata(&self) {
        self.frozen.store(true, Ordering::SeqCst);
    }

    fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::SeqCst)
    }

    fn instantiate_eager_singletons(&self) -> Result<()> {
        self.assert_open()?;
        let order = self.definition_order.read().clone();
        let mut created = 0;
        for name in &order {
            let Some(definition) = self.definition(name) else {
                continue;
            };
            if definition.is_singleton() && !definition.is_lazy() {
                self.get_or_create_singleton(name, &definition)?;
                created += 1;
            }
        }
        tracing::debug!("Pre-instantiated {} singleton(s)", created);
        Ok(())
    }

    fn destroy_singletons(&self) {
        let _guard = self.creation_lock.lock();
        let order = std::mem::take(&mut *self.creation_order.lock());
        tracing::debug!("Destroying {} singleton(s)", order.len());

        for name in order.iter().rev() {
            let Some((_, component)) = self.singletons.remove(name) else {
                continue;
            };
            if let Some(disposable) = component.disposable() {
                tracing::debug!("Destroying: {}", name);
                if let Err(e) = disposable.destroy() {
                    // Log error but continue with other components
                    tracing::warn!("Destroy callback failed for {}: {}", name, e);
                }
            }
        }
        self.singletons.clear();
    }

    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.destroy_singletons();
        self.resolvable.clear();
        self.post_processors.write().clear();
        self.value_resolvers.write().clear();
    }
}
