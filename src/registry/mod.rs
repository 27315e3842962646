//! Registry Module
//!
//! The component registry is the collaborator that stores, creates and
//! destroys managed components. The application context only talks to it
//! through the [`Registry`] and [`RegistryProvider`] traits: it asks for a
//! registry at the start of every refresh, configures it, lets post-processors
//! work on it, has it instantiate eager singletons, and destroys it on close.
//!
//! [`MemoryRegistry`] is a small named-component store shipped with the
//! crate. It creates components from factories and keeps singletons, but it
//! does not resolve dependencies by itself; factories look up what they need.
//!
//! # Example
//!
//! ```rust,ignore
//! use meshestra_context::registry::{Component, ComponentDefinition, MemoryRegistry};
//!
//! let registry = MemoryRegistry::builder()
//!     .singleton("pool", |_| Ok(Component::new(DbPool::connect()?)))
//!     .definition(
//!         "user_repository",
//!         ComponentDefinition::singleton(|registry| {
//!             let pool = registry.get_instance::<DbPool>("pool")?;
//!             Ok(Component::new(UserRepository::new(pool)))
//!         }),
//!     )
//!     .build();
//! ```

mod builder;
mod component;
mod definition;
mod memory;
mod post_processors;
mod provider;

pub use builder::RegistryBuilder;
pub use component::{Component, ComponentKind};
pub use definition::{ComponentDefinition, ComponentFactory, Scope};
pub use memory::MemoryRegistry;
pub use post_processors::{InstancePostProcessor, RegistryPostProcessor};
pub use provider::{RefreshableRegistryProvider, RegistryProvider, SingleRegistryProvider};

pub(crate) use post_processors::{invoke_registry_post_processors, register_instance_post_processors};

use crate::error::{ContextError, Result};
use std::any::Any;
use std::sync::Arc;

/// Resolves embedded values such as `${db.url}` in component configuration.
pub type ValueResolver = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Storage and creation of managed components.
///
/// Reads are expected to be thread-safe once the registry has instantiated its
/// eager singletons; structural changes only happen while the owning context
/// holds its lifecycle lock.
pub trait Registry: Send + Sync {
    fn register_definition(&self, name: &str, definition: ComponentDefinition) -> Result<()>;

    /// Register an already created instance as a singleton
    fn register_singleton(&self, name: &str, component: Component) -> Result<()>;

    /// Look up a component, creating it if its definition calls for it.
    fn find_by_name(&self, name: &str) -> Result<Option<Component>>;

    /// Whether a definition or singleton exists under `name` in this registry
    fn contains_local(&self, name: &str) -> bool;

    /// Names of components exposing `kind`.
    ///
    /// Declared kinds are matched without creating anything. With
    /// `allow_eager_init`, undeclared singletons are created to inspect them.
    fn find_by_kind(
        &self,
        kind: ComponentKind,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Vec<String>;

    fn component_names(&self) -> Vec<String>;

    fn is_singleton(&self, name: &str) -> Result<bool>;

    fn add_instance_post_processor(&self, processor: Arc<dyn InstancePostProcessor>);

    fn instance_post_processor_count(&self) -> usize;

    /// Make `component` available under `name` without registering it as a
    /// managed component.
    fn register_resolvable_dependency(&self, name: &str, component: Component);

    /// Marker capability that must never be satisfied through lookup.
    fn ignore_dependency_marker(&self, marker: &str);

    fn has_value_resolver(&self) -> bool;

    fn add_value_resolver(&self, resolver: ValueResolver);

    fn resolve_embedded_value(&self, value: &str) -> String;

    /// Toggle temporary type matching used while post-processors run.
    fn set_temp_type_matching(&self, enabled: bool);

    /// No further structural changes are expected after this.
    fn freeze_metadata(&self);

    fn is_frozen(&self) -> bool;

    fn instantiate_eager_singletons(&self) -> Result<()>;

    /// Destroy cached singletons in reverse creation order. Destroy callback
    /// failures are logged, never returned.
    fn destroy_singletons(&self);

    fn close(&self);
}

impl<'a> dyn Registry + 'a {
    /// Look up a component and downcast its instance
    pub fn get_instance<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let component = self
            .find_by_name(name)?
            .ok_or_else(|| ContextError::ComponentNotFound {
                name: name.to_string(),
            })?;
        component
            .downcast::<T>()
            .ok_or_else(|| ContextError::DowncastFailed {
                name: name.to_string(),
                type_name: std::any::type_name::<T>().to_string(),
            })
    }
}
