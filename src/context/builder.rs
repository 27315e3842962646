use super::ApplicationContext;
use super::hooks::{NoopHooks, RefreshHooks};
use crate::config::Environment;
use crate::event::ApplicationListener;
use crate::registry::{
    MemoryRegistry, RefreshableRegistryProvider, RegistryPostProcessor, RegistryProvider,
    SingleRegistryProvider,
};
use std::sync::Arc;

/// Builder for [`ApplicationContext`]
///
/// Provides a fluent API for configuring a context before its first refresh.
///
/// # Example
///
/// ```rust,ignore
/// let root = ApplicationContext::builder()
///     .display_name("root")
///     .registry(shared_registry)
///     .build();
///
/// let web = ApplicationContext::builder()
///     .display_name("web")
///     .parent(&root)
///     .refreshable(|| load_web_components())
///     .hooks(WebServerHooks::new())
///     .build();
///
/// root.refresh()?;
/// web.refresh()?;
/// ```
pub struct ContextBuilder {
    pub(super) id: Option<String>,
    pub(super) display_name: Option<String>,
    pub(super) parent: Option<Arc<ApplicationContext>>,
    pub(super) environment: Option<Environment>,
    pub(super) provider: Arc<dyn RegistryProvider>,
    pub(super) hooks: Arc<dyn RefreshHooks>,
    pub(super) listeners: Vec<Arc<dyn ApplicationListener>>,
    pub(super) registry_post_processors: Vec<Arc<dyn RegistryPostProcessor>>,
    pub(super) required_properties: Vec<String>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    /// Create a builder for a context over an empty registry
    pub fn new() -> Self {
        Self {
            id: None,
            display_name: None,
            parent: None,
            environment: None,
            provider: Arc::new(SingleRegistryProvider::from(MemoryRegistry::new())),
            hooks: Arc::new(NoopHooks),
            listeners: Vec::new(),
            registry_post_processors: Vec::new(),
            required_properties: Vec::new(),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Set the parent context; a fresh context can never form a cycle
    pub fn parent(mut self, parent: &Arc<ApplicationContext>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    /// Use `environment` instead of one backed by the process environment
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Host a pre-built registry; the context can be refreshed once
    pub fn registry(self, registry: MemoryRegistry) -> Self {
        self.provider(SingleRegistryProvider::from(registry))
    }

    /// Build a fresh registry from `loader` on every refresh
    pub fn refreshable<F>(self, loader: F) -> Self
    where
        F: Fn() -> anyhow::Result<MemoryRegistry> + Send + Sync + 'static,
    {
        self.provider(RefreshableRegistryProvider::new(loader))
    }

    pub fn provider(mut self, provider: impl RegistryProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    pub fn hooks(mut self, hooks: impl RefreshHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    /// Register a listener that survives refresh cycles
    pub fn listener(mut self, listener: Arc<dyn ApplicationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn registry_post_processor(mut self, processor: Arc<dyn RegistryPostProcessor>) -> Self {
        self.registry_post_processors.push(processor);
        self
    }

    /// Property that must resolve when the context refreshes
    pub fn required_property(mut self, key: impl Into<String>) -> Self {
        self.required_properties.push(key.into());
        self
    }

    /// Build the context; it stays inactive until `refresh` is called
    pub fn build(self) -> Arc<ApplicationContext> {
        ApplicationContext::from_builder(self)
    }
}
