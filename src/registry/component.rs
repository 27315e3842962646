use crate::context::ContextAware;
use crate::event::{ApplicationListener, EventDispatcher};
use crate::lifecycle::{Disposable, Lifecycle, LifecycleCoordinator};
use crate::message::MessageSource;
use crate::registry::{InstancePostProcessor, RegistryPostProcessor};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumIter};

/// Capabilities a component can expose to the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ComponentKind {
    Listener,
    Lifecycle,
    MessageSource,
    EventDispatcher,
    LifecycleCoordinator,
    ContextAware,
    RegistryPostProcessor,
    InstancePostProcessor,
    Disposable,
}

#[derive(Clone, Default)]
struct Capabilities {
    listener: Option<Arc<dyn ApplicationListener>>,
    lifecycle: Option<Arc<dyn Lifecycle>>,
    message_source: Option<Arc<dyn MessageSource>>,
    event_dispatcher: Option<Arc<dyn EventDispatcher>>,
    lifecycle_coordinator: Option<Arc<dyn LifecycleCoordinator>>,
    context_aware: Option<Arc<dyn ContextAware>>,
    registry_post_processor: Option<Arc<dyn RegistryPostProcessor>>,
    instance_post_processor: Option<Arc<dyn InstancePostProcessor>>,
    disposable: Option<Arc<dyn Disposable>>,
}

/// A managed instance together with the capabilities it exposes.
///
/// The instance itself is type-erased; the context never inspects it. What the
/// context needs (listening, lifecycle callbacks, message resolution, ...) is
/// declared explicitly through the `with_*` builders.
///
/// # Example
///
/// ```rust,ignore
/// let audit = Arc::new(AuditListener::default());
/// let component = Component::from_arc(Arc::clone(&audit)).with_listener(audit);
/// ```
#[derive(Clone)]
pub struct Component {
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
    capabilities: Capabilities,
}

impl Component {
    pub fn new<T: Any + Send + Sync>(instance: T) -> Self {
        Self::from_arc(Arc::new(instance))
    }

    pub fn from_arc<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
        Self {
            instance,
            type_name: std::any::type_name::<T>(),
            capabilities: Capabilities::default(),
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn ApplicationListener>) -> Self {
        self.capabilities.listener = Some(listener);
        self
    }

    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn Lifecycle>) -> Self {
        self.capabilities.lifecycle = Some(lifecycle);
        self
    }

    pub fn with_message_source(mut self, source: Arc<dyn MessageSource>) -> Self {
        self.capabilities.message_source = Some(source);
        self
    }

    pub fn with_event_dispatcher(mut self, dispatcher: Arc<dyn EventDispatcher>) -> Self {
        self.capabilities.event_dispatcher = Some(dispatcher);
        self
    }

    pub fn with_lifecycle_coordinator(mut self, coordinator: Arc<dyn LifecycleCoordinator>) -> Self {
        self.capabilities.lifecycle_coordinator = Some(coordinator);
        self
    }

    pub fn with_context_aware(mut self, aware: Arc<dyn ContextAware>) -> Self {
        self.capabilities.context_aware = Some(aware);
        self
    }

    pub fn with_registry_post_processor(mut self, processor: Arc<dyn RegistryPostProcessor>) -> Self {
        self.capabilities.registry_post_processor = Some(processor);
        self
    }

    pub fn with_instance_post_processor(mut self, processor: Arc<dyn InstancePostProcessor>) -> Self {
        self.capabilities.instance_post_processor = Some(processor);
        self
    }

    pub fn with_disposable(mut self, disposable: Arc<dyn Disposable>) -> Self {
        self.capabilities.disposable = Some(disposable);
        self
    }

    pub fn listener(&self) -> Option<Arc<dyn ApplicationListener>> {
        self.capabilities.listener.clone()
    }

    pub fn lifecycle(&self) -> Option<Arc<dyn Lifecycle>> {
        self.capabilities.lifecycle.clone()
    }

    pub fn message_source(&self) -> Option<Arc<dyn MessageSource>> {
        self.capabilities.message_source.clone()
    }

    pub fn event_dispatcher(&self) -> Option<Arc<dyn EventDispatcher>> {
        self.capabilities.event_dispatcher.clone()
    }

    pub fn lifecycle_coordinator(&self) -> Option<Arc<dyn LifecycleCoordinator>> {
        self.capabilities.lifecycle_coordinator.clone()
    }

    pub fn context_aware(&self) -> Option<Arc<dyn ContextAware>> {
        self.capabilities.context_aware.clone()
    }

    pub fn registry_post_processor(&self) -> Option<Arc<dyn RegistryPostProcessor>> {
        self.capabilities.registry_post_processor.clone()
    }

    pub fn instance_post_processor(&self) -> Option<Arc<dyn InstancePostProcessor>> {
        self.capabilities.instance_post_processor.clone()
    }

    pub fn disposable(&self) -> Option<Arc<dyn Disposable>> {
        self.capabilities.disposable.clone()
    }

    pub fn has_kind(&self, kind: ComponentKind) -> bool {
        let caps = &self.capabilities;
        match kind {
            ComponentKind::Listener => caps.listener.is_some(),
            ComponentKind::Lifecycle => caps.lifecycle.is_some(),
            ComponentKind::MessageSource => caps.message_source.is_some(),
            ComponentKind::EventDispatcher => caps.event_dispatcher.is_some(),
            ComponentKind::LifecycleCoordinator => caps.lifecycle_coordinator.is_some(),
            ComponentKind::ContextAware => caps.context_aware.is_some(),
            ComponentKind::RegistryPostProcessor => caps.registry_post_processor.is_some(),
            ComponentKind::InstancePostProcessor => caps.instance_post_processor.is_some(),
            ComponentKind::Disposable => caps.disposable.is_some(),
        }
    }

    pub fn kinds(&self) -> Vec<ComponentKind> {
        use strum::IntoEnumIterator;
        ComponentKind::iter().filter(|k| self.has_kind(*k)).collect()
    }

    /// The underlying instance if it is a `T`
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("type", &self.type_name)
            .field("kinds", &self.kinds())
            .finish()
    }
}
