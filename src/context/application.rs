use super::aware::ContextAwareProcessor;
use super::builder::ContextBuilder;
use super::hooks::{RefreshHooks, RefreshPhase};
use super::listeners::ListenerRegistry;
use super::messages::ParentContextMessageSource;
use super::{APPLICATION_CONTEXT, ENVIRONMENT, EVENT_DISPATCHER, LIFECYCLE_COORDINATOR, MESSAGE_SOURCE};
use crate::config::Environment;
use crate::error::{ContextError, Result, best_effort};
use crate::event::{
    ApplicationEvent, ApplicationListener, ContextEvent, EventDispatcher, EventType, SimpleEventDispatcher,
};
use crate::introspection;
use crate::lifecycle::{DefaultLifecycleCoordinator, LifecycleCoordinator, ShutdownHook, shutdown_signal};
use crate::live;
use crate::message::{DelegatingMessageSource, Locale, MessageResolvable, MessageSource};
use crate::registry::{
    self, Component, ComponentKind, Registry, RegistryPostProcessor, RegistryProvider,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt::{self, Display};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// How a well-known component was obtained during refresh.
#[derive(Debug, Clone)]
pub enum Adopted<T> {
    /// Found in the registry under its reserved name
    Declared(T),
    /// Created by the context because none was declared
    Default(T),
}

impl<T> Adopted<T> {
    pub fn is_declared(&self) -> bool {
        matches!(self, Adopted::Declared(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Adopted::Declared(value) | Adopted::Default(value) => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Adopted::Declared(value) | Adopted::Default(value) => value,
        }
    }
}

/// Hosts a component registry and drives it through refresh and close.
///
/// A context is always shared as `Arc<ApplicationContext>`. `refresh` and
/// `close` are serialized by one lifecycle lock; everything else (lookups,
/// publishing, message resolution) runs concurrently and is guarded by the
/// `active`/`closed` flags only.
///
/// Listeners must not call `refresh` or `close` on the context that is
/// dispatching to them while a refresh or close is in progress: the
/// lifecycle lock is not reentrant.
///
/// # Example
///
/// ```rust,ignore
/// let context = ApplicationContext::builder()
///     .display_name("orders")
///     .registry(registry)
///     .listener(listener::on_context(ContextEvent::Refreshed, |_| {
///         tracing::info!("ready");
///         Ok(())
///     }))
///     .build();
///
/// context.refresh()?;
/// let repository = context.get_instance::<OrderRepository>("order_repository")?;
/// context.close();
/// ```
pub struct ApplicationContext {
    this: Weak<ApplicationContext>,
    id: RwLock<String>,
    display_name: RwLock<String>,
    parent: RwLock<Option<Weak<ApplicationContext>>>,
    environment: RwLock<Option<Environment>>,
    startup_date: RwLock<Option<DateTime<Utc>>>,

    active: AtomicBool,
    closed: AtomicBool,
    lifecycle_lock: Mutex<()>,

    provider: Arc<dyn RegistryProvider>,
    hooks: Arc<dyn RefreshHooks>,
    registry: RwLock<Option<Arc<dyn Registry>>>,
    registry_post_processors: RwLock<Vec<Arc<dyn RegistryPostProcessor>>>,

    listeners: RwLock<ListenerRegistry>,
    early_events: Mutex<Option<Vec<(ApplicationEvent, EventType)>>>,

    dispatcher: RwLock<Option<Arc<dyn EventDispatcher>>>,
    message_source: RwLock<Option<Arc<dyn MessageSource>>>,
    coordinator: RwLock<Option<Arc<dyn LifecycleCoordinator>>>,

    shutdown_hook: Mutex<Option<ShutdownHook>>,
}

impl ApplicationContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::new()
    }

    pub(super) fn from_builder(builder: ContextBuilder) -> Arc<Self> {
        let uuid = Uuid::new_v4();
        let id = builder.id.unwrap_or_else(|| uuid.to_string());
        let display_name = builder
            .display_name
            .unwrap_or_else(|| format!("ApplicationContext@{}", &uuid.simple().to_string()[..8]));

        let mut listeners = ListenerRegistry::default();
        for listener in builder.listeners {
            listeners.add(listener);
        }

        let context = Arc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            id: RwLock::new(id),
            display_name: RwLock::new(display_name),
            parent: RwLock::new(None),
            environment: RwLock::new(builder.environment),
            startup_date: RwLock::new(None),
            active: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            lifecycle_lock: Mutex::new(()),
            provider: builder.provider,
            hooks: builder.hooks,
            registry: RwLock::new(None),
            registry_post_processors: RwLock::new(builder.registry_post_processors),
            listeners: RwLock::new(listeners),
            early_events: Mutex::new(None),
            dispatcher: RwLock::new(None),
            message_source: RwLock::new(None),
            coordinator: RwLock::new(None),
            shutdown_hook: Mutex::new(None),
        });

        if !builder.required_properties.is_empty() {
            context
                .environment()
                .set_required_properties(builder.required_properties);
        }
        if let Some(parent) = builder.parent {
            context.link_parent(&parent);
        }
        context
    }

    // Identity and hierarchy

    pub fn id(&self) -> String {
        self.id.read().clone()
    }

    pub fn set_id(&self, id: impl Into<String>) {
        *self.id.write() = id.into();
    }

    pub fn display_name(&self) -> String {
        self.display_name.read().clone()
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        *self.display_name.write() = name.into();
    }

    /// The parent context, if one is set and still alive
    pub fn parent(&self) -> Option<Arc<ApplicationContext>> {
        self.parent.read().as_ref().and_then(Weak::upgrade)
    }

    /// Attach a parent context and inherit its property sources.
    ///
    /// The link is non-owning; the caller keeps the parent alive.
    pub fn set_parent(&self, parent: &Arc<ApplicationContext>) -> Result<()> {
        let mut ancestor = Some(Arc::clone(parent));
        while let Some(current) = ancestor {
            if std::ptr::eq(current.as_ref(), self) {
                return Err(ContextError::illegal_state(format!(
                    "Setting {} as parent of {} would create a cycle",
                    parent.display_name(),
                    self.display_name()
                )));
            }
            ancestor = current.parent();
        }
        self.link_parent(parent);
        Ok(())
    }

    fn link_parent(&self, parent: &Arc<ApplicationContext>) {
        *self.parent.write() = Some(Arc::downgrade(parent));
        self.environment().merge(&parent.environment());
    }

    /// The property view of this context, created on first access
    pub fn environment(&self) -> Environment {
        if let Some(environment) = self.environment.read().as_ref() {
            return environment.clone();
        }
        self.environment
            .write()
            .get_or_insert_with(Environment::new)
            .clone()
    }

    pub fn set_environment(&self, environment: Environment) {
        *self.environment.write() = Some(environment);
    }

    /// When the last refresh started
    pub fn startup_date(&self) -> Option<DateTime<Utc>> {
        *self.startup_date.read()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // Refresh

    /// Load or reload the registry and bring every component up.
    ///
    /// On failure after the registry was prepared, the singletons created so
    /// far are destroyed and the context is left inactive. A closed context
    /// cannot be refreshed again.
    pub fn refresh(&self) -> Result<()> {
        let _guard = self.lifecycle_lock.lock();
        if self.is_closed() {
            return Err(ContextError::illegal_state(format!(
                "{} has been closed already",
                self.display_name()
            )));
        }

        tracing::info!("Refreshing {}", self.display_name());
        let result = self.run_refresh();
        introspection::clear_caches();
        if result.is_ok() {
            tracing::info!("Refreshed {}", self);
        }
        result
    }

    fn run_refresh(&self) -> Result<()> {
        let was_active = self.is_active();

        let registry = match self.bootstrap() {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!("Refresh of {} failed before startup: {}", self.display_name(), e);
                self.active.store(was_active, Ordering::SeqCst);
                *self.early_events.lock() = None;
                return Err(e);
            }
        };

        if let Err(e) = self.initialize(&registry) {
            tracing::error!(
                "Exception encountered during context initialization - cancelling refresh attempt: {}",
                e
            );
            let coordinator = self.coordinator.write().take();
            if let Some(coordinator) = coordinator {
                best_effort("lifecycle coordinator rollback", || coordinator.on_close());
            }
            registry.destroy_singletons();
            self.discard_delegates();
            self.active.store(false, Ordering::SeqCst);
            *self.early_events.lock() = None;
            return Err(e);
        }
        Ok(())
    }

    fn enter(&self, phase: RefreshPhase) {
        tracing::debug!("Refresh phase {} ({}) for {}", phase.ordinal(), phase, self.display_name());
        self.hooks.before_phase(self, phase);
    }

    /// Phases that leave nothing to roll back
    fn bootstrap(&self) -> Result<Arc<dyn Registry>> {
        self.enter(RefreshPhase::PrepareRefresh);
        self.prepare_refresh()?;

        self.enter(RefreshPhase::ObtainRegistry);
        let registry = self.obtain_registry()?;

        self.enter(RefreshPhase::PrepareRegistry);
        self.prepare_registry(&registry)?;
        Ok(registry)
    }

    fn initialize(&self, registry: &Arc<dyn Registry>) -> Result<()> {
        self.enter(RefreshPhase::PostProcessRegistry);
        self.hooks.post_process_registry(self, registry.as_ref())?;

        self.enter(RefreshPhase::InvokeRegistryPostProcessors);
        let processors = self.registry_post_processors.read().clone();
        registry::invoke_registry_post_processors(registry.as_ref(), &processors)?;

        self.enter(RefreshPhase::RegisterInstancePostProcessors);
        registry::register_instance_post_processors(registry.as_ref())?;

        self.enter(RefreshPhase::InitMessageSource);
        self.init_message_source(registry)?;

        self.enter(RefreshPhase::InitEventDispatcher);
        self.init_event_dispatcher(registry)?;

        self.enter(RefreshPhase::OnRefresh);
        self.hooks.on_refresh(self)?;

        self.enter(RefreshPhase::RegisterListeners);
        self.register_listeners(registry)?;

        self.enter(RefreshPhase::FinishRegistryInitialization);
        self.finish_registry_initialization(registry)?;

        self.enter(RefreshPhase::FinishRefresh);
        self.finish_refresh(registry)
    }

    fn prepare_refresh(&self) -> Result<()> {
        *self.startup_date.write() = Some(Utc::now());
        self.closed.store(false, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);

        let environment = self.environment();
        self.hooks.init_property_sources(&environment)?;
        environment.validate_required_properties()?;

        self.listeners.write().prepare_refresh();
        *self.early_events.lock() = Some(Vec::new());
        Ok(())
    }

    fn obtain_registry(&self) -> Result<Arc<dyn Registry>> {
        let previous = self.registry.read().clone();
        let registry = self.provider.provision_registry(previous)?;
        *self.registry.write() = Some(Arc::clone(&registry));
        Ok(registry)
    }

    fn prepare_registry(&self, registry: &Arc<dyn Registry>) -> Result<()> {
        registry.set_temp_type_matching(true);
        registry.add_instance_post_processor(ContextAwareProcessor::new(Weak::clone(&self.this)));
        registry.ignore_dependency_marker("ContextAware");
        registry.ignore_dependency_marker("EnvironmentAware");

        registry.register_resolvable_dependency(APPLICATION_CONTEXT, Component::new(Weak::clone(&self.this)));
        if !registry.contains_local(ENVIRONMENT) {
            registry.register_singleton(ENVIRONMENT, Component::new(self.environment()))?;
        }
        Ok(())
    }

    fn init_message_source(&self, registry: &Arc<dyn Registry>) -> Result<()> {
        let adopted = adopt(registry.as_ref(), MESSAGE_SOURCE, Component::message_source, || {
            let source = Arc::new(DelegatingMessageSource::new());
            registry.register_singleton(
                MESSAGE_SOURCE,
                Component::from_arc(Arc::clone(&source)).with_message_source(source.clone()),
            )?;
            Ok(source as Arc<dyn MessageSource>)
        })?;

        if let Some(parent_source) = self.internal_parent_message_source() {
            if let Some(hierarchical) = adopted.get().as_hierarchical() {
                // First parent wins
                if hierarchical.parent_message_source().is_none() {
                    hierarchical.set_parent_message_source(Some(parent_source));
                }
            }
        }

        tracing::trace!(
            "Using {} message source for {}",
            if adopted.is_declared() { "declared" } else { "default" },
            self.display_name()
        );
        *self.message_source.write() = Some(adopted.into_inner());
        Ok(())
    }

    fn internal_parent_message_source(&self) -> Option<Arc<dyn MessageSource>> {
        let parent = self.parent()?;
        let initialized = parent.message_source.read().clone();
        Some(initialized.unwrap_or_else(|| -> Arc<dyn MessageSource> {
            Arc::new(ParentContextMessageSource::new(Arc::downgrade(&parent)))
        }))
    }

    fn init_event_dispatcher(&self, registry: &Arc<dyn Registry>) -> Result<()> {
        let adopted = adopt(registry.as_ref(), EVENT_DISPATCHER, Component::event_dispatcher, || {
            let dispatcher = Arc::new(SimpleEventDispatcher::with_registry(Arc::clone(registry)));
            registry.register_singleton(
                EVENT_DISPATCHER,
                Component::from_arc(Arc::clone(&dispatcher)).with_event_dispatcher(dispatcher.clone()),
            )?;
            Ok(dispatcher as Arc<dyn EventDispatcher>)
        })?;

        tracing::trace!(
            "Using {} event dispatcher for {}",
            if adopted.is_declared() { "declared" } else { "default" },
            self.display_name()
        );
        *self.dispatcher.write() = Some(adopted.into_inner());
        Ok(())
    }

    fn register_listeners(&self, registry: &Arc<dyn Registry>) -> Result<()> {
        let dispatcher = self.event_dispatcher()?;

        let listeners = self.listeners.read().listeners().to_vec();
        for listener in listeners {
            dispatcher.add_listener(listener);
        }
        // Resolved at dispatch time, not instantiated here
        for name in registry.find_by_kind(ComponentKind::Listener, true, false) {
            dispatcher.add_listener_component(&name);
        }

        let early = self.early_events.lock().take();
        if let Some(events) = early {
            tracing::debug!("Publishing {} early event(s) for {}", events.len(), self.display_name());
            for (event, event_type) in events {
                dispatcher.dispatch(&event, &event_type)?;
            }
        }
        Ok(())
    }

    fn finish_registry_initialization(&self, registry: &Arc<dyn Registry>) -> Result<()> {
        if !registry.has_value_resolver() {
            let environment = self.environment();
            registry.add_value_resolver(Arc::new(move |value: &str| {
                environment.resolve_placeholders(value)
            }));
        }
        registry.set_temp_type_matching(false);
        registry.freeze_metadata();
        registry.instantiate_eager_singletons()
    }

    fn finish_refresh(&self, registry: &Arc<dyn Registry>) -> Result<()> {
        self.hooks.clear_resource_caches();

        let adopted = adopt(registry.as_ref(), LIFECYCLE_COORDINATOR, Component::lifecycle_coordinator, || {
            let coordinator = Arc::new(DefaultLifecycleCoordinator::new(Arc::clone(registry)));
            registry.register_singleton(
                LIFECYCLE_COORDINATOR,
                Component::from_arc(Arc::clone(&coordinator)).with_lifecycle_coordinator(coordinator.clone()),
            )?;
            Ok(coordinator as Arc<dyn LifecycleCoordinator>)
        })?;
        tracing::trace!(
            "Using {} lifecycle coordinator for {}",
            if adopted.is_declared() { "declared" } else { "default" },
            self.display_name()
        );

        let coordinator = adopted.into_inner();
        *self.coordinator.write() = Some(Arc::clone(&coordinator));
        coordinator.on_refresh()?;

        self.publish_context_event(ContextEvent::Refreshed)?;
        live::register(self);
        Ok(())
    }

    // Close

    /// Tear the context down.
    ///
    /// Runs once: closing an inactive or already closed context does nothing.
    /// Failures of individual teardown steps are logged, never returned.
    pub fn close(&self) {
        {
            let _guard = self.lifecycle_lock.lock();
            self.do_close();
        }
        if let Some(hook) = self.shutdown_hook.lock().take() {
            tracing::debug!("Removing shutdown hook of {}", self.display_name());
            hook.remove();
        }
    }

    fn close_on_shutdown(&self) {
        let _guard = self.lifecycle_lock.lock();
        self.do_close();
    }

    fn do_close(&self) {
        if !self.is_active()
            || self
                .closed
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
        {
            return;
        }
        tracing::info!("Closing {}", self);
        live::unregister(&self.id());

        best_effort("publishing ContextClosed", || {
            self.publish_context_event(ContextEvent::Closed)
        });

        let coordinator = self.coordinator.write().take();
        best_effort("lifecycle coordinator close", || match &coordinator {
            Some(coordinator) => coordinator.on_close(),
            None => Ok(()),
        });

        let registry = self.registry.write().take();
        best_effort("destroying singletons", || {
            if let Some(registry) = &registry {
                registry.destroy_singletons();
            }
            Ok(())
        });
        best_effort("closing registry", || {
            if let Some(registry) = &registry {
                registry.close();
            }
            Ok(())
        });

        best_effort("close hook", || self.hooks.on_close(self));

        self.listeners.write().reset_to_baseline();
        self.discard_delegates();
        self.active.store(false, Ordering::SeqCst);
        tracing::info!("Closed {}", self.display_name());
    }

    /// Drop the dispatcher, message source and coordinator of the last refresh
    fn discard_delegates(&self) {
        *self.dispatcher.write() = None;
        *self.message_source.write() = None;
        *self.coordinator.write() = None;
    }

    /// Close this context when the process receives SIGTERM or Ctrl+C.
    ///
    /// Requires a running Tokio runtime. Installing a second hook is a no-op.
    pub fn register_shutdown_hook(&self) -> Result<()> {
        self.register_shutdown_hook_on(shutdown_signal())
    }

    /// Close this context once `trigger` completes
    pub fn register_shutdown_hook_on<F>(&self, trigger: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.shutdown_hook.lock();
        if slot.is_some() {
            return Ok(());
        }
        let context = Weak::clone(&self.this);
        *slot = Some(ShutdownHook::spawn(trigger, move || {
            if let Some(context) = context.upgrade() {
                context.close_on_shutdown();
            }
        })?);
        tracing::debug!("Registered shutdown hook for {}", self.display_name());
        Ok(())
    }

    pub fn has_shutdown_hook(&self) -> bool {
        self.shutdown_hook.lock().is_some()
    }

    // Events

    /// Add a listener; it survives refresh and close only if it was added
    /// before the first refresh.
    pub fn add_listener(&self, listener: Arc<dyn ApplicationListener>) {
        self.listeners.write().add(Arc::clone(&listener));
        let dispatcher = self.dispatcher.read().clone();
        if let Some(dispatcher) = dispatcher {
            dispatcher.add_listener(listener);
        }
    }

    /// Listeners held by the context itself
    pub fn listeners(&self) -> Vec<Arc<dyn ApplicationListener>> {
        self.listeners.read().listeners().to_vec()
    }

    /// Run `processor` against the registry on the next refresh, before the
    /// registry's own post-processors.
    pub fn add_registry_post_processor(&self, processor: Arc<dyn RegistryPostProcessor>) {
        self.registry_post_processors.write().push(processor);
    }

    /// Dispatch `event` to local listeners, then to the parent context.
    ///
    /// Until listeners are registered during refresh, events are buffered
    /// and deduplicated by [`ApplicationEvent::id`]: publishing the same
    /// event (or a clone of it) several times before that point delivers it
    /// once. Once the context is refreshed every call dispatches. Events
    /// built by [`publish`](Self::publish) always carry a fresh id.
    pub fn publish_event(&self, event: ApplicationEvent) -> Result<()> {
        self.publish_with_type(event, None)
    }

    /// Publish with an explicitly resolved event type
    pub fn publish_event_as(&self, event: ApplicationEvent, event_type: EventType) -> Result<()> {
        self.publish_with_type(event, Some(event_type))
    }

    /// Wrap `payload` in an event sourced from this context and publish it
    pub fn publish<T: Any + Send + Sync>(&self, payload: T) -> Result<()> {
        self.publish_event(ApplicationEvent::payload(self.id(), payload))
    }

    fn publish_context_event(&self, kind: ContextEvent) -> Result<()> {
        self.publish_event(ApplicationEvent::context(self.id(), kind))
    }

    fn publish_with_type(&self, event: ApplicationEvent, hint: Option<EventType>) -> Result<()> {
        let event_type = hint.unwrap_or_else(|| event.event_type());
        tracing::trace!("Publishing {} in {}", event_type, self.display_name());

        let buffered = {
            let mut early = self.early_events.lock();
            match early.as_mut() {
                Some(buffer) => {
                    if !buffer.iter().any(|(e, _)| e.id() == event.id()) {
                        buffer.push((event.clone(), event_type));
                    }
                    true
                }
                None => false,
            }
        };
        if !buffered {
            self.event_dispatcher()?.dispatch(&event, &event_type)?;
        }

        if let Some(parent) = self.parent() {
            parent.publish_with_type(event, Some(event_type))?;
        }
        Ok(())
    }

    pub fn event_dispatcher(&self) -> Result<Arc<dyn EventDispatcher>> {
        self.dispatcher.read().clone().ok_or_else(|| {
            ContextError::illegal_state(format!(
                "EventDispatcher not initialized - call 'refresh' before multicasting events via the context: {}",
                self.display_name()
            ))
        })
    }

    // Messages

    pub fn get_message(&self, code: &str, args: &[&dyn Display], locale: &Locale) -> Result<String> {
        self.resolve_message(code, args, None, locale)
    }

    pub fn get_message_or_default(
        &self,
        code: &str,
        args: &[&dyn Display],
        default: &str,
        locale: &Locale,
    ) -> Result<String> {
        self.resolve_message(code, args, Some(default), locale)
    }

    pub fn get_message_resolvable(&self, resolvable: &MessageResolvable, locale: &Locale) -> Result<String> {
        self.message_source()?.get_message_resolvable(resolvable, locale)
    }

    pub(crate) fn resolve_message(
        &self,
        code: &str,
        args: &[&dyn Display],
        default: Option<&str>,
        locale: &Locale,
    ) -> Result<String> {
        self.message_source()?.get_message(code, args, default, locale)
    }

    pub fn message_source(&self) -> Result<Arc<dyn MessageSource>> {
        self.message_source.read().clone().ok_or_else(|| {
            ContextError::illegal_state(format!(
                "MessageSource not initialized - call 'refresh' before accessing messages via the context: {}",
                self.display_name()
            ))
        })
    }

    // Components

    /// Fail unless the context is refreshed and not closed
    pub fn assert_active(&self) -> Result<()> {
        if self.is_active() {
            return Ok(());
        }
        let state = if self.is_closed() {
            "has been closed already"
        } else {
            "has not been refreshed yet"
        };
        Err(ContextError::illegal_state(format!("{} {}", self.display_name(), state)))
    }

    pub fn registry(&self) -> Result<Arc<dyn Registry>> {
        self.registry.read().clone().ok_or_else(|| {
            ContextError::illegal_state(format!(
                "Registry not initialized or already closed - call 'refresh' before accessing components via the context: {}",
                self.display_name()
            ))
        })
    }

    /// Look up a component here, then in the parent context
    pub fn get_component(&self, name: &str) -> Result<Component> {
        self.assert_active()?;
        if let Some(component) = self.registry()?.find_by_name(name)? {
            return Ok(component);
        }
        match self.parent() {
            Some(parent) => parent.get_component(name),
            None => Err(ContextError::ComponentNotFound {
                name: name.to_string(),
            }),
        }
    }

    pub fn get_instance<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        self.get_component(name)?
            .downcast::<T>()
            .ok_or_else(|| ContextError::DowncastFailed {
                name: name.to_string(),
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn is_singleton(&self, name: &str) -> Result<bool> {
        self.assert_active()?;
        let registry = self.registry()?;
        match self.parent() {
            Some(parent) if !registry.contains_local(name) => parent.is_singleton(name),
            _ => registry.is_singleton(name),
        }
    }

    /// Names of local components exposing `kind`
    pub fn component_names_for_kind(
        &self,
        kind: ComponentKind,
        include_non_singletons: bool,
        allow_eager_init: bool,
    ) -> Result<Vec<String>> {
        self.assert_active()?;
        Ok(self
            .registry()?
            .find_by_kind(kind, include_non_singletons, allow_eager_init))
    }

    pub fn contains_component(&self, name: &str) -> bool {
        self.contains_local_component(name)
            || self.parent().is_some_and(|parent| parent.contains_component(name))
    }

    pub fn contains_local_component(&self, name: &str) -> bool {
        self.registry
            .read()
            .as_ref()
            .is_some_and(|registry| registry.contains_local(name))
    }

    // Lifecycle

    /// Start all lifecycle components, including those without auto-startup
    pub fn start(&self) -> Result<()> {
        self.lifecycle_coordinator()?.start()?;
        self.publish_context_event(ContextEvent::Started)
    }

    pub fn stop(&self) -> Result<()> {
        self.lifecycle_coordinator()?.stop()?;
        self.publish_context_event(ContextEvent::Stopped)
    }

    pub fn is_running(&self) -> bool {
        self.coordinator
            .read()
            .as_ref()
            .is_some_and(|coordinator| coordinator.is_running())
    }

    pub fn lifecycle_coordinator(&self) -> Result<Arc<dyn LifecycleCoordinator>> {
        self.coordinator.read().clone().ok_or_else(|| {
            ContextError::illegal_state(format!(
                "LifecycleCoordinator not initialized - call 'refresh' before invoking lifecycle methods via the context: {}",
                self.display_name()
            ))
        })
    }
}

/// Use the component registered under `name`, or create and register the
/// default.
fn adopt<T: ?Sized>(
    registry: &dyn Registry,
    name: &str,
    capability: fn(&Component) -> Option<Arc<T>>,
    create_default: impl FnOnce() -> Result<Arc<T>>,
) -> Result<Adopted<Arc<T>>> {
    if !registry.contains_local(name) {
        return create_default().map(Adopted::Default);
    }
    registry
        .find_by_name(name)?
        .as_ref()
        .and_then(capability)
        .map(Adopted::Declared)
        .ok_or_else(|| {
            ContextError::initialization(format!(
                "Component '{}' does not provide the capability its reserved name requires",
                name
            ))
        })
}

impl fmt::Display for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())?;
        match self.startup_date() {
            Some(date) => write!(f, ", started on {}", date.to_rfc2822())?,
            None => write!(f, ", not started")?,
        }
        if let Some(parent) = self.parent() {
            write!(f, ", parent: {}", parent.display_name())?;
        }
        Ok(())
    }
}

impl fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("id", &self.id())
            .field("display_name", &self.display_name())
            .field("active", &self.is_active())
            .field("closed", &self.is_closed())
            .finish()
    }
}
