//! Synchronous event multicasting

use super::{ApplicationEvent, ApplicationListener, EventType, ListenerSet};
use crate::error::{ContextError, Result};
use crate::registry::Registry;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Receives listener failures when installed on a dispatcher.
pub type ErrorHandler = Arc<dyn Fn(&ContextError) + Send + Sync>;

/// Delivers published events to matching listeners.
///
/// Implementations dispatch on the calling thread and invoke listeners in
/// registration order. They never buffer: a context holds back events
/// published before its dispatcher exists.
pub trait EventDispatcher: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn ApplicationListener>);

    /// Register a listener by component name; it is looked up in the
    /// registry when an event is dispatched, not now.
    fn add_listener_component(&self, name: &str);

    fn remove_listener(&self, listener: &Arc<dyn ApplicationListener>);

    fn remove_all_listeners(&self);

    fn dispatch(&self, event: &ApplicationEvent, event_type: &EventType) -> Result<()>;
}

/// Default [`EventDispatcher`].
///
/// Without an error handler the first failing listener aborts the dispatch
/// and its error is returned to the publisher.
pub struct SimpleEventDispatcher {
    registry: Option<Arc<dyn Registry>>,
    listeners: RwLock<ListenerSet>,
    listener_components: RwLock<Vec<String>>,
    retriever_cache: DashMap<EventType, Vec<Arc<dyn ApplicationListener>>>,
    error_handler: Option<ErrorHandler>,
}

impl Default for SimpleEventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl SimpleEventDispatcher {
    /// Dispatcher without registry access; by-name listeners are ignored.
    pub fn new() -> Self {
        Self {
            registry: None,
            listeners: RwLock::new(ListenerSet::new()),
            listener_components: RwLock::new(Vec::new()),
            retriever_cache: DashMap::new(),
            error_handler: None,
        }
    }

    /// Dispatcher resolving by-name listeners from `registry`
    pub fn with_registry(registry: Arc<dyn Registry>) -> Self {
        Self {
            registry: Some(registry),
            ..Self::new()
        }
    }

    /// Report listener failures to `handler` and keep dispatching.
    pub fn error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Number of listener instances plus by-name listener registrations
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len() + self.listener_components.read().len()
    }

    fn listeners_for(&self, event_type: &EventType) -> Result<Vec<Arc<dyn ApplicationListener>>> {
        if let Some(cached) = self.retriever_cache.get(event_type) {
            return Ok(cached.value().clone());
        }

        let mut matched = ListenerSet::new();
        for listener in self.listeners.read().iter() {
            if listener.supports_event_type(event_type) {
                matched.insert(Arc::clone(listener));
            }
        }

        let mut cacheable = true;
        if let Some(registry) = &self.registry {
            let names = self.listener_components.read().clone();
            for name in names {
                let Some(component) = registry.find_by_name(&name)? else {
                    continue;
                };
                let Some(listener) = component.listener() else {
                    tracing::debug!("Component '{}' is not a listener, skipping", name);
                    continue;
                };
                if listener.supports_event_type(event_type) {
                    matched.insert(listener);
                }
                if !registry.is_singleton(&name)? {
                    cacheable = false;
                }
            }
        }

        let matched = matched.to_vec();
        if cacheable {
            self.retriever_cache.insert(*event_type, matched.clone());
        }
        Ok(matched)
    }
}

impl EventDispatcher for SimpleEventDispatcher {
    fn add_listener(&self, listener: Arc<dyn ApplicationListener>) {
        self.listeners.write().insert(listener);
        self.retriever_cache.clear();
    }

    fn add_listener_component(&self, name: &str) {
        {
            let mut names = self.listener_components.write();
            if names.iter().any(|n| n == name) {
                return;
            }
            names.push(name.to_string());
        }
        self.retriever_cache.clear();
    }

    fn remove_listener(&self, listener: &Arc<dyn ApplicationListener>) {
        self.listeners.write().remove(listener);
        self.retriever_cache.clear();
    }

    fn remove_all_listeners(&self) {
        self.listeners.write().clear();
        self.listener_components.write().clear();
        self.retriever_cache.clear();
    }

    fn dispatch(&self, event: &ApplicationEvent, event_type: &EventType) -> Result<()> {
        let listeners = self.listeners_for(event_type)?;
        tracing::trace!(
            "Dispatching {} to {} listener(s)",
            event_type,
            listeners.len()
        );

        for listener in listeners {
            if let Err(source) = listener.on_application_event(event) {
                let err = ContextError::ListenerFailed {
                    event_type: event_type.to_string(),
                    source,
                };
                match &self.error_handler {
                    Some(handler) => handler(&err),
                    None => return Err(err),
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ContextEvent, listener};
    use crate::registry::{Component, ComponentDefinition, ComponentKind, MemoryRegistry};
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> Arc<dyn ApplicationListener> {
        let log = Arc::clone(log);
        let tag = tag.to_string();
        listener::on_event(move |event| {
            log.lock().push(format!("{}:{}", tag, event.event_type()));
            Ok(())
        })
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = SimpleEventDispatcher::new();
        dispatcher.add_listener(recorder(&log, "first"));
        dispatcher.add_listener(recorder(&log, "second"));

        let event = ApplicationEvent::context("ctx", ContextEvent::Refreshed);
        dispatcher.dispatch(&event, &event.event_type()).unwrap();

        assert_eq!(
            *log.lock(),
            vec!["first:ContextRefreshed", "second:ContextRefreshed"]
        );
    }

    #[test]
    fn test_only_matching_listeners_receive() {
        let hits = Arc::new(Mutex::new(Vec::<u32>::new()));
        let sink = Arc::clone(&hits);
        let dispatcher = SimpleEventDispatcher::new();
        dispatcher.add_listener(listener::on_payload::<u32, _>(move |_, value| {
            sink.lock().push(*value);
            Ok(())
        }));

        let text = ApplicationEvent::payload("ctx", "ignored");
        dispatcher.dispatch(&text, &text.event_type()).unwrap();
        let number = ApplicationEvent::payload("ctx", 42u32);
        dispatcher.dispatch(&number, &number.event_type()).unwrap();

        assert_eq!(*hits.lock(), vec![42]);
    }

    #[test]
    fn test_listener_added_after_cache_fill_is_seen() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = SimpleEventDispatcher::new();
        let event = ApplicationEvent::context("ctx", ContextEvent::Started);

        dispatcher.dispatch(&event, &event.event_type()).unwrap();
        dispatcher.add_listener(recorder(&log, "late"));
        dispatcher.dispatch(&event, &event.event_type()).unwrap();

        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_listener_error_aborts_without_handler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = SimpleEventDispatcher::new();
        dispatcher.add_listener(listener::on_event(|_| anyhow::bail!("listener broke")));
        dispatcher.add_listener(recorder(&log, "after"));

        let event = ApplicationEvent::context("ctx", ContextEvent::Closed);
        let err = dispatcher
            .dispatch(&event, &event.event_type())
            .unwrap_err();

        assert!(matches!(err, ContextError::ListenerFailed { .. }));
        assert!(log.lock().is_empty());
    }

    #[test]
    fn test_error_handler_keeps_dispatching() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&errors);
        let dispatcher = SimpleEventDispatcher::new().error_handler(Arc::new(move |_| {
            *counter.lock() += 1;
        }));
        dispatcher.add_listener(listener::on_event(|_| anyhow::bail!("listener broke")));
        dispatcher.add_listener(recorder(&log, "after"));

        let event = ApplicationEvent::context("ctx", ContextEvent::Closed);
        dispatcher.dispatch(&event, &event.event_type()).unwrap();

        assert_eq!(*errors.lock(), 1);
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn test_listener_component_resolved_lazily() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let created = Arc::new(Mutex::new(0usize));

        let registry = MemoryRegistry::new();
        let sink = Arc::clone(&log);
        let count = Arc::clone(&created);
        registry
            .register_definition(
                "audit",
                ComponentDefinition::singleton(move |_| {
                    *count.lock() += 1;
                    let listener = recorder(&sink, "audit");
                    Ok(Component::new(()).with_listener(listener))
                })
                .lazy()
                .provides(ComponentKind::Listener),
            )
            .unwrap();
        let registry: Arc<dyn Registry> = Arc::new(registry);

        let dispatcher = SimpleEventDispatcher::with_registry(registry);
        dispatcher.add_listener_component("audit");
        assert_eq!(*created.lock(), 0);

        let event = ApplicationEvent::context("ctx", ContextEvent::Refreshed);
        dispatcher.dispatch(&event, &event.event_type()).unwrap();
        dispatcher.dispatch(&event, &event.event_type()).unwrap();

        assert_eq!(*created.lock(), 1);
        assert_eq!(log.lock().len(), 2);
    }

    #[test]
    fn test_named_listener_not_delivered_twice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let shared = recorder(&log, "shared");

        let registry = MemoryRegistry::new();
        let component = Component::new(()).with_listener(Arc::clone(&shared));
        registry.register_singleton("shared", component).unwrap();
        let registry: Arc<dyn Registry> = Arc::new(registry);

        let dispatcher = SimpleEventDispatcher::with_registry(registry);
        dispatcher.add_listener(shared);
        dispatcher.add_listener_component("shared");

        let event = ApplicationEvent::context("ctx", ContextEvent::Refreshed);
        dispatcher.dispatch(&event, &event.event_type()).unwrap();
        assert_eq!(log.lock().len(), 1);
    }
}
