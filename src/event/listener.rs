//! Application listeners

use super::{ApplicationEvent, ContextEvent, EventType};
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

/// Receives events published through a context.
///
/// # Example
///
/// ```rust,ignore
/// use meshestra_context::event::{ApplicationEvent, ApplicationListener};
///
/// struct AuditListener;
///
/// impl ApplicationListener for AuditListener {
///     fn on_application_event(&self, event: &ApplicationEvent) -> anyhow::Result<()> {
///         tracing::info!("audit: {:?}", event);
///         Ok(())
///     }
/// }
/// ```
pub trait ApplicationListener: Send + Sync {
    /// Whether this listener wants events of the given type. Defaults to all.
    fn supports_event_type(&self, event_type: &EventType) -> bool {
        let _ = event_type;
        true
    }

    fn on_application_event(&self, event: &ApplicationEvent) -> anyhow::Result<()>;
}

/// Which events a closure listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interest {
    All,
    Context(ContextEvent),
}

struct FnListener<F> {
    interest: Interest,
    callback: F,
}

impl<F> ApplicationListener for FnListener<F>
where
    F: Fn(&ApplicationEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn supports_event_type(&self, event_type: &EventType) -> bool {
        match self.interest {
            Interest::All => true,
            Interest::Context(kind) => *event_type == EventType::Context(kind),
        }
    }

    fn on_application_event(&self, event: &ApplicationEvent) -> anyhow::Result<()> {
        (self.callback)(event)
    }
}

struct PayloadListener<T, F> {
    callback: F,
    _payload: PhantomData<fn(&T)>,
}

impl<T, F> ApplicationListener for PayloadListener<T, F>
where
    T: Any + Send + Sync,
    F: Fn(&ApplicationEvent, &T) -> anyhow::Result<()> + Send + Sync,
{
    fn supports_event_type(&self, event_type: &EventType) -> bool {
        event_type.is_payload_of::<T>()
    }

    fn on_application_event(&self, event: &ApplicationEvent) -> anyhow::Result<()> {
        match event.payload_ref::<T>() {
            Some(payload) => (self.callback)(event, payload),
            // Resolved as T through an explicit type hint but carrying another value
            None => Ok(()),
        }
    }
}

/// Listener for every event
pub fn on_event<F>(callback: F) -> Arc<dyn ApplicationListener>
where
    F: Fn(&ApplicationEvent) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnListener {
        interest: Interest::All,
        callback,
    })
}

/// Listener for one kind of context lifecycle event
pub fn on_context<F>(kind: ContextEvent, callback: F) -> Arc<dyn ApplicationListener>
where
    F: Fn(&ApplicationEvent) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(FnListener {
        interest: Interest::Context(kind),
        callback,
    })
}

/// Listener for payload events carrying a `T`
pub fn on_payload<T, F>(callback: F) -> Arc<dyn ApplicationListener>
where
    T: Any + Send + Sync,
    F: Fn(&ApplicationEvent, &T) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(PayloadListener {
        callback,
        _payload: PhantomData,
    })
}

/// Insertion-ordered set of listeners, unique by `Arc` identity.
#[derive(Clone, Default)]
pub struct ListenerSet {
    listeners: Vec<Arc<dyn ApplicationListener>>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the listener was already present.
    pub fn insert(&mut self, listener: Arc<dyn ApplicationListener>) -> bool {
        if self.contains(&listener) {
            return false;
        }
        self.listeners.push(listener);
        true
    }

    pub fn contains(&self, listener: &Arc<dyn ApplicationListener>) -> bool {
        self.listeners.iter().any(|l| Arc::ptr_eq(l, listener))
    }

    pub fn remove(&mut self, listener: &Arc<dyn ApplicationListener>) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| !Arc::ptr_eq(l, listener));
        before != self.listeners.len()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ApplicationListener>> {
        self.listeners.iter()
    }

    pub fn to_vec(&self) -> Vec<Arc<dyn ApplicationListener>> {
        self.listeners.clone()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
