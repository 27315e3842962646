//! Event envelope and resolved event types

use crate::introspection;
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use strum_macros::{Display, EnumIter};
use uuid::Uuid;

/// Events the context itself publishes over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ContextEvent {
    #[strum(serialize = "ContextRefreshed")]
    Refreshed,
    #[strum(serialize = "ContextStarted")]
    Started,
    #[strum(serialize = "ContextStopped")]
    Stopped,
    #[strum(serialize = "ContextClosed")]
    Closed,
}

/// The resolved type of a published event, used for listener matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Context(ContextEvent),
    Payload { id: TypeId, name: &'static str },
}

impl EventType {
    /// Event type of a payload of type `T`
    pub fn payload<T: Any>() -> Self {
        Self::Payload {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn is_payload_of<T: Any>(&self) -> bool {
        matches!(self, Self::Payload { id, .. } if *id == TypeId::of::<T>())
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Context(kind) => write!(f, "{}", kind),
            Self::Payload { id, name } => write!(
                f,
                "PayloadEvent<{}>",
                introspection::short_type_name(*id, name)
            ),
        }
    }
}

/// What an [`ApplicationEvent`] carries.
#[derive(Clone)]
pub enum EventBody {
    Context(ContextEvent),
    Payload {
        value: Arc<dyn Any + Send + Sync>,
        event_type: EventType,
    },
}

/// An event travelling through the dispatcher.
///
/// Arbitrary values are wrapped in a payload envelope that remembers the
/// publishing context and the payload's type. Cloning is cheap and keeps the
/// event id, so a forwarded event stays the same logical event.
#[derive(Clone)]
pub struct ApplicationEvent {
    id: Uuid,
    source: String,
    timestamp: DateTime<Utc>,
    body: EventBody,
}

impl ApplicationEvent {
    /// A lifecycle event raised by the context identified by `source`
    pub fn context(source: impl Into<String>, kind: ContextEvent) -> Self {
        Self::with_body(source, EventBody::Context(kind))
    }

    /// Wrap an arbitrary value, inferring its event type
    pub fn payload<T: Any + Send + Sync>(source: impl Into<String>, payload: T) -> Self {
        Self::payload_as(source, payload, EventType::payload::<T>())
    }

    /// Wrap an arbitrary value under an explicitly resolved event type
    pub fn payload_as<T: Any + Send + Sync>(
        source: impl Into<String>,
        payload: T,
        event_type: EventType,
    ) -> Self {
        Self::with_body(
            source,
            EventBody::Payload {
                value: Arc::new(payload),
                event_type,
            },
        )
    }

    fn with_body(source: impl Into<String>, body: EventBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
            timestamp: Utc::now(),
            body,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Id of the context that published the event
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn body(&self) -> &EventBody {
        &self.body
    }

    /// The type inferred from the event itself
    pub fn event_type(&self) -> EventType {
        match &self.body {
            EventBody::Context(kind) => EventType::Context(*kind),
            EventBody::Payload { event_type, .. } => *event_type,
        }
    }

    pub fn context_kind(&self) -> Option<ContextEvent> {
        match &self.body {
            EventBody::Context(kind) => Some(*kind),
            EventBody::Payload { .. } => None,
        }
    }

    /// Borrow the payload if it is a `T`
    pub fn payload_ref<T: Any>(&self) -> Option<&T> {
        match &self.body {
            EventBody::Payload { value, .. } => value.downcast_ref::<T>(),
            EventBody::Context(_) => None,
        }
    }
}

impl fmt::Debug for ApplicationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationEvent")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("timestamp", &self.timestamp)
            .field("type", &self.event_type().to_string())
            .finish()
    }
}
