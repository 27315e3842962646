use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ContextError>;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Initialization failed: {0}")]
    Initialization(String),

    #[error("{0}")]
    IllegalState(String),

    #[error("No message found under code '{code}' for locale '{locale}'")]
    NoSuchMessage { code: String, locale: String },

    #[error("Missing required properties: {}", .0.join(", "))]
    MissingRequiredProperties(Vec<String>),

    #[error("Component not found: {name}")]
    ComponentNotFound { name: String },

    #[error("Component '{name}' is not of type {type_name}")]
    DowncastFailed { name: String, type_name: String },

    #[error("Error creating component '{name}': {source}")]
    ComponentCreation {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    #[error("Post-processor {processor} failed: {source}")]
    PostProcessorFailed {
        processor: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Listener failed while handling {event_type}: {source}")]
    ListenerFailed {
        event_type: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Lifecycle callback failed for {component}: {message}")]
    LifecycleFailed { component: String, message: String },
}

impl ContextError {
    /// Create an initialization failure error
    pub fn initialization(msg: impl Into<String>) -> Self {
        Self::Initialization(msg.into())
    }

    /// Create an illegal state error
    pub fn illegal_state(msg: impl Into<String>) -> Self {
        Self::IllegalState(msg.into())
    }

    /// Create a lifecycle failure error
    pub fn lifecycle_failed(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LifecycleFailed {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Whether this error belongs to the startup failure family.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            Self::Initialization(_)
                | Self::ComponentCreation { .. }
                | Self::CircularDependency { .. }
                | Self::PostProcessorFailed { .. }
                | Self::MissingRequiredProperties(_)
        )
    }

    pub fn is_illegal_state(&self) -> bool {
        matches!(self, Self::IllegalState(_))
    }
}

/// Run one teardown step, logging (never propagating) its failure.
///
/// Panics are caught as well: shutdown has to reach its last step no matter
/// what a listener or lifecycle component does.
pub(crate) fn best_effort<F>(step: &str, f: F)
where
    F: FnOnce() -> Result<()>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Exception thrown during {}: {}", step, e),
        Err(_) => tracing::warn!("Panic raised during {}", step),
    }
}
