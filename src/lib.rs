//! # Meshestra Context
//!
//! Application context lifecycle orchestration for Meshestra.
//!
//! An [`ApplicationContext`](context::ApplicationContext) hosts a component
//! registry and drives it through a strictly ordered startup ("refresh") and
//! a best-effort shutdown ("close"), while multicasting lifecycle events and
//! composing into parent/child hierarchies.
//!
//! ## Features
//!
//! - **Ordered refresh**: twelve fixed phases with extension hooks and
//!   rollback of partially created singletons on failure
//! - **Safe close**: runs exactly once, every teardown step is attempted
//! - **Events**: synchronous multicasting, early-event buffering, bubbling
//!   to parent contexts
//! - **Messages**: hierarchical, locale-aware message resolution
//! - **Lifecycle**: phase-ordered start/stop of managed components and a
//!   signal-driven shutdown hook
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshestra_context::prelude::*;
//! use std::sync::Arc;
//!
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! fn main() -> meshestra_context::Result<()> {
//!     let registry = MemoryRegistry::builder()
//!         .singleton("greeter", |_| {
//!             Ok(Component::new(Greeter {
//!                 greeting: "hello".to_string(),
//!             }))
//!         })
//!         .build();
//!
//!     let context = ApplicationContext::builder()
//!         .display_name("quick-start")
//!         .registry(registry)
//!         .listener(listener::on_context(ContextEvent::Refreshed, |event| {
//!             tracing::info!("{} is ready", event.source());
//!             Ok(())
//!         }))
//!         .build();
//!
//!     context.refresh()?;
//!     let greeter: Arc<Greeter> = context.get_instance("greeter")?;
//!     tracing::info!("{}", greeter.greeting);
//!     context.close();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod introspection;
pub mod lifecycle;
pub mod live;
pub mod message;
pub mod registry;

// Re-export core types
pub use context::{ApplicationContext, ContextBuilder};
pub use error::{ContextError, Result};

/// Prelude module for convenient imports
///
/// ```
/// use meshestra_context::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{Environment, PropertySource};
    pub use crate::context::{
        ApplicationContext, ContextAware, ContextBuilder, NoopHooks, RefreshHooks, RefreshPhase,
    };
    pub use crate::error::{ContextError, Result};
    pub use crate::event::{
        ApplicationEvent, ApplicationListener, ContextEvent, EventDispatcher, EventType, listener,
    };
    pub use crate::lifecycle::{Disposable, Lifecycle, LifecycleCoordinator, shutdown_signal};
    pub use crate::message::{
        HierarchicalMessageSource, Locale, MessageResolvable, MessageSource, StaticMessageSource,
    };
    pub use crate::registry::{
        Component, ComponentDefinition, ComponentKind, MemoryRegistry, Registry, RegistryProvider,
    };
}
