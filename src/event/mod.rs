//! Event Module
//!
//! In-process, synchronous publish/subscribe used by the application context.
//!
//! Values published through a context are wrapped in an [`ApplicationEvent`]
//! envelope. Each envelope has a resolved [`EventType`] that listeners match
//! against; the [`EventDispatcher`] invokes every matching listener on the
//! publishing thread, in registration order.
//!
//! # Example
//!
//! ```rust,ignore
//! use meshestra_context::event::{listener, ContextEvent};
//!
//! context.add_listener(listener::on_context(ContextEvent::Refreshed, |event| {
//!     tracing::info!("context {} refreshed", event.source());
//!     Ok(())
//! }));
//!
//! context.add_listener(listener::on_payload::<OrderPlaced, _>(|_, order| {
//!     tracing::info!("order {} placed", order.id);
//!     Ok(())
//! }));
//! ```

mod dispatcher;
pub mod listener;
mod types;

pub use dispatcher::{ErrorHandler, EventDispatcher, SimpleEventDispatcher};
pub use listener::{ApplicationListener, ListenerSet};
pub use types::{ApplicationEvent, ContextEvent, EventBody, EventType};
