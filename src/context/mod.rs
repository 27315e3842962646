//! Context Module
//!
//! The [`ApplicationContext`] hosts a component registry and drives it
//! through an ordered startup ("refresh") and a best-effort shutdown
//! ("close"), multicasting lifecycle events to listeners along the way.
//!
//! # Refresh Phases
//!
//! ```text
//!  1. PrepareRefresh                  flags, environment, early-event buffer
//!  2. ObtainRegistry                  ask the RegistryProvider
//!  3. PrepareRegistry                 context-aware injection, self references
//!  4. PostProcessRegistry             RefreshHooks::post_process_registry
//!  5. InvokeRegistryPostProcessors
//!  6. RegisterInstancePostProcessors
//!  7. InitMessageSource               "message_source" or a delegating default
//!  8. InitEventDispatcher             "event_dispatcher" or SimpleEventDispatcher
//!  9. OnRefresh                       RefreshHooks::on_refresh
//! 10. RegisterListeners               flush early events
//! 11. FinishRegistryInitialization    eager singletons, freeze
//! 12. FinishRefresh                   lifecycle start, ContextRefreshed
//! ```
//!
//! A failure from phase 4 on destroys every singleton created so far and
//! leaves the context inactive.
//!
//! # Hierarchy
//!
//! A child context holds a weak link to its parent. Events published on the
//! child are forwarded to the parent after local dispatch; messages and
//! components the child cannot resolve are looked up in the parent.

mod application;
mod aware;
mod builder;
mod hooks;
mod listeners;
mod messages;

pub use application::{Adopted, ApplicationContext};
pub use aware::ContextAware;
pub use builder::ContextBuilder;
pub use hooks::{NoopHooks, RefreshHooks, RefreshPhase};

/// Reserved name of the message source component
pub const MESSAGE_SOURCE: &str = "message_source";
/// Reserved name of the event dispatcher component
pub const EVENT_DISPATCHER: &str = "event_dispatcher";
/// Reserved name of the lifecycle coordinator component
pub const LIFECYCLE_COORDINATOR: &str = "lifecycle_coordinator";
/// Name under which the context registers its environment
pub const ENVIRONMENT: &str = "environment";
/// Name under which the context resolves itself (as a `Weak`)
pub const APPLICATION_CONTEXT: &str = "application_context";
