//! Lifecycle Module
//!
//! Start/stop callbacks for managed components and the graceful shutdown
//! hook of a context.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. refresh()
//!    ↓
//! 2. Eager singletons created
//!    ↓
//! 3. Lifecycle::start (ascending phase)   ← auto-startup components
//!    ↓
//! 4. ContextRefreshed published
//!    ↓
//! [Running...]
//!    ↓
//! 5. Shutdown Signal (SIGTERM/SIGINT) or close()
//!    ↓
//! 6. ContextClosed published
//!    ↓
//! 7. Lifecycle::stop (descending phase)
//!    ↓
//! 8. Disposable::destroy (reverse creation order)
//! ```

mod coordinator;
mod shutdown;
mod traits;

pub use coordinator::{DefaultLifecycleCoordinator, LifecycleCoordinator};
pub use shutdown::{ShutdownHook, shutdown_signal};
pub use traits::{Disposable, Lifecycle};
