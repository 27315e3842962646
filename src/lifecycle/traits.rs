//! Lifecycle callback traits
//!
//! These traits define the contract for components that take part in the
//! start/stop cycle of a context or need cleanup when they are destroyed.

/// A component with an explicit running state, started and stopped by the
/// context's lifecycle coordinator.
///
/// Callbacks receive `&self`; implementations keep their state behind
/// interior mutability.
///
/// # Example
///
/// ```rust,ignore
/// use meshestra_context::lifecycle::Lifecycle;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct QueueConsumer {
///     running: AtomicBool,
/// }
///
/// impl Lifecycle for QueueConsumer {
///     fn start(&self) -> anyhow::Result<()> {
///         tracing::info!("Subscribing to order queue");
///         self.running.store(true, Ordering::SeqCst);
///         Ok(())
///     }
///
///     fn stop(&self) -> anyhow::Result<()> {
///         self.running.store(false, Ordering::SeqCst);
///         Ok(())
///     }
///
///     fn is_running(&self) -> bool {
///         self.running.load(Ordering::SeqCst)
///     }
/// }
/// ```
pub trait Lifecycle: Send + Sync {
    fn start(&self) -> anyhow::Result<()>;

    fn stop(&self) -> anyhow::Result<()>;

    fn is_running(&self) -> bool;

    /// Lower phases start first and stop last
    fn phase(&self) -> i32 {
        0
    }

    /// Whether the component starts on refresh without an explicit `start()`
    fn is_auto_startup(&self) -> bool {
        true
    }
}

/// Called when the registry destroys the component
///
/// Use this hook to:
/// - Close connection pools
/// - Flush buffers
/// - Release file handles
///
/// Errors are logged by the registry; they never stop the destruction of
/// other components.
pub trait Disposable: Send + Sync {
    fn destroy(&self) -> anyhow::Result<()>;
}
