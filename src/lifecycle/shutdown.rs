//! Graceful Shutdown Hook
//!
//! Waits for a shutdown trigger (by default SIGTERM or Ctrl+C) on the Tokio
//! runtime and then closes a context on a blocking thread.

use crate::error::{ContextError, Result};
use std::future::Future;
use tokio::runtime::Handle;
use tokio::signal;
use tokio::task::JoinHandle;

/// Handle to an installed shutdown hook
///
/// Dropping the handle leaves the hook installed; [`ShutdownHook::remove`]
/// uninstalls it.
#[derive(Debug)]
pub struct ShutdownHook {
    handle: JoinHandle<()>,
}

impl ShutdownHook {
    /// Spawn a task on the current runtime that runs `on_trigger` on a
    /// blocking thread once `trigger` completes.
    pub(crate) fn spawn<F, C>(trigger: F, on_trigger: C) -> Result<Self>
    where
        F: Future<Output = ()> + Send + 'static,
        C: FnOnce() + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| {
            ContextError::illegal_state("Shutdown hook requires a running Tokio runtime")
        })?;

        let handle = runtime.spawn(async move {
            trigger.await;
            tracing::info!("Starting graceful shutdown...");
            if let Err(e) = tokio::task::spawn_blocking(on_trigger).await {
                tracing::error!("Error during graceful shutdown: {}", e);
            }
            tracing::info!("Graceful shutdown complete");
        });
        Ok(Self { handle })
    }

    /// Whether the hook has already fired (or was removed)
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Uninstall the hook. A hook that is already running keeps running.
    pub(crate) fn remove(self) {
        self.handle.abort();
    }
}

/// Create a future that completes when a shutdown signal is received
///
/// # Example
///
/// ```rust,ignore
/// use meshestra_context::lifecycle::shutdown_signal;
///
/// tokio::select! {
///     _ = shutdown_signal() => {
///         tracing::info!("Shutdown signal received");
///     }
///     _ = server.serve() => {}
/// }
/// ```
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::oneshot;

    #[test]
    fn test_requires_runtime() {
        let err = ShutdownHook::spawn(async {}, || {}).unwrap_err();
        assert!(err.is_illegal_state());
    }

    #[tokio::test]
    async fn test_runs_callback_on_trigger() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let (tx, rx) = oneshot::channel::<()>();

        let hook = ShutdownHook::spawn(
            async move {
                let _ = rx.await;
            },
            move || flag.store(true, Ordering::SeqCst),
        )
        .unwrap();

        tx.send(()).unwrap();
        hook.handle.await.unwrap();
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_removed_hook_never_fires() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let (tx, rx) = oneshot::channel::<()>();

        let hook = ShutdownHook::spawn(
            async move {
                let _ = rx.await;
            },
            move || flag.store(true, Ordering::SeqCst),
        )
        .unwrap();

        hook.remove();
        tokio::task::yield_now().await;
        let _ = tx.send(());
        tokio::task::yield_now().await;
        assert!(!fired.load(Ordering::SeqCst));
    }
}
