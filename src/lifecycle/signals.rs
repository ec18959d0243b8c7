//! OS signal handling.
//!
//! SIGINT and SIGTERM cancel the running workflow. The polling loops notice
//! at their next iteration boundary and the run ends with a `Cancelled`
//! outcome instead of hanging until its timeouts.

use std::sync::Arc;

use crate::lifecycle::shutdown::Shutdown;

/// Spawn a task that triggers `shutdown` on the first SIGINT or SIGTERM.
pub fn spawn_signal_handler(shutdown: Arc<Shutdown>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        wait_for_signal().await;
        tracing::warn!("Termination signal received, cancelling workflow");
        shutdown.trigger();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
