//! Cooperative cancellation for a workflow run.

use std::future::pending;
use tokio::sync::watch;
use tokio::time::Instant;

/// Coordinator for cancelling in-flight runs.
///
/// Level-triggered: a signal created after `trigger` still observes it.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Get a signal that polling loops can check and await.
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: Some(self.tx.subscribe()),
            deadline: None,
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Whether `trigger` has been called.
    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`], optionally bounded by a deadline.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self {
            rx: None,
            deadline: None,
        }
    }

    /// Also fire once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Non-blocking check, used at every poll iteration boundary.
    pub fn is_triggered(&self) -> bool {
        let cancelled = self.rx.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        cancelled || expired
    }

    /// Resolve once the signal fires.
    pub async fn triggered(&self) {
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => pending::<()>().await,
            }
        };

        let flag = async {
            let Some(rx) = &self.rx else {
                return pending::<()>().await;
            };
            let mut rx = rx.clone();
            // Sender dropped without triggering: never fires.
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                pending::<()>().await;
            }
        };

        tokio::select! {
            _ = deadline => {}
            _ = flag => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_is_level() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let signal = shutdown.signal();
        assert!(shutdown.is_triggered());
        assert!(signal.is_triggered());
        signal.triggered().await;
    }

    #[tokio::test]
    async fn test_never_signal() {
        let signal = ShutdownSignal::never();
        assert!(!signal.is_triggered());
        let result = tokio::time::timeout(Duration::from_millis(10), signal.triggered()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let signal = ShutdownSignal::never().with_deadline(Instant::now() + Duration::from_secs(60));
        assert!(!signal.is_triggered());
        signal.triggered().await;
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_trigger_wakes_waiter() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        let waiter = tokio::spawn(async move { signal.triggered().await });
        shutdown.trigger();
        waiter.await.unwrap();
    }
}
