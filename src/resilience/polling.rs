//! Bounded sleep-then-retry loop shared by the receipt and event waits.
//!
//! Each attempt reports `Ok(Some(_))` when done, `Ok(None)` when the thing
//! being waited for is not there yet, and `Err(_)` for a fatal failure. The
//! timeout is measured from loop entry on tokio's clock, so tests can run
//! with a paused clock.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::lifecycle::ShutdownSignal;

/// Timeout and interval for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn from_secs(timeout_secs: u64, interval_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            interval: Duration::from_secs(interval_secs),
        }
    }
}

/// Why a poll loop stopped without a value.
#[derive(Debug, PartialEq, Eq)]
pub enum PollError<E> {
    TimedOut { attempts: u32 },
    Cancelled,
    Fatal(E),
}

/// Run `attempt` until it yields a value, fails, times out, or `signal` fires.
pub async fn poll_until<T, E, F, Fut>(
    policy: PollPolicy,
    signal: &ShutdownSignal,
    mut attempt: F,
) -> Result<T, PollError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        if signal.is_triggered() {
            return Err(PollError::Cancelled);
        }

        attempts += 1;
        match attempt().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {}
            Err(e) => return Err(PollError::Fatal(e)),
        }

        let elapsed = start.elapsed();
        if elapsed >= policy.timeout {
            return Err(PollError::TimedOut { attempts });
        }

        // The last attempt lands on the deadline, not past it.
        let pause = policy.interval.min(policy.timeout - elapsed);
        tokio::select! {
            _ = tokio::time::sleep(pause) => {}
            _ = signal.triggered() => return Err(PollError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Shutdown;
    use std::cell::Cell;

    #[tokio::test(start_paused = true)]
    async fn test_returns_first_value() {
        let calls = Cell::new(0);
        let result: Result<u32, PollError<()>> =
            poll_until(PollPolicy::from_secs(60, 2), &ShutdownSignal::never(), || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move { Ok((n == 4).then_some(n)) }
            })
            .await;
        assert_eq!(result, Ok(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_from_loop_entry() {
        let start = Instant::now();
        let result: Result<(), PollError<()>> =
            poll_until(PollPolicy::from_secs(10, 2), &ShutdownSignal::never(), || async {
                Ok(None)
            })
            .await;
        // Attempts at t=0,2,4,6,8,10
        assert_eq!(result, Err(PollError::TimedOut { attempts: 6 }));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_sleep_is_capped_at_deadline() {
        let start = Instant::now();
        let result: Result<(), PollError<()>> =
            poll_until(PollPolicy::from_secs(10, 4), &ShutdownSignal::never(), || async {
                Ok(None)
            })
            .await;
        // Attempts at t=0,4,8,10
        assert_eq!(result, Err(PollError::TimedOut { attempts: 4 }));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_stops_immediately() {
        let result: Result<(), PollError<&str>> =
            poll_until(PollPolicy::from_secs(10, 2), &ShutdownSignal::never(), || async {
                Err("boom")
            })
            .await;
        assert_eq!(result, Err(PollError::Fatal("boom")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_sleep() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        let start = Instant::now();

        let trigger = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            shutdown.trigger();
        };
        let poll = poll_until::<(), (), _, _>(PollPolicy::from_secs(600, 30), &signal, || async {
            Ok(None)
        });

        let (_, result) = tokio::join!(trigger, poll);
        assert_eq!(result, Err(PollError::Cancelled));
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }
}
