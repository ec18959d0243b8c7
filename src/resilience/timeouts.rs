//! Per-call timeout enforcement.
//!
//! Wraps a single RPC future so that a hung endpoint surfaces as a distinct
//! `TimedOut` case instead of blocking the caller. There is no preemption
//! beyond this: a call is either answered or abandoned at its deadline.

use std::future::Future;
use std::time::Duration;

/// Result of one bounded call.
#[derive(Debug, PartialEq, Eq)]
pub enum Bounded<T, E> {
    Done(T),
    Failed(E),
    TimedOut,
}

/// Run `fut` with a deadline of `limit`.
pub async fn bounded<T, E, F>(limit: Duration, fut: F) -> Bounded<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Bounded::Done(value),
        Ok(Err(e)) => Bounded::Failed(e),
        Err(_) => Bounded::TimedOut,
    }
}
