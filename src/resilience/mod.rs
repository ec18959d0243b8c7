//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Waiting on the chain:
//!     → polling.rs (query, sleep a fixed interval, re-query)
//!     → stops on value, fatal error, timeout, or cancellation
//! Per-call bounds:
//!     → timeouts.rs (every RPC call has a deadline)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every wait has its own bound
//! - "Not there yet" is a value, not an error
//! - Cancellation is checked at every iteration boundary

pub mod polling;
pub mod timeouts;

pub use polling::{poll_until, PollError, PollPolicy};
