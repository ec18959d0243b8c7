//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Build wallet → Connect RPC → Verify chain id → ChainContext
//!
//! Cancellation (shutdown.rs):
//!     Shutdown::trigger / run deadline → ShutdownSignal observed by poll loops
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal and reported before any transaction
//! - Cancellation is cooperative; an in-flight RPC call is never interrupted

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::connect;
