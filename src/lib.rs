//! Chainlink Functions request runner.
//!
//! Publishes a Functions source to a consumer contract, sends a request,
//! and waits for the matching `Response` event, reporting one structured
//! [`Outcome`](workflow::Outcome) per run.

pub mod blockchain;
pub mod config;
pub mod functions;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod workflow;

pub use config::RunnerConfig;
pub use lifecycle::Shutdown;
pub use workflow::{Outcome, WorkflowRunner};
