//! Workflow orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! run_workflow(source, args, subscription id)
//!     → orchestrator.rs (state machine over blockchain/ and functions/)
//!     → outcome.rs (Completed | Failed(stage))
//!     → report.rs (one JSON line for the caller)
//! ```

pub mod orchestrator;
pub mod outcome;
pub mod report;

pub use orchestrator::{ChainContext, WorkflowRunner, WorkflowSettings};
pub use outcome::{Completion, Failure, Outcome, Stage};
pub use report::{render, ReportLine};
