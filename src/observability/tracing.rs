//! Per-run tracing spans.
//!
//! Every workflow run gets a UUID v4 `run_id` so interleaved logs from
//! concurrent runs can be told apart.

use tracing::Span;
use uuid::Uuid;

/// Span covering one workflow run.
pub fn workflow_span(run_id: Uuid, subscription_id: u64) -> Span {
    tracing::info_span!("workflow", run_id = %run_id, subscription_id)
}

/// Span covering one stage of a run.
pub fn stage_span(stage: &'static str) -> Span {
    tracing::info_span!("stage", stage)
}
