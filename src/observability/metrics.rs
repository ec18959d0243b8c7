//! Metrics collection and exposition.
//!
//! # Metrics
//! - `functions_runner_tx_submitted_total` (counter): transactions accepted by the node
//! - `functions_runner_receipt_polls_total` (counter): receipt queries
//! - `functions_runner_log_queries_total` (counter): `eth_getLogs` queries
//! - `functions_runner_rpc_failover_total` (counter): provider failovers, by operation
//! - `functions_runner_stage_failures_total` (counter): failed runs, by stage and error kind
//! - `functions_runner_workflow_duration_seconds` (histogram): run duration, by result
//!
//! Recording is a no-op until a recorder is installed.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_tx_submitted() {
    ::metrics::counter!("functions_runner_tx_submitted_total").increment(1);
}

pub fn record_receipt_poll() {
    ::metrics::counter!("functions_runner_receipt_polls_total").increment(1);
}

pub fn record_log_query() {
    ::metrics::counter!("functions_runner_log_queries_total").increment(1);
}

pub fn record_rpc_failover(op: &'static str) {
    ::metrics::counter!("functions_runner_rpc_failover_total", "op" => op).increment(1);
}

pub fn record_stage_failure(stage: &'static str, kind: &'static str) {
    ::metrics::counter!(
        "functions_runner_stage_failures_total",
        "stage" => stage,
        "kind" => kind
    )
    .increment(1);
}

pub fn record_workflow(result: &'static str, started: Instant) {
    ::metrics::histogram!("functions_runner_workflow_duration_seconds", "result" => result)
        .record(started.elapsed().as_secs_f64());
}
