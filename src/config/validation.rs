//! Configuration validation.
//!
//! Serde handles syntax; this module checks what serde cannot: required
//! fields that are only known after env and CLI overrides, URL and address
//! formats, and non-zero durations. All problems are returned, not just the
//! first.

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::RunnerConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("`{field}` is not a valid URL: {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("`{field}` is not a valid address: {reason}")]
    InvalidAddress { field: &'static str, reason: String },

    #[error("`{0}` must be greater than zero")]
    Zero(&'static str),

    #[error("unknown log format `{0}` (expected \"pretty\" or \"json\")")]
    LogFormat(String),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &RunnerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rpc.rpc_url.trim().is_empty() {
        errors.push(ValidationError::Missing("rpc.rpc_url"));
    } else if let Err(e) = config.rpc.rpc_url.parse::<url::Url>() {
        errors.push(ValidationError::InvalidUrl {
            field: "rpc.rpc_url",
            reason: e.to_string(),
        });
    }

    for failover in &config.rpc.failover_urls {
        if let Err(e) = failover.parse::<url::Url>() {
            errors.push(ValidationError::InvalidUrl {
                field: "rpc.failover_urls",
                reason: e.to_string(),
            });
        }
    }

    if config.consumer.address.trim().is_empty() {
        errors.push(ValidationError::Missing("consumer.address"));
    } else if let Err(e) = config.consumer.address.trim().parse::<Address>() {
        errors.push(ValidationError::InvalidAddress {
            field: "consumer.address",
            reason: e.to_string(),
        });
    }

    if config.consumer.subscription_id.is_none() {
        errors.push(ValidationError::Missing("consumer.subscription_id"));
    }

    let durations = [
        ("rpc.rpc_timeout_secs", config.rpc.rpc_timeout_secs),
        ("workflow.gas_limit", config.workflow.gas_limit),
        ("workflow.receipt_timeout_secs", config.workflow.receipt_timeout_secs),
        ("workflow.receipt_poll_interval_secs", config.workflow.receipt_poll_interval_secs),
        ("workflow.event_timeout_secs", config.workflow.event_timeout_secs),
        ("workflow.event_poll_interval_secs", config.workflow.event_poll_interval_secs),
    ];
    for (field, value) in durations {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::LogFormat(
            config.observability.log_format.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
