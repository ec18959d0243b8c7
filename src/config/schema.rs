//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the runner.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Sepolia testnet chain id.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Root configuration for the Functions request runner.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RunnerConfig {
    /// JSON-RPC connection settings.
    pub rpc: RpcConfig,

    /// Consumer contract and subscription.
    pub consumer: ConsumerConfig,

    /// Stage timeouts and poll intervals.
    pub workflow: WorkflowConfig,

    /// Fee estimation constants.
    pub fees: FeeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// JSON-RPC connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs.
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID the endpoint must report (11155111 for Sepolia).
    pub expected_chain_id: u64,

    /// Per-call RPC timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            failover_urls: Vec::new(),
            expected_chain_id: SEPOLIA_CHAIN_ID,
            rpc_timeout_secs: 30,
        }
    }
}

/// Consumer contract configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Address of the Functions consumer contract.
    pub address: String,

    /// Billing subscription id passed to `sendRequest`.
    pub subscription_id: Option<u64>,

    /// Path of the JavaScript source published with `setSource`.
    pub source_path: String,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            subscription_id: None,
            source_path: "functions/source.js".to_string(),
        }
    }
}

/// Workflow timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Gas limit used for both transactions.
    pub gas_limit: u64,

    /// Maximum wait for each transaction receipt, in seconds.
    pub receipt_timeout_secs: u64,

    /// Delay between receipt queries, in seconds.
    pub receipt_poll_interval_secs: u64,

    /// Maximum wait for the `Response` event, in seconds.
    pub event_timeout_secs: u64,

    /// Delay between log queries, in seconds.
    pub event_poll_interval_secs: u64,

    /// Overall run deadline in seconds (0 disables it).
    pub max_run_secs: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            gas_limit: 700_000,
            receipt_timeout_secs: 300,
            receipt_poll_interval_secs: 2,
            event_timeout_secs: 600,
            event_poll_interval_secs: 3,
            max_run_secs: 0,
        }
    }
}

/// Fee estimation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Base price used when the node's gas price cannot be read, in gwei.
    pub fallback_gas_price_gwei: u64,

    /// Fixed priority fee, in gwei.
    pub priority_fee_gwei: u64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            fallback_gas_price_gwei: 10,
            priority_fee_gwei: 1,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
