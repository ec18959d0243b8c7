//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RunnerConfig;
use crate::config::validation::ValidationError;

/// Environment variable carrying the RPC endpoint.
pub const RPC_URL_ENV_VAR: &str = "SEPOLIA_RPC_URL";
/// Environment variable carrying the consumer contract address.
pub const CONSUMER_ADDRESS_ENV_VAR: &str = "CONSUMER_ADDRESS";
/// Environment variable carrying the subscription id.
pub const SUBSCRIPTION_ID_ENV_VAR: &str = "SUBSCRIPTION_ID";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, then apply environment
/// overrides. Validation is left to the caller so CLI flags can still be
/// merged in.
pub fn load_config(path: Option<&Path>) -> Result<RunnerConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RunnerConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Overlay non-empty environment values on top of `config`.
pub fn apply_env_overrides<F>(config: &mut RunnerConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    if let Some(url) = get(RPC_URL_ENV_VAR) {
        config.rpc.rpc_url = url;
    }
    if let Some(address) = get(CONSUMER_ADDRESS_ENV_VAR) {
        config.consumer.address = address;
    }
    if let Some(raw) = get(SUBSCRIPTION_ID_ENV_VAR) {
        let id = raw.parse::<u64>().map_err(|e| ConfigError::Env {
            var: SUBSCRIPTION_ID_ENV_VAR,
            reason: e.to_string(),
        })?;
        config.consumer.subscription_id = Some(id);
    }

    Ok(())
}
