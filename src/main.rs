//! Chainlink Functions request runner.
//!
//! # Architecture Overview
//!
//! ```text
//!   runner.toml / env / flags        functions/source.js      -- args
//!              │                              │                  │
//!              ▼                              ▼                  ▼
//!      ┌──────────────┐   ┌───────────────────────────────────────────────┐
//!      │    config    │──▶│                   workflow                     │
//!      └──────────────┘   │  SUBMIT_CONFIG → CONFIRM_CONFIG →              │
//!      ┌──────────────┐   │  SUBMIT_REQUEST → CONFIRM_REQUEST → WAIT_EVENT │
//!      │  lifecycle   │──▶└───────┬──────────────────────────────┬────────┘
//!      │ startup/sigs │           │                              │
//!      └──────────────┘           ▼                              ▼
//!                     ┌──────────────────────┐        ┌─────────────────────┐
//!                     │      blockchain      │        │      functions      │
//!                     │ wallet/fees/tx/client│◀───────│ contract/correlator │
//!                     └──────────┬───────────┘        └─────────────────────┘
//!                                ▼
//!                          JSON-RPC node(s)
//!
//!   stdout: exactly one JSON result line        stderr: structured logs
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use functions_runner::blockchain::{BlockchainError, Wallet};
use functions_runner::config::{self, ObservabilityConfig, RunnerConfig};
use functions_runner::lifecycle::{self, signals, Shutdown};
use functions_runner::observability::{logging, metrics};
use functions_runner::workflow::{render, Outcome};

#[derive(Parser, Debug)]
#[command(name = "functions-runner")]
#[command(about = "Publish a Functions source, send a request, and wait for its response")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JavaScript source published with setSource.
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Billing subscription id.
    #[arg(long)]
    subscription_id: Option<u64>,

    /// Consumer contract address.
    #[arg(long)]
    consumer: Option<String>,

    /// JSON-RPC endpoint.
    #[arg(long)]
    rpc_url: Option<String>,

    /// Request arguments, passed after `--`.
    #[arg(last = true)]
    args: Vec<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut RunnerConfig) {
        if let Some(source) = &self.source {
            config.consumer.source_path = source.display().to_string();
        }
        if let Some(id) = self.subscription_id {
            config.consumer.subscription_id = Some(id);
        }
        if let Some(consumer) = &self.consumer {
            config.consumer.address = consumer.clone();
        }
        if let Some(url) = &self.rpc_url {
            config.rpc.rpc_url = url.clone();
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match prepare_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            return emit(&Outcome::startup_failure(BlockchainError::Config(e.to_string())));
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("functions-runner v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let outcome = run(&cli, &config).await;
    emit(&outcome)
}

fn prepare_config(cli: &Cli) -> Result<RunnerConfig, config::ConfigError> {
    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config::validate_config(&config).map_err(config::ConfigError::Validation)?;
    Ok(config)
}

async fn run(cli: &Cli, config: &RunnerConfig) -> Outcome {
    let Some(subscription_id) = config.consumer.subscription_id else {
        return Outcome::startup_failure(BlockchainError::Config(
            "Missing subscription id".to_string(),
        ));
    };

    let source = match tokio::fs::read_to_string(&config.consumer.source_path).await {
        Ok(source) => source,
        Err(e) => {
            return Outcome::startup_failure(BlockchainError::Config(format!(
                "Cannot read {}: {}",
                config.consumer.source_path, e
            )))
        }
    };

    let wallet = match Wallet::from_env() {
        Ok(wallet) => wallet,
        Err(e) => return Outcome::startup_failure(e),
    };

    let runner = match lifecycle::connect(config, wallet).await {
        Ok(runner) => runner,
        Err(e) => return Outcome::startup_failure(e),
    };

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());
    let runner = runner.with_signal(shutdown.signal());

    tracing::info!(
        consumer = %config.consumer.address,
        source_bytes = source.len(),
        args = cli.args.len(),
        "Starting workflow"
    );
    runner.run_workflow(&source, &cli.args, subscription_id).await
}

/// Print the result line and map the outcome to the process exit code.
fn emit(outcome: &Outcome) -> ExitCode {
    match render(outcome) {
        Ok(line) => println!("{line}"),
        Err(e) => {
            eprintln!("failed to serialize outcome: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::from(outcome.exit_code())
}
