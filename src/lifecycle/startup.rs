//! Startup orchestration.
//!
//! Builds everything a run needs, in dependency order, and fails fast:
//! settings → RPC client → chain identity check → runner. A wrong chain id
//! is fatal here and never becomes a per-stage failure.

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::BlockchainResult;
use crate::blockchain::wallet::Wallet;
use crate::config::RunnerConfig;
use crate::workflow::orchestrator::{ChainContext, WorkflowRunner, WorkflowSettings};

/// Connect to the configured endpoint and return a ready runner.
pub async fn connect(
    config: &RunnerConfig,
    wallet: Wallet,
) -> BlockchainResult<WorkflowRunner<BlockchainClient>> {
    let settings = WorkflowSettings::from_config(config)?;
    let client = BlockchainClient::connect(config.rpc.clone())?;
    tracing::debug!(client = ?client, "Verifying chain identity");

    let ctx = ChainContext::connect(client, wallet, config.rpc.expected_chain_id).await?;
    Ok(WorkflowRunner::new(ctx, settings))
}
