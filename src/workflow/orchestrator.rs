//! Workflow state machine.
//!
//! ```text
//! INIT → SUBMIT_CONFIG → CONFIRM_CONFIG → SUBMIT_REQUEST → CONFIRM_REQUEST → WAIT_EVENT → DONE
//!            └──────────────┴──────────────────┴──────────────────┴──────────────┴──→ FAILED(stage)
//! ```
//!
//! Stages run strictly in order. Each submit fetches a fresh nonce and fee
//! quote; each confirm waits with its own timeout; the event wait is
//! anchored at the request receipt's block. A reverted receipt stops the
//! machine. Every fault ends as `Outcome::Failed`, never as a panic or an
//! error returned to the caller.

use alloy::primitives::{Address, Bytes, TxHash};
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::fees::FeeEstimator;
use crate::blockchain::transaction::{wait_for_receipt, TxBuilder};
use crate::blockchain::types::{BlockchainError, BlockchainResult, ChainId, Receipt};
use crate::blockchain::wallet::Wallet;
use crate::config::RunnerConfig;
use crate::functions::contract::{request_id_from_receipt, send_request_calldata, set_source_calldata};
use crate::functions::correlator::ResponseCorrelator;
use crate::lifecycle::ShutdownSignal;
use crate::observability::{metrics, tracing::stage_span, tracing::workflow_span};
use crate::resilience::polling::PollPolicy;
use crate::workflow::outcome::{Completion, Failure, Outcome, Stage};

/// Chain, RPC handle, and credential for a run. Immutable once built.
#[derive(Debug, Clone)]
pub struct ChainContext<R> {
    rpc: R,
    chain_id: ChainId,
    wallet: Wallet,
}

impl<R: ChainRpc> ChainContext<R> {
    /// Check the endpoint's chain id and bind the context to it.
    pub async fn connect(rpc: R, wallet: Wallet, expected_chain_id: u64) -> BlockchainResult<Self> {
        let actual = rpc.chain_id().await?;
        if actual != expected_chain_id {
            return Err(BlockchainError::ChainMismatch {
                expected: expected_chain_id,
                actual,
            });
        }

        tracing::info!(chain_id = actual, address = %wallet.address(), "Chain identity verified");
        Ok(Self {
            rpc,
            chain_id: ChainId(actual),
            wallet,
        })
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

/// Per-run constants derived from the configuration.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub consumer: Address,
    pub gas_limit: u64,
    pub receipt_policy: PollPolicy,
    pub event_policy: PollPolicy,
    pub fees: FeeEstimator,
    /// Overall bound on a run, on top of the per-stage timeouts.
    pub max_run: Option<Duration>,
}

impl WorkflowSettings {
    pub fn from_config(config: &RunnerConfig) -> BlockchainResult<Self> {
        let consumer = config.consumer.address.trim().parse::<Address>().map_err(|e| {
            BlockchainError::Config(format!(
                "Invalid consumer address '{}': {}",
                config.consumer.address, e
            ))
        })?;

        let workflow = &config.workflow;
        Ok(Self {
            consumer,
            gas_limit: workflow.gas_limit,
            receipt_policy: PollPolicy::from_secs(
                workflow.receipt_timeout_secs,
                workflow.receipt_poll_interval_secs,
            ),
            event_policy: PollPolicy::from_secs(
                workflow.event_timeout_secs,
                workflow.event_poll_interval_secs,
            ),
            fees: FeeEstimator::from_config(&config.fees),
            max_run: (workflow.max_run_secs > 0)
                .then(|| Duration::from_secs(workflow.max_run_secs)),
        })
    }
}

/// Drives one consumer through `setSource` → `sendRequest` → `Response`.
pub struct WorkflowRunner<R> {
    ctx: ChainContext<R>,
    settings: WorkflowSettings,
    builder: TxBuilder,
    correlator: ResponseCorrelator,
    signal: ShutdownSignal,
}

impl<R: ChainRpc> WorkflowRunner<R> {
    pub fn new(ctx: ChainContext<R>, settings: WorkflowSettings) -> Self {
        let builder = TxBuilder::new(
            ctx.wallet.clone(),
            settings.fees,
            ctx.chain_id.0,
            settings.gas_limit,
        );
        let correlator = ResponseCorrelator::new(settings.consumer, settings.event_policy);
        Self {
            ctx,
            settings,
            builder,
            correlator,
            signal: ShutdownSignal::never(),
        }
    }

    /// Cancel polling when `signal` fires.
    pub fn with_signal(mut self, signal: ShutdownSignal) -> Self {
        self.signal = signal;
        self
    }

    pub fn context(&self) -> &ChainContext<R> {
        &self.ctx
    }

    /// Run the whole workflow and report how it ended.
    pub async fn run_workflow(
        &self,
        config_payload: &str,
        request_args: &[String],
        subscription_id: u64,
    ) -> Outcome {
        let run_id = Uuid::new_v4();
        let started = std::time::Instant::now();
        let signal = match self.settings.max_run {
            Some(limit) => self
                .signal
                .clone()
                .with_deadline(tokio::time::Instant::now() + limit),
            None => self.signal.clone(),
        };

        let outcome = match self
            .execute(config_payload, request_args, subscription_id, &signal)
            .instrument(workflow_span(run_id, subscription_id))
            .await
        {
            Ok(completion) => Outcome::Completed(completion),
            Err(failure) => Outcome::Failed(failure),
        };

        match &outcome {
            Outcome::Completed(c) => {
                tracing::info!(
                    %run_id,
                    request_id = %c.event.request_id,
                    ok = c.is_success(),
                    "Workflow done"
                );
                metrics::record_workflow("done", started);
            }
            Outcome::Failed(f) => {
                tracing::error!(
                    %run_id,
                    state = %outcome.terminal_state(),
                    kind = f.kind,
                    error = %f.detail,
                    "Workflow failed"
                );
                metrics::record_stage_failure(f.stage.as_str(), f.kind);
                metrics::record_workflow("failed", started);
            }
        }
        outcome
    }

    async fn execute(
        &self,
        config_payload: &str,
        request_args: &[String],
        subscription_id: u64,
        signal: &ShutdownSignal,
    ) -> Result<Completion, Failure> {
        // SUBMIT_CONFIG → CONFIRM_CONFIG
        let config_tx = self
            .submit(Stage::SubmitConfig, set_source_calldata(config_payload))
            .await
            .map_err(|e| Failure::new(Stage::SubmitConfig, e, None))?;

        self.confirm(Stage::ConfirmConfig, config_tx, signal)
            .await
            .map_err(|e| Failure::new(Stage::ConfirmConfig, e, Some(config_tx)))?;

        // SUBMIT_REQUEST → CONFIRM_REQUEST, with a nonce read after the
        // config transaction landed.
        let request_tx = self
            .submit(
                Stage::SubmitRequest,
                send_request_calldata(subscription_id, request_args),
            )
            .await
            .map_err(|e| {
                Failure::new(Stage::SubmitRequest, e, None).with_config_tx(Some(config_tx))
            })?;

        let request_receipt = self
            .confirm(Stage::ConfirmRequest, request_tx, signal)
            .await
            .map_err(|e| {
                Failure::new(Stage::ConfirmRequest, e, Some(request_tx))
                    .with_config_tx(Some(config_tx))
            })?;

        // WAIT_EVENT
        let request_id = request_id_from_receipt(&request_receipt, self.settings.consumer);
        let event = self
            .correlator
            .wait(self.ctx.rpc(), request_receipt.block_number, request_id, signal)
            .instrument(stage_span(Stage::WaitEvent.as_str()))
            .await
            .map_err(|e| {
                Failure::new(Stage::WaitEvent, e, Some(request_tx)).with_config_tx(Some(config_tx))
            })?;

        Ok(Completion {
            config_tx_hash: config_tx,
            request_tx_hash: request_tx,
            event,
        })
    }

    async fn submit(&self, stage: Stage, input: Bytes) -> BlockchainResult<TxHash> {
        async {
            tracing::info!(state = stage.as_str(), to = %self.settings.consumer, "Submitting transaction");
            let signed = self
                .builder
                .send_call(self.ctx.rpc(), self.settings.consumer, input)
                .await?;
            Ok::<_, BlockchainError>(signed.hash())
        }
        .instrument(stage_span(stage.as_str()))
        .await
    }

    /// Wait for the receipt and turn a revert into an error.
    async fn confirm(
        &self,
        stage: Stage,
        tx_hash: TxHash,
        signal: &ShutdownSignal,
    ) -> BlockchainResult<Receipt> {
        async {
            let receipt =
                wait_for_receipt(self.ctx.rpc(), tx_hash, self.settings.receipt_policy, signal)
                    .await?;
            if !receipt.success {
                return Err(BlockchainError::Reverted {
                    tx_hash,
                    block_number: receipt.block_number,
                });
            }
            Ok::<_, BlockchainError>(receipt)
        }
        .instrument(stage_span(stage.as_str()))
        .await
    }
}
