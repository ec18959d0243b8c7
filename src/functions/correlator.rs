//! Correlation of the asynchronous `Response` event with a sent request.
//!
//! # Responsibilities
//! - Poll `[start_block, latest]` for `Response` logs from the consumer
//! - Re-read `latest` on every iteration
//! - Treat log-query failures as an empty result
//! - Decode the first matching entry and classify its error payload

use alloy::hex;
use alloy::primitives::{Address, Bytes, TxHash, B256};
use alloy::sol_types::SolEvent;
use std::convert::Infallible;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{BlockchainError, BlockchainResult, LogEntry};
use crate::functions::contract::Response;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::resilience::polling::{poll_until, PollError, PollPolicy};

/// Error payloads that mean "no error". Kept as literals on purpose: these
/// are the only zero encodings consumers are known to emit.
pub const NO_ERROR_SENTINELS: [&str; 3] = ["0x", "0x00", "0x0000"];

/// Lowercase `0x`-prefixed hex of an error payload.
pub fn normalize_error_hex(err: &[u8]) -> String {
    format!("0x{}", hex::encode(err))
}

/// Whether a normalized error payload is one of the no-error sentinels.
pub fn is_no_error(err_hex: &str) -> bool {
    NO_ERROR_SENTINELS.contains(&err_hex)
}

/// A decoded `Response` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelatedEvent {
    pub request_id: B256,
    pub response: String,
    pub error: Bytes,
    pub block_number: Option<u64>,
    pub tx_hash: Option<TxHash>,
}

impl CorrelatedEvent {
    pub fn error_hex(&self) -> String {
        normalize_error_hex(&self.error)
    }

    /// The request completed without an application-level error.
    pub fn is_success(&self) -> bool {
        is_no_error(&self.error_hex())
    }
}

/// Waits for the consumer's `Response` event.
#[derive(Debug, Clone, Copy)]
pub struct ResponseCorrelator {
    consumer: Address,
    policy: PollPolicy,
}

impl ResponseCorrelator {
    pub fn new(consumer: Address, policy: PollPolicy) -> Self {
        Self { consumer, policy }
    }

    /// Poll until a matching `Response` is found at or after `start_block`.
    ///
    /// With `request_id` set, only events for that id match.
    pub async fn wait<R: ChainRpc + ?Sized>(
        &self,
        rpc: &R,
        start_block: u64,
        request_id: Option<B256>,
        signal: &ShutdownSignal,
    ) -> BlockchainResult<CorrelatedEvent> {
        tracing::info!(
            consumer = %self.consumer,
            start_block,
            request_id = ?request_id,
            timeout_secs = self.policy.timeout.as_secs(),
            "Waiting for Response event"
        );

        let result = poll_until(self.policy, signal, || {
            self.poll_once(rpc, start_block, request_id)
        })
        .await;

        match result {
            Ok(event) => {
                tracing::info!(
                    request_id = %event.request_id,
                    block_number = ?event.block_number,
                    success = event.is_success(),
                    "Response event received"
                );
                Ok(event)
            }
            Err(PollError::Fatal(never)) => match never {},
            Err(PollError::TimedOut { attempts }) => {
                tracing::warn!(attempts, start_block, "Timed out waiting for Response event");
                Err(BlockchainError::Timeout {
                    what: "Response event",
                    secs: self.policy.timeout.as_secs(),
                    tx_hash: None,
                })
            }
            Err(PollError::Cancelled) => Err(BlockchainError::Cancelled("Response event")),
        }
    }

    async fn poll_once<R: ChainRpc + ?Sized>(
        &self,
        rpc: &R,
        start_block: u64,
        request_id: Option<B256>,
    ) -> Result<Option<CorrelatedEvent>, Infallible> {
        let latest = match rpc.block_number().await {
            Ok(latest) => latest,
            Err(e) => {
                tracing::warn!(error = %e, "Block number query failed, retrying");
                return Ok(None);
            }
        };

        // A lagging node may not have seen the anchor block yet.
        if latest < start_block {
            tracing::debug!(latest, start_block, "Node behind anchor block");
            return Ok(None);
        }

        metrics::record_log_query();
        let logs = match rpc
            .logs(self.consumer, Response::SIGNATURE_HASH, start_block, latest)
            .await
        {
            Ok(logs) => logs,
            Err(e) => {
                tracing::warn!(error = %e, from_block = start_block, to_block = latest, "Log query failed, retrying");
                Vec::new()
            }
        };

        tracing::debug!(from_block = start_block, to_block = latest, logs = logs.len(), "Log query");
        Ok(self.first_match(&logs, request_id))
    }

    /// First entry that is really ours and decodes.
    fn first_match(&self, logs: &[LogEntry], request_id: Option<B256>) -> Option<CorrelatedEvent> {
        logs.iter()
            .filter(|log| log.address == self.consumer)
            .filter(|log| log.topic0() == Some(&Response::SIGNATURE_HASH))
            .filter(|log| match request_id {
                Some(id) => log.topics.get(1) == Some(&id),
                None => true,
            })
            .find_map(|log| match decode_response(log) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        tx_hash = ?log.transaction_hash,
                        "Skipping undecodable Response log"
                    );
                    None
                }
            })
    }
}

fn decode_response(log: &LogEntry) -> Result<CorrelatedEvent, alloy::sol_types::Error> {
    let event = Response::decode_raw_log(log.topics.iter().copied(), &log.data)?;
    Ok(CorrelatedEvent {
        request_id: event.requestId,
        response: event.response,
        error: event.err,
        block_number: log.block_number,
        tx_hash: log.transaction_hash,
    })
}
