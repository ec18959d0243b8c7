//! Workflow states and the result of a run.

use alloy::primitives::TxHash;
use std::fmt;

use crate::blockchain::types::BlockchainError;
use crate::functions::correlator::CorrelatedEvent;

/// Non-terminal states of the workflow state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Init,
    SubmitConfig,
    ConfirmConfig,
    SubmitRequest,
    ConfirmRequest,
    WaitEvent,
}

impl Stage {
    /// State machine name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::SubmitConfig => "SUBMIT_CONFIG",
            Self::ConfirmConfig => "CONFIRM_CONFIG",
            Self::SubmitRequest => "SUBMIT_REQUEST",
            Self::ConfirmRequest => "CONFIRM_REQUEST",
            Self::WaitEvent => "WAIT_EVENT",
        }
    }

    /// Name of the contract step this state belongs to.
    pub fn label(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SubmitConfig | Self::ConfirmConfig => "setSource",
            Self::SubmitRequest | Self::ConfirmRequest => "sendRequest",
            Self::WaitEvent => "waitForResponse",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A run that reached `DONE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub config_tx_hash: TxHash,
    pub request_tx_hash: TxHash,
    pub event: CorrelatedEvent,
}

impl Completion {
    /// Whether the DON reported no error for the request.
    pub fn is_success(&self) -> bool {
        self.event.is_success()
    }
}

/// A run that ended in `FAILED(stage)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub stage: Stage,
    /// Error taxonomy name, e.g. `TimeoutError`.
    pub kind: &'static str,
    pub detail: String,
    /// Last transaction hash known when the stage failed.
    pub tx_hash: Option<TxHash>,
    pub config_tx_hash: Option<TxHash>,
    /// Receipt status when the transaction was mined but reverted.
    pub receipt_success: Option<bool>,
}

impl Failure {
    pub fn new(stage: Stage, error: BlockchainError, last_tx_hash: Option<TxHash>) -> Self {
        let receipt_success = matches!(error, BlockchainError::Reverted { .. }).then_some(false);
        Self {
            stage,
            kind: error.kind(),
            detail: error.to_string(),
            tx_hash: error.tx_hash().or(last_tx_hash),
            config_tx_hash: None,
            receipt_success,
        }
    }

    pub fn with_config_tx(mut self, config_tx_hash: Option<TxHash>) -> Self {
        self.config_tx_hash = config_tx_hash;
        self
    }
}

/// The single result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed(Completion),
    Failed(Failure),
}

impl Outcome {
    /// A failure before any transaction was attempted.
    pub fn startup_failure(error: BlockchainError) -> Self {
        Self::Failed(Failure::new(Stage::Init, error, None))
    }

    /// Completed and the response carried no error.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Completed(c) if c.is_success())
    }

    /// Terminal state name: `DONE` or `FAILED(<state>)`.
    pub fn terminal_state(&self) -> String {
        match self {
            Self::Completed(_) => "DONE".to_string(),
            Self::Failed(f) => format!("FAILED({})", f.stage),
        }
    }

    /// 0 once the response event arrived, whatever its error payload; the
    /// result line's `ok` flag carries that. 1 when a stage failed.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Completed(_) => 0,
            Self::Failed(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Bytes, B256};

    fn completion(err: &'static [u8]) -> Outcome {
        Outcome::Completed(Completion {
            config_tx_hash: TxHash::repeat_byte(1),
            request_tx_hash: TxHash::repeat_byte(2),
            event: CorrelatedEvent {
                request_id: B256::repeat_byte(3),
                response: "ok".to_string(),
                error: Bytes::from_static(err),
                block_number: Some(5),
                tx_hash: None,
            },
        })
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(Stage::ConfirmConfig.label(), "setSource");
        assert_eq!(Stage::SubmitRequest.label(), "sendRequest");
        assert_eq!(Stage::WaitEvent.label(), "waitForResponse");
        assert_eq!(Stage::WaitEvent.to_string(), "WAIT_EVENT");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(completion(b"").exit_code(), 0);
        assert!(completion(b"").is_ok());
        assert_eq!(completion(b"bad").exit_code(), 0);
        assert!(!completion(b"bad").is_ok());

        let failed = Outcome::startup_failure(BlockchainError::Config("no key".into()));
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(failed.terminal_state(), "FAILED(INIT)");
    }

    #[test]
    fn test_failure_from_revert() {
        let hash = TxHash::repeat_byte(7);
        let failure = Failure::new(
            Stage::ConfirmConfig,
            BlockchainError::Reverted { tx_hash: hash, block_number: 9 },
            None,
        );
        assert_eq!(failure.kind, "ContractRevertError");
        assert_eq!(failure.tx_hash, Some(hash));
        assert_eq!(failure.receipt_success, Some(false));
    }

    #[test]
    fn test_failure_falls_back_to_last_hash() {
        let hash = TxHash::repeat_byte(8);
        let failure = Failure::new(
            Stage::WaitEvent,
            BlockchainError::Timeout { what: "Response event", secs: 600, tx_hash: None },
            Some(hash),
        );
        assert_eq!(failure.tx_hash, Some(hash));
        assert_eq!(failure.receipt_success, None);
    }
}
