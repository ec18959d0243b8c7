//! Chain-specific types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash, B256};
use thiserror::Error;

// Re-export RpcConfig from config module to avoid duplication
pub use crate::config::schema::RpcConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// Missing or malformed credential, address, or other static input.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connected to a different network than configured.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// RPC connection or request failed on every endpoint.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// The node answered with an error response (nonce too low, underpriced, ...).
    #[error("RPC rejected request: {0}")]
    Rejected(String),

    /// Transaction was mined but its status indicates failure.
    #[error("Transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: TxHash, block_number: u64 },

    /// A bounded wait elapsed.
    #[error("Timed out after {secs}s waiting for {what}")]
    Timeout {
        what: &'static str,
        secs: u64,
        tx_hash: Option<TxHash>,
    },

    /// The run was cancelled or its overall deadline passed.
    #[error("Cancelled while waiting for {0}")]
    Cancelled(&'static str),
}

impl BlockchainError {
    /// Taxonomy name reported to callers.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "ConfigError",
            Self::ChainMismatch { .. } => "ChainIdentityError",
            Self::Rpc(_) | Self::Rejected(_) => "NetworkError",
            Self::Reverted { .. } => "ContractRevertError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Cancelled(_) => "Cancelled",
        }
    }

    /// Transaction hash associated with the failure, if any.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Reverted { tx_hash, .. } => Some(*tx_hash),
            Self::Timeout { tx_hash, .. } => *tx_hash,
            _ => None,
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// EIP-1559 fee fields, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeQuote {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// A log entry as returned by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<TxHash>,
}

impl LogEntry {
    /// First topic (the event signature hash for non-anonymous events).
    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub success: bool,
    pub logs: Vec<LogEntry>,
}

/// Result of a single receipt query.
///
/// Hard failures are reported through `BlockchainError`; a missing receipt
/// is never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptLookup {
    /// The transaction is included in a block.
    Found(Receipt),
    /// Not mined yet, or not yet visible on the queried node.
    Pending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_id_conversion() {
        let chain_id = ChainId::from(11155111u64);
        assert_eq!(chain_id.0, 11155111);
        assert_eq!(u64::from(chain_id), 11155111);
    }

    #[test]
    fn test_default_config() {
        let config = RpcConfig::default();
        assert_eq!(config.expected_chain_id, 11155111);
        assert_eq!(config.rpc_timeout_secs, 30);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(BlockchainError::Config("x".into()).kind(), "ConfigError");
        assert_eq!(
            BlockchainError::ChainMismatch { expected: 1, actual: 2 }.kind(),
            "ChainIdentityError"
        );
        assert_eq!(BlockchainError::Rejected("nonce too low".into()).kind(), "NetworkError");
        assert_eq!(BlockchainError::Rpc("down".into()).kind(), "NetworkError");
        assert_eq!(
            BlockchainError::Reverted { tx_hash: TxHash::ZERO, block_number: 1 }.kind(),
            "ContractRevertError"
        );
    }

    #[test]
    fn test_timeout_carries_hash() {
        let hash = TxHash::repeat_byte(0xab);
        let err = BlockchainError::Timeout {
            what: "transaction receipt",
            secs: 300,
            tx_hash: Some(hash),
        };
        assert_eq!(err.kind(), "TimeoutError");
        assert_eq!(err.tx_hash(), Some(hash));
        assert!(err.to_string().contains("300s"));
    }
}
