//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! PRIVATE_KEY, RPC URLs
//!     → wallet.rs (key normalization, signing, submission lock)
//!     → client.rs (ChainRpc over alloy providers, failover, timeouts)
//!     → fees.rs (EIP-1559 fee quote per transaction)
//!     → transaction.rs (build, sign, broadcast, wait for receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod fees;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{BlockchainClient, ChainRpc};
pub use fees::FeeEstimator;
pub use transaction::{SignedTransaction, TxBuilder, UnsignedTransaction};
pub use types::{
    BlockchainError, BlockchainResult, ChainId, FeeQuote, LogEntry, Receipt, ReceiptLookup,
};
pub use wallet::Wallet;
