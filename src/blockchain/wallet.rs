//! Wallet management and transaction signing.
//!
//! # Security
//! - The private key is loaded ONLY from the environment
//! - Keys are never logged or serialized
//! - The key is normalized once; a `Wallet` is immutable afterwards

use alloy::consensus::{SignableTransaction, TxEip1559};
use alloy::network::TxSignerSync;
use alloy::primitives::{Address, TxKind, U256};
use alloy::signers::local::PrivateKeySigner;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::blockchain::transaction::{SignedTransaction, UnsignedTransaction};
use crate::blockchain::types::{BlockchainError, BlockchainResult};

/// Environment variable name for the private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

/// Signing credential plus the per-account submission lock.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Held from nonce fetch through broadcast; shared by clones so runs
    /// using the same key never race on a nonce.
    submission_lock: Arc<Mutex<()>>,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// Accepts the common export formats: with or without a `0x`/`0X`
    /// prefix, with surrounding whitespace. Anything that is not 32 bytes of
    /// hex is rejected.
    pub fn from_private_key(private_key_hex: &str) -> BlockchainResult<Self> {
        let key_hex = normalize_private_key(private_key_hex)?;

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Config(format!("Invalid private key: {}", e)))?;

        tracing::info!(address = %signer.address(), "Wallet initialized");

        Ok(Self {
            signer,
            submission_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Load wallet from the `PRIVATE_KEY` environment variable.
    pub fn from_env() -> BlockchainResult<Self> {
        let private_key = std::env::var(PRIVATE_KEY_ENV_VAR).map_err(|_| {
            BlockchainError::Config(format!(
                "Environment variable {} not set",
                PRIVATE_KEY_ENV_VAR
            ))
        })?;

        Self::from_private_key(&private_key)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Serialize submissions from this account.
    pub async fn lock_submissions(&self) -> MutexGuard<'_, ()> {
        self.submission_lock.lock().await
    }

    /// Sign an EIP-1559 transaction. No network I/O.
    pub fn sign_transaction(&self, unsigned: UnsignedTransaction) -> BlockchainResult<SignedTransaction> {
        if unsigned.from != self.address() {
            return Err(BlockchainError::Config(format!(
                "Transaction sender {} does not match wallet {}",
                unsigned.from,
                self.address()
            )));
        }

        let mut tx = TxEip1559 {
            chain_id: unsigned.chain_id,
            nonce: unsigned.nonce,
            gas_limit: unsigned.gas_limit,
            max_fee_per_gas: unsigned.fees.max_fee_per_gas,
            max_priority_fee_per_gas: unsigned.fees.max_priority_fee_per_gas,
            to: TxKind::Call(unsigned.to),
            value: U256::ZERO,
            access_list: Default::default(),
            input: unsigned.input.clone(),
        };

        let signature = TxSignerSync::sign_transaction_sync(&self.signer, &mut tx)
            .map_err(|e| BlockchainError::Config(format!("Signing failed: {}", e)))?;

        Ok(SignedTransaction::new(unsigned, tx.into_signed(signature)))
    }
}

/// Strip whitespace and an optional `0x` marker, then check the shape.
fn normalize_private_key(raw: &str) -> BlockchainResult<&str> {
    let trimmed = raw.trim();
    let key_hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    if key_hex.is_empty() {
        return Err(BlockchainError::Config("Private key is empty".to_string()));
    }
    if key_hex.len() != 64 || !key_hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(BlockchainError::Config(
            "Invalid private key: expected 32 bytes of hex".to_string(),
        ));
    }
    Ok(key_hex)
}
