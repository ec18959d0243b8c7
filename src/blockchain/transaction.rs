//! Transaction building, signing, submission, and confirmation polling.
//!
//! # Responsibilities
//! - Build EIP-1559 contract calls with a fresh nonce and fee quote
//! - Sign and broadcast them
//! - Poll for the receipt until mined, timed out, or cancelled

use alloy::consensus::{Signed, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{Address, Bytes, Signature, TxHash};

use crate::blockchain::client::{is_already_known, ChainRpc};
use crate::blockchain::fees::FeeEstimator;
use crate::blockchain::types::{
    BlockchainError, BlockchainResult, FeeQuote, Receipt, ReceiptLookup,
};
use crate::blockchain::wallet::Wallet;
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::resilience::polling::{poll_until, PollError, PollPolicy};

/// A contract call ready to be signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub from: Address,
    pub nonce: u64,
    pub chain_id: u64,
    pub gas_limit: u64,
    pub fees: FeeQuote,
    pub to: Address,
    pub input: Bytes,
}

/// A signed EIP-1559 transaction with its encoded bytes and hash.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    unsigned: UnsignedTransaction,
    signed: Signed<TxEip1559>,
    raw: Bytes,
}

impl SignedTransaction {
    pub(crate) fn new(unsigned: UnsignedTransaction, signed: Signed<TxEip1559>) -> Self {
        let raw = Bytes::from(TxEnvelope::from(signed.clone()).encoded_2718());
        Self {
            unsigned,
            signed,
            raw,
        }
    }

    /// Hash of the signed bytes.
    pub fn hash(&self) -> TxHash {
        *self.signed.hash()
    }

    /// EIP-2718 encoded bytes for `eth_sendRawTransaction`.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn nonce(&self) -> u64 {
        self.unsigned.nonce
    }

    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.unsigned
    }

    pub fn signature(&self) -> &Signature {
        self.signed.signature()
    }

    /// Recover the signer address from the signature.
    pub fn recover_sender(&self) -> BlockchainResult<Address> {
        self.signed
            .signature()
            .recover_address_from_prehash(&self.signed.signature_hash())
            .map_err(|e| BlockchainError::Config(format!("Signature recovery failed: {}", e)))
    }
}

/// Builds, signs, and submits contract calls for one wallet.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    wallet: Wallet,
    fees: FeeEstimator,
    chain_id: u64,
    gas_limit: u64,
}

impl TxBuilder {
    pub fn new(wallet: Wallet, fees: FeeEstimator, chain_id: u64, gas_limit: u64) -> Self {
        Self {
            wallet,
            fees,
            chain_id,
            gas_limit,
        }
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Assemble an unsigned call. Pure.
    pub fn build(&self, to: Address, input: Bytes, nonce: u64, fees: FeeQuote) -> UnsignedTransaction {
        UnsignedTransaction {
            from: self.wallet.address(),
            nonce,
            chain_id: self.chain_id,
            gas_limit: self.gas_limit,
            fees,
            to,
            input,
        }
    }

    /// Fetch a fresh nonce and fee quote, sign, and broadcast.
    ///
    /// The wallet's submission lock is held from the nonce read until the
    /// node accepted the transaction.
    pub async fn send_call<R: ChainRpc + ?Sized>(
        &self,
        rpc: &R,
        to: Address,
        input: Bytes,
    ) -> BlockchainResult<SignedTransaction> {
        let _guard = self.wallet.lock_submissions().await;

        let nonce = rpc.transaction_count(self.wallet.address()).await?;
        let fees = self.fees.estimate(rpc).await;
        let signed = self.wallet.sign_transaction(self.build(to, input, nonce, fees))?;

        submit(rpc, &signed).await?;
        Ok(signed)
    }
}

/// Broadcast a signed transaction. Rejections are not retried.
///
/// An "already known" rejection means a node holds these exact bytes, so the
/// locally computed hash is returned and the receipt wait decides the rest.
pub async fn submit<R: ChainRpc + ?Sized>(
    rpc: &R,
    signed: &SignedTransaction,
) -> BlockchainResult<TxHash> {
    let tx_hash = match rpc.send_raw_transaction(signed.raw()).await {
        Ok(tx_hash) => tx_hash,
        Err(BlockchainError::Rejected(message)) if is_already_known(&message) => {
            tracing::info!(tx_hash = %signed.hash(), %message, "Node already has transaction");
            signed.hash()
        }
        Err(e) => return Err(e),
    };
    if tx_hash != signed.hash() {
        tracing::warn!(
            local = %signed.hash(),
            remote = %tx_hash,
            "Node returned a different transaction hash"
        );
    }

    metrics::record_tx_submitted();
    tracing::info!(tx_hash = %tx_hash, nonce = signed.nonce(), "Transaction submitted");
    Ok(tx_hash)
}

/// Wait until `tx_hash` is mined.
///
/// `Pending` lookups are retried after `policy.interval`; hard RPC errors
/// end the wait. The receipt is returned whatever its status.
pub async fn wait_for_receipt<R: ChainRpc + ?Sized>(
    rpc: &R,
    tx_hash: TxHash,
    policy: PollPolicy,
    signal: &ShutdownSignal,
) -> BlockchainResult<Receipt> {
    let result = poll_until(policy, signal, || async {
        metrics::record_receipt_poll();
        rpc.transaction_receipt(tx_hash)
            .await
            .map(|lookup| match lookup {
                ReceiptLookup::Found(receipt) => Some(receipt),
                ReceiptLookup::Pending => {
                    tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                    None
                }
            })
    })
    .await;

    match result {
        Ok(receipt) => {
            tracing::info!(
                tx_hash = %tx_hash,
                block_number = receipt.block_number,
                success = receipt.success,
                "Transaction mined"
            );
            Ok(receipt)
        }
        Err(PollError::Fatal(e)) => Err(e),
        Err(PollError::TimedOut { attempts }) => {
            tracing::warn!(tx_hash = %tx_hash, attempts, "Timed out waiting for receipt");
            Err(BlockchainError::Timeout {
                what: "transaction receipt",
                secs: policy.timeout.as_secs(),
                tx_hash: Some(tx_hash),
            })
        }
        Err(PollError::Cancelled) => Err(BlockchainError::Cancelled("transaction receipt")),
    }
}
