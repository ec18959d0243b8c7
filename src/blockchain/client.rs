//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Expose only the chain operations the workflow needs, behind `ChainRpc`
//! - Separate node rejections from transport failures
//! - Report a missing receipt as `Pending`, never as an error

use alloy::primitives::{Address, TxHash, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::{Filter, Log, TransactionReceipt};
use alloy::transports::{RpcError, TransportErrorKind, TransportResult};
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::blockchain::types::{
    BlockchainError, BlockchainResult, LogEntry, Receipt, ReceiptLookup, RpcConfig,
};
use crate::observability::metrics;
use crate::resilience::timeouts::{bounded, Bounded};

/// The chain operations the workflow consumes.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    async fn chain_id(&self) -> BlockchainResult<u64>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> BlockchainResult<u128>;

    /// Transaction count (next nonce) of `address`.
    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64>;

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash>;

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<ReceiptLookup>;

    /// Logs emitted by `address` with first topic `topic0` in `[from_block, to_block]`.
    async fn logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> BlockchainResult<Vec<LogEntry>>;

    async fn block_number(&self) -> BlockchainResult<u64>;
}

#[async_trait]
impl<T: ChainRpc + ?Sized> ChainRpc for Arc<T> {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        (**self).chain_id().await
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        (**self).gas_price().await
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        (**self).transaction_count(address).await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        (**self).send_raw_transaction(raw).await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<ReceiptLookup> {
        (**self).transaction_receipt(tx_hash).await
    }

    async fn logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> BlockchainResult<Vec<LogEntry>> {
        (**self).logs(address, topic0, from_block, to_block).await
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        (**self).block_number().await
    }
}

type DynProvider = Arc<dyn Provider + Send + Sync>;

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<DynProvider>,
    /// Configuration.
    config: RpcConfig,
    /// Per-call timeout.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client. No network I/O happens here.
    pub fn connect(config: RpcConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Config(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as DynProvider);

        // 2. Add failover providers
        for url_str in &config.failover_urls {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as DynProvider);
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            providers = providers.len(),
            expected_chain_id = config.expected_chain_id,
            "Blockchain client initialized"
        );

        Ok(Self {
            providers,
            config,
            timeout_duration,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Try each provider in order.
    ///
    /// Transport errors and timeouts move on to the next provider. An error
    /// response means a node answered and refused; that is returned as
    /// `Rejected` without trying the others.
    async fn with_failover<T, F, Fut>(&self, op: &'static str, call: F) -> BlockchainResult<T>
    where
        F: Fn(DynProvider) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        for (i, provider) in self.providers.iter().enumerate() {
            match bounded(self.timeout_duration, call(provider.clone())).await {
                Bounded::Done(result) => return Ok(result),
                Bounded::Failed(e) => {
                    if let Some(rejection) = rejection_message(&e) {
                        return Err(BlockchainError::Rejected(rejection));
                    }
                    tracing::warn!(provider_idx = i, op, error = %e, "RPC error, trying next provider");
                }
                Bounded::TimedOut => {
                    tracing::warn!(provider_idx = i, op, "RPC timeout, trying next provider");
                }
            }
            if has_next_provider(i, self.providers.len()) {
                metrics::record_rpc_failover(op);
            }
        }
        Err(BlockchainError::Rpc(format!("All RPC providers failed to {}", op)))
    }
}

#[async_trait]
impl ChainRpc for BlockchainClient {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.with_failover("get chain id", |p| async move { p.get_chain_id().await })
            .await
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.with_failover("get gas price", |p| async move { p.get_gas_price().await })
            .await
    }

    async fn transaction_count(&self, address: Address) -> BlockchainResult<u64> {
        self.with_failover("get transaction count", |p| async move {
            p.get_transaction_count(address).await
        })
        .await
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        self.with_failover("send raw transaction", |p| async move {
            p.send_raw_transaction(raw)
                .await
                .map(|pending| *pending.tx_hash())
        })
        .await
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<ReceiptLookup> {
        let result = self
            .with_failover("get transaction receipt", |p| async move {
                p.get_transaction_receipt(tx_hash).await
            })
            .await;

        match result {
            Ok(Some(receipt)) => Ok(lookup_from_receipt(&receipt)),
            Ok(None) => Ok(ReceiptLookup::Pending),
            Err(BlockchainError::Rejected(message)) if is_not_found(&message) => {
                tracing::debug!(tx_hash = %tx_hash, %message, "Provider reports transaction not found");
                Ok(ReceiptLookup::Pending)
            }
            Err(e) => Err(e),
        }
    }

    async fn logs(
        &self,
        address: Address,
        topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> BlockchainResult<Vec<LogEntry>> {
        let filter = Filter::new()
            .address(address)
            .event_signature(topic0)
            .from_block(from_block)
            .to_block(to_block);

        let logs = self
            .with_failover("get logs", |p| {
                let filter = filter.clone();
                async move { p.get_logs(&filter).await }
            })
            .await?;

        Ok(logs.iter().map(log_entry).collect())
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        self.with_failover("get block number", |p| async move { p.get_block_number().await })
            .await
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("failovers", &self.config.failover_urls.len())
            .field("expected_chain_id", &self.config.expected_chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

fn has_next_provider(provider_idx: usize, providers: usize) -> bool {
    provider_idx + 1 < providers
}

fn rejection_message(e: &RpcError<TransportErrorKind>) -> Option<String> {
    e.as_error_resp()
        .map(|payload| format!("{} (code {})", payload.message, payload.code))
}

/// Some providers answer an unknown hash with an error instead of `null`.
/// A missing method (-32601) is not a missing transaction.
fn is_not_found(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    if lower.contains("method not found") || lower.contains("code -32601") {
        return false;
    }
    lower.contains("not found") || lower.contains("unknown transaction")
}

/// The node already holds this transaction, e.g. because an earlier
/// provider relayed it before its call timed out.
pub(crate) fn is_already_known(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("already known") || lower.contains("known transaction")
}

fn lookup_from_receipt(receipt: &TransactionReceipt) -> ReceiptLookup {
    match receipt.block_number {
        Some(block_number) => ReceiptLookup::Found(Receipt {
            tx_hash: receipt.transaction_hash,
            block_number,
            success: receipt.status(),
            logs: receipt.inner.logs().iter().map(log_entry).collect(),
        }),
        None => ReceiptLookup::Pending,
    }
}

fn log_entry(log: &Log) -> LogEntry {
    LogEntry {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RpcConfig {
        RpcConfig {
            rpc_url: "http://127.0.0.1:1".to_string(),
            failover_urls: Vec::new(),
            expected_chain_id: 11155111,
            rpc_timeout_secs: 2,
        }
    }

    #[test]
    fn test_client_creation() {
        let client = BlockchainClient::connect(test_config()).unwrap();
        assert_eq!(client.providers.len(), 1);
        assert_eq!(client.config().expected_chain_id, 11155111);
    }

    #[test]
    fn test_invalid_primary_url() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = BlockchainClient::connect(config).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
    }

    #[test]
    fn test_invalid_failover_is_skipped() {
        let mut config = test_config();
        config.failover_urls = vec!["http://127.0.0.1:2".to_string(), "::bad::".to_string()];
        let client = BlockchainClient::connect(config).unwrap();
        assert_eq!(client.providers.len(), 2);
    }

    #[tokio::test]
    async fn test_rpc_failover() {
        let mut config = test_config();
        config.failover_urls.push("http://127.0.0.1:2".to_string());
        let client = BlockchainClient::connect(config).unwrap();

        // Nothing listens on either port: both fail at the transport level.
        let err = client.block_number().await.unwrap_err();
        assert_eq!(err.kind(), "NetworkError");
        assert!(err.to_string().contains("All RPC providers failed"));
    }

    #[test]
    fn test_not_found_messages() {
        assert!(is_not_found("transaction not found"));
        assert!(is_not_found("Transaction 0xabc Not Found"));
        assert!(is_not_found("unknown transaction"));
        assert!(!is_not_found("nonce too low"));
    }

    #[test]
    fn test_failover_only_counted_before_last_provider() {
        assert!(has_next_provider(0, 2));
        assert!(!has_next_provider(1, 2));
        assert!(!has_next_provider(0, 1));
    }

    #[test]
    fn test_method_not_found_is_not_pending() {
        assert!(!is_not_found("Method not found (code -32601)"));
        assert!(!is_not_found("the method eth_getTransactionReceipt does not exist (code -32601)"));
        assert!(is_not_found("transaction not found (code -32000)"));
    }

    #[test]
    fn test_already_known_messages() {
        assert!(is_already_known("already known (code -32000)"));
        assert!(is_already_known("ALREADY KNOWN"));
        assert!(is_already_known("known transaction: 0xabc (code -32000)"));
        assert!(!is_already_known("nonce too low (code -32000)"));
        assert!(!is_already_known("replacement transaction underpriced"));
    }
}
