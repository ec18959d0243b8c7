//! Shared utilities for workflow integration tests.
//!
//! `MockChain` is a scripted `ChainRpc`: every submitted transaction is
//! decoded, mined at the next block, and its receipt becomes visible after a
//! configurable number of polls. The head advances one block per
//! `block_number` call. Log queries return every scripted log in the block
//! range regardless of address or topic, so callers must do their own
//! filtering.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{keccak256, Address, Bytes, TxHash, B256};
use alloy::sol_types::{SolCall, SolEvent};
use async_trait::async_trait;

use functions_runner::blockchain::{
    BlockchainError, BlockchainResult, ChainRpc, FeeEstimator, LogEntry, Receipt, ReceiptLookup,
    Wallet,
};
use functions_runner::functions::contract::{sendRequestCall, RequestSent, Response};
use functions_runner::resilience::polling::PollPolicy;
use functions_runner::workflow::{ChainContext, WorkflowRunner, WorkflowSettings};

/// Anvil's first development key.
pub const TEST_PRIVATE_KEY: &str =
    "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const SEPOLIA: u64 = 11_155_111;

pub fn consumer() -> Address {
    Address::repeat_byte(0xc0)
}

pub fn test_wallet() -> Wallet {
    Wallet::from_private_key(TEST_PRIVATE_KEY).unwrap()
}

/// How the receipt of one submitted transaction behaves.
#[derive(Debug, Clone, Copy)]
pub struct ReceiptScript {
    /// Lookups answered with `Pending` before the receipt shows up.
    pub pending_polls: u32,
    pub success: bool,
    /// Never mined.
    pub never: bool,
}

impl Default for ReceiptScript {
    fn default() -> Self {
        Self {
            pending_polls: 0,
            success: true,
            never: false,
        }
    }
}

/// A transaction the mock accepted.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub hash: TxHash,
    pub nonce: u64,
    pub to: Option<Address>,
    pub input: Bytes,
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub block_number: u64,
}

#[derive(Debug)]
struct MinedTx {
    remaining_pending: u32,
    receipt: Option<Receipt>,
}

#[derive(Debug)]
struct MockState {
    chain_id: u64,
    gas_price: Option<u128>,
    nonce: u64,
    /// Added to the nonce once the first transaction is accepted.
    bump_after_first_send: u64,
    head: u64,
    sent: Vec<SentTx>,
    scripts: VecDeque<ReceiptScript>,
    mined: HashMap<TxHash, MinedTx>,
    receipt_error: Option<String>,
    reject_sends: Option<String>,
    /// Accept and mine, but answer like a node that saw the bytes before.
    already_known: bool,
    request_id: Option<B256>,
    logs: Vec<LogEntry>,
    failing_log_queries: u32,
    receipt_polls: u32,
    log_queries: u32,
}

#[derive(Debug)]
pub struct MockChain {
    state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id: SEPOLIA,
                gas_price: Some(20_000_000_000),
                nonce: 0,
                bump_after_first_send: 0,
                head: 100,
                sent: Vec::new(),
                scripts: VecDeque::new(),
                mined: HashMap::new(),
                receipt_error: None,
                reject_sends: None,
                already_known: false,
                request_id: None,
                logs: Vec::new(),
                failing_log_queries: 0,
                receipt_polls: 0,
                log_queries: 0,
            }),
        }
    }

    pub fn with_chain_id(self, chain_id: u64) -> Self {
        self.state.lock().unwrap().chain_id = chain_id;
        self
    }

    /// `None` makes `gas_price` fail.
    pub fn with_gas_price(self, gas_price: Option<u128>) -> Self {
        self.state.lock().unwrap().gas_price = gas_price;
        self
    }

    pub fn with_nonce(self, nonce: u64) -> Self {
        self.state.lock().unwrap().nonce = nonce;
        self
    }

    /// Another sender uses the key right after our first transaction.
    pub fn with_external_bump(self, bump: u64) -> Self {
        self.state.lock().unwrap().bump_after_first_send = bump;
        self
    }

    /// Script the receipts of the next submitted transactions, in order.
    pub fn with_receipts(self, scripts: impl IntoIterator<Item = ReceiptScript>) -> Self {
        self.state.lock().unwrap().scripts.extend(scripts);
        self
    }

    pub fn with_receipt_error(self, message: &str) -> Self {
        self.state.lock().unwrap().receipt_error = Some(message.to_string());
        self
    }

    pub fn with_send_rejection(self, message: &str) -> Self {
        self.state.lock().unwrap().reject_sends = Some(message.to_string());
        self
    }

    /// Every accepted transaction is answered with "already known".
    pub fn with_already_known_sends(self) -> Self {
        self.state.lock().unwrap().already_known = true;
        self
    }

    /// `sendRequest` receipts carry `RequestSent(request_id)` from the callee.
    pub fn with_request_id(self, request_id: B256) -> Self {
        self.state.lock().unwrap().request_id = Some(request_id);
        self
    }

    pub fn with_failing_log_queries(self, count: u32) -> Self {
        self.state.lock().unwrap().failing_log_queries = count;
        self
    }

    pub fn push_log(&self, log: LogEntry) {
        self.state.lock().unwrap().logs.push(log);
    }

    pub fn sent(&self) -> Vec<SentTx> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn receipt_polls(&self) -> u32 {
        self.state.lock().unwrap().receipt_polls
    }

    pub fn log_queries(&self) -> u32 {
        self.state.lock().unwrap().log_queries
    }

    pub fn head(&self) -> u64 {
        self.state.lock().unwrap().head
    }
}

#[async_trait]
impl ChainRpc for MockChain {
    async fn chain_id(&self) -> BlockchainResult<u64> {
        Ok(self.state.lock().unwrap().chain_id)
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.state
            .lock()
            .unwrap()
            .gas_price
            .ok_or_else(|| BlockchainError::Rpc("eth_gasPrice unavailable".to_string()))
    }

    async fn transaction_count(&self, _address: Address) -> BlockchainResult<u64> {
        Ok(self.state.lock().unwrap().nonce)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> BlockchainResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.reject_sends {
            return Err(BlockchainError::Rejected(message.clone()));
        }

        let mut buf = raw;
        let envelope = TxEnvelope::decode_2718(&mut buf)
            .map_err(|e| BlockchainError::Rejected(format!("rlp: {e}")))?;
        if envelope.nonce() != state.nonce {
            return Err(BlockchainError::Rejected("nonce too low".to_string()));
        }

        let hash = keccak256(raw);
        state.head += 1;
        let block_number = state.head;
        let to = envelope.to();
        let input = envelope.input().clone();
        state.sent.push(SentTx {
            hash,
            nonce: envelope.nonce(),
            to,
            input: input.clone(),
            max_fee_per_gas: envelope.max_fee_per_gas(),
            max_priority_fee_per_gas: envelope.max_priority_fee_per_gas().unwrap_or_default(),
            block_number,
        });

        state.nonce += 1;
        if state.sent.len() == 1 {
            state.nonce += state.bump_after_first_send;
        }

        let script = state.scripts.pop_front().unwrap_or_default();
        let receipt = (!script.never).then(|| {
            let mut logs = Vec::new();
            let is_request = input.len() >= 4 && input[..4] == sendRequestCall::SELECTOR;
            if let (true, Some(id), Some(emitter)) = (is_request, state.request_id, to) {
                let data = RequestSent { id }.encode_log_data();
                logs.push(LogEntry {
                    address: emitter,
                    topics: data.topics().to_vec(),
                    data: data.data,
                    block_number: Some(block_number),
                    transaction_hash: Some(hash),
                });
            }
            Receipt {
                tx_hash: hash,
                block_number,
                success: script.success,
                logs,
            }
        });
        state.mined.insert(
            hash,
            MinedTx {
                remaining_pending: script.pending_polls,
                receipt,
            },
        );
        if state.already_known {
            return Err(BlockchainError::Rejected(
                "already known (code -32000)".to_string(),
            ));
        }
        Ok(hash)
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<ReceiptLookup> {
        let mut state = self.state.lock().unwrap();
        state.receipt_polls += 1;
        if let Some(message) = &state.receipt_error {
            return Err(BlockchainError::Rpc(message.clone()));
        }

        let Some(mined) = state.mined.get_mut(&tx_hash) else {
            return Ok(ReceiptLookup::Pending);
        };
        if mined.remaining_pending > 0 {
            mined.remaining_pending -= 1;
            return Ok(ReceiptLookup::Pending);
        }
        Ok(match &mined.receipt {
            Some(receipt) => ReceiptLookup::Found(receipt.clone()),
            None => ReceiptLookup::Pending,
        })
    }

    async fn logs(
        &self,
        _address: Address,
        _topic0: B256,
        from_block: u64,
        to_block: u64,
    ) -> BlockchainResult<Vec<LogEntry>> {
        let mut state = self.state.lock().unwrap();
        state.log_queries += 1;
        if state.failing_log_queries > 0 {
            state.failing_log_queries -= 1;
            return Err(BlockchainError::Rpc("eth_getLogs unavailable".to_string()));
        }

        Ok(state
            .logs
            .iter()
            .filter(|log| {
                log.block_number
                    .is_some_and(|b| (from_block..=to_block).contains(&b))
            })
            .cloned()
            .collect())
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.head += 1;
        Ok(state.head)
    }
}

/// A `Response` log as the consumer would emit it.
pub fn response_log(
    emitter: Address,
    request_id: B256,
    response: &str,
    err: &[u8],
    block_number: u64,
) -> LogEntry {
    let data = Response {
        requestId: request_id,
        response: response.to_string(),
        err: Bytes::copy_from_slice(err),
    }
    .encode_log_data();
    LogEntry {
        address: emitter,
        topics: data.topics().to_vec(),
        data: data.data,
        block_number: Some(block_number),
        transaction_hash: Some(TxHash::with_last_byte(block_number as u8)),
    }
}

pub fn test_settings() -> WorkflowSettings {
    WorkflowSettings {
        consumer: consumer(),
        gas_limit: 700_000,
        receipt_policy: PollPolicy::from_secs(300, 2),
        event_policy: PollPolicy::from_secs(600, 3),
        fees: FeeEstimator::default(),
        max_run: None,
    }
}

pub async fn runner(chain: &Arc<MockChain>) -> WorkflowRunner<Arc<MockChain>> {
    runner_with(chain, test_settings()).await
}

pub async fn runner_with(
    chain: &Arc<MockChain>,
    settings: WorkflowSettings,
) -> WorkflowRunner<Arc<MockChain>> {
    let ctx = ChainContext::connect(chain.clone(), test_wallet(), SEPOLIA)
        .await
        .unwrap();
    WorkflowRunner::new(ctx, settings)
}
