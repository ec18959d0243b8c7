//! Functions consumer contract bindings.

use alloy::primitives::{Address, Bytes, B256};
use alloy::sol;
use alloy::sol_types::{SolCall, SolEvent};

use crate::blockchain::types::Receipt;

sol! {
    /// Replaces the JavaScript source used by subsequent requests.
    #[derive(Debug)]
    function setSource(string newSource) external;

    /// Starts a Functions request billed to `subscriptionId`.
    #[derive(Debug)]
    function sendRequest(uint64 subscriptionId, string[] args) external returns (bytes32 requestId);

    /// Emitted by the consumer when the DON fulfils a request.
    #[derive(Debug)]
    event Response(bytes32 indexed requestId, string response, bytes err);

    /// Emitted by the Functions client base contract when a request is sent.
    #[derive(Debug)]
    event RequestSent(bytes32 indexed id);
}

/// Canonical signature of the completion event.
pub const RESPONSE_EVENT_SIGNATURE: &str = "Response(bytes32,string,bytes)";

/// Call data for `setSource(source)`.
pub fn set_source_calldata(source: &str) -> Bytes {
    setSourceCall {
        newSource: source.to_string(),
    }
    .abi_encode()
    .into()
}

/// Call data for `sendRequest(subscription_id, args)`.
pub fn send_request_calldata(subscription_id: u64, args: &[String]) -> Bytes {
    sendRequestCall {
        subscriptionId: subscription_id,
        args: args.to_vec(),
    }
    .abi_encode()
    .into()
}

/// Request id announced by `consumer` in a `sendRequest` receipt, if any.
pub fn request_id_from_receipt(receipt: &Receipt, consumer: Address) -> Option<B256> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == consumer)
        .filter(|log| log.topic0() == Some(&RequestSent::SIGNATURE_HASH))
        .find_map(|log| log.topics.get(1).copied())
}
