//! Functions consumer integration.
//!
//! # Data Flow
//! ```text
//! source.js, args, subscription id
//!     → contract.rs (setSource / sendRequest call data)
//!     → [transactions mined]
//!     → contract.rs (requestId from RequestSent in the receipt)
//!     → correlator.rs (poll logs for Response, decode, classify)
//! ```

pub mod contract;
pub mod correlator;

pub use contract::{send_request_calldata, set_source_calldata, RESPONSE_EVENT_SIGNATURE};
pub use correlator::{is_no_error, normalize_error_hex, CorrelatedEvent, ResponseCorrelator};
