//! EIP-1559 fee estimation.
//!
//! `max_fee = 2 × base + priority`. The doubled base lets the transaction
//! survive base-fee increases while it waits; the unused part is refunded.
//! A failed gas-price read never faults: the fallback base is used and a
//! bad estimate shows up later as a receipt timeout.

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::FeeQuote;
use crate::config::FeeConfig;

const WEI_PER_GWEI: u128 = 1_000_000_000;

/// Fee policy constants, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimator {
    fallback_base_fee: u128,
    priority_fee: u128,
}

impl FeeEstimator {
    pub fn new(fallback_base_fee: u128, priority_fee: u128) -> Self {
        Self {
            fallback_base_fee,
            priority_fee,
        }
    }

    pub fn from_config(config: &FeeConfig) -> Self {
        Self::new(
            u128::from(config.fallback_gas_price_gwei) * WEI_PER_GWEI,
            u128::from(config.priority_fee_gwei) * WEI_PER_GWEI,
        )
    }

    /// Quote from an already-read base price.
    pub fn quote_from_base(&self, base_fee: u128) -> FeeQuote {
        FeeQuote {
            max_fee_per_gas: base_fee
                .saturating_mul(2)
                .saturating_add(self.priority_fee),
            max_priority_fee_per_gas: self.priority_fee,
        }
    }

    /// Read the chain's gas price and quote. Called once per transaction.
    pub async fn estimate<R: ChainRpc + ?Sized>(&self, rpc: &R) -> FeeQuote {
        let base_fee = match rpc.gas_price().await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback_wei = self.fallback_base_fee,
                    "Gas price unavailable, using fallback base fee"
                );
                self.fallback_base_fee
            }
        };

        let quote = self.quote_from_base(base_fee);
        tracing::debug!(
            base_fee,
            max_fee_per_gas = quote.max_fee_per_gas,
            max_priority_fee_per_gas = quote.max_priority_fee_per_gas,
            "Fee quote computed"
        );
        quote
    }
}

impl Default for FeeEstimator {
    fn default() -> Self {
        Self::from_config(&FeeConfig::default())
    }
}
