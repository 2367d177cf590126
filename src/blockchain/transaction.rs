//! Transaction building, signing, and confirmation.
//!
//! # Responsibilities
//! - Build transactions from chain state: nonce, gas price, padded gas estimate
//! - Fall back to a fixed gas limit when estimation fails
//! - Sign, submit, and wait for the receipt (no retries)

use alloy::primitives::Address;

use crate::blockchain::client::ChainClient;
use crate::blockchain::receipt::{await_receipt, ReceiptWait};
use crate::blockchain::types::{
    CallIntent, ChainResult, RecordChainError, TransactionReceipt, UnsignedTransaction,
};
use crate::blockchain::wallet::Wallet;
use crate::config::TransactionConfig;
use crate::observability::metrics;

/// Gas limit used when estimation fails.
pub const DEFAULT_FALLBACK_GAS_LIMIT: u64 = 3_000_000;

/// Estimate padding, in percent of the estimate.
pub const DEFAULT_GAS_PADDING_PERCENT: u64 = 120;

/// Estimate-and-pad gas limit policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    pub fallback_gas_limit: u64,
    pub padding_percent: u64,
}

impl GasPolicy {
    /// Pad an estimate, rounding down.
    pub fn pad(&self, estimate: u64) -> u64 {
        let padded = u128::from(estimate) * u128::from(self.padding_percent) / 100;
        u64::try_from(padded).unwrap_or(u64::MAX)
    }
}

impl Default for GasPolicy {
    fn default() -> Self {
        Self {
            fallback_gas_limit: DEFAULT_FALLBACK_GAS_LIMIT,
            padding_percent: DEFAULT_GAS_PADDING_PERCENT,
        }
    }
}

impl From<&TransactionConfig> for GasPolicy {
    fn from(config: &TransactionConfig) -> Self {
        Self {
            fallback_gas_limit: config.fallback_gas_limit,
            padding_percent: config.gas_padding_percent,
        }
    }
}

/// Transaction builder over a chain client.
pub struct TxBuilder<'a, C> {
    client: &'a C,
    policy: GasPolicy,
}

impl<'a, C: ChainClient> TxBuilder<'a, C> {
    /// Create a new transaction builder.
    pub fn new(client: &'a C, policy: GasPolicy) -> Self {
        Self { client, policy }
    }

    /// Assemble an unsigned transaction for `intent` sent by `from`.
    ///
    /// Nonce and gas price come fresh from the node. Estimation failures are
    /// not fatal: the fallback limit is used and a warning logged.
    pub async fn build(
        &self,
        from: Address,
        intent: CallIntent,
    ) -> ChainResult<UnsignedTransaction> {
        let nonce = self.client.nonce_for(from).await?;
        let gas_price = self.client.gas_price().await?;
        let gas_limit = match intent.gas_limit {
            Some(fixed) => fixed,
            None => self.gas_limit_for(from, &intent).await,
        };

        tracing::debug!(
            from = %from,
            nonce,
            gas_price,
            gas_limit,
            creation = intent.is_creation(),
            "Transaction built"
        );

        Ok(UnsignedTransaction {
            from,
            chain_id: self.client.chain_id(),
            nonce,
            gas_limit,
            gas_price,
            to: intent.to,
            input: intent.input,
        })
    }

    async fn gas_limit_for(&self, from: Address, intent: &CallIntent) -> u64 {
        match self.client.estimate_gas(from, intent).await {
            Ok(estimate) => {
                let padded = self.policy.pad(estimate);
                tracing::debug!(estimate, padded, "Gas estimated");
                padded
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = self.policy.fallback_gas_limit,
                    "Gas estimation failed, using fallback gas limit"
                );
                metrics::record_gas_fallback();
                self.policy.fallback_gas_limit
            }
        }
    }

    /// Build, sign, submit and wait for the receipt of `intent`.
    ///
    /// Each step is attempted exactly once. A mined receipt with failure
    /// status is returned as `Reverted`.
    pub async fn execute(
        &self,
        wallet: &Wallet,
        intent: CallIntent,
        wait: &ReceiptWait,
    ) -> ChainResult<TransactionReceipt> {
        let kind = if intent.is_creation() { "create" } else { "call" };
        let unsigned = self.build(wallet.address(), intent).await?;
        let signed = wallet.sign(&unsigned)?;

        let tx_hash = self.client.submit(&signed).await?;
        metrics::record_transaction_submitted(kind);
        tracing::info!(
            tx_hash = %tx_hash,
            nonce = unsigned.nonce,
            gas_limit = unsigned.gas_limit,
            "Transaction submitted, waiting for receipt"
        );

        let receipt = await_receipt(self.client, tx_hash, wait).await?;
        metrics::record_gas_used(kind, receipt.gas_used);

        if !receipt.success {
            tracing::error!(tx_hash = %tx_hash, block = receipt.block_number, "Transaction reverted");
            return Err(RecordChainError::Reverted(tx_hash));
        }

        tracing::info!(
            tx_hash = %tx_hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction mined"
        );
        Ok(receipt)
    }
}
