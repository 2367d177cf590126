//! Bounded, cancellable wait for a mined receipt.

use alloy::primitives::TxHash;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::ChainClient;
use crate::blockchain::types::{ChainResult, RecordChainError, TransactionReceipt};
use crate::config::TransactionConfig;
use crate::lifecycle::Shutdown;

/// How long and how often to poll for a receipt.
#[derive(Debug, Clone)]
pub struct ReceiptWait {
    /// Upper bound on the whole wait.
    pub timeout: Duration,
    pub poll_interval: Duration,
    /// Cancels the wait when triggered.
    pub shutdown: Shutdown,
}

impl ReceiptWait {
    pub fn new(timeout: Duration, poll_interval: Duration, shutdown: Shutdown) -> Self {
        Self {
            timeout,
            poll_interval,
            shutdown,
        }
    }

    pub fn from_config(config: &TransactionConfig, shutdown: Shutdown) -> Self {
        Self::new(
            Duration::from_secs(config.receipt_timeout_secs),
            Duration::from_millis(config.receipt_poll_interval_ms),
            shutdown,
        )
    }
}

/// Poll until the node reports `tx_hash` as included.
///
/// Returns `ReceiptTimeout` once `wait.timeout` elapses and `Cancelled` when
/// the shutdown signal fires first. RPC errors while polling end the wait.
pub async fn await_receipt<C: ChainClient>(
    client: &C,
    tx_hash: TxHash,
    wait: &ReceiptWait,
) -> ChainResult<TransactionReceipt> {
    let mut cancelled = wait.shutdown.subscribe();
    if wait.shutdown.is_triggered() {
        return Err(RecordChainError::Cancelled(tx_hash));
    }

    let poll = async {
        let mut ticker = interval(wait.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match client.receipt(tx_hash).await? {
                Some(receipt) => return Ok(receipt),
                None => tracing::debug!(tx_hash = %tx_hash, "Transaction pending"),
            }
        }
    };

    tokio::select! {
        result = timeout(wait.timeout, poll) => match result {
            Ok(receipt) => receipt,
            Err(_) => Err(RecordChainError::ReceiptTimeout {
                tx_hash,
                waited_secs: wait.timeout.as_secs(),
            }),
        },
        _ = cancelled.recv() => {
            tracing::warn!(tx_hash = %tx_hash, "Receipt wait cancelled");
            Err(RecordChainError::Cancelled(tx_hash))
        }
    }
}
