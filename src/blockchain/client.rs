//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to a single JSON-RPC endpoint and verify it is alive
//! - Query chain state (nonce, gas price, gas estimate, receipts)
//! - Submit raw signed transactions and issue read-only calls
//! - Bound every request with the configured RPC timeout

use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash, TxKind};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use std::fmt::Display;
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::types::{
    CallIntent, ChainEndpoint, ChainId, ChainResult, RecordChainError, SignedTransaction,
    TransactionReceipt,
};
use crate::config::NodeConfig;

/// Primitive chain operations the transaction pipeline is built on.
///
/// `RpcChainClient` talks to a real node; tests plug in an in-memory chain.
pub trait ChainClient: Send + Sync {
    /// Chain id used for EIP-155 signing.
    fn chain_id(&self) -> u64;

    /// Next valid nonce for `address`.
    fn nonce_for(&self, address: Address) -> impl Future<Output = ChainResult<u64>> + Send;

    /// Current gas price in wei.
    fn gas_price(&self) -> impl Future<Output = ChainResult<u128>> + Send;

    /// Simulate `intent` from `from`. Fails with `Estimation` when the simulation reverts.
    fn estimate_gas(
        &self,
        from: Address,
        intent: &CallIntent,
    ) -> impl Future<Output = ChainResult<u64>> + Send;

    /// Submit a raw signed transaction, returning its hash.
    fn submit(&self, tx: &SignedTransaction) -> impl Future<Output = ChainResult<TxHash>> + Send;

    /// Receipt for `tx_hash`, or `None` while it is still pending.
    fn receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = ChainResult<Option<TransactionReceipt>>> + Send;

    /// Read-only `eth_call`. No transaction, no gas.
    fn call(&self, to: Address, input: Bytes) -> impl Future<Output = ChainResult<Bytes>> + Send;
}

/// JSON-RPC client for a single node.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: Arc<dyn Provider + Send + Sync>,
    endpoint: ChainEndpoint,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl RpcChainClient {
    /// Connect to the configured node.
    ///
    /// Fails with `Connection` when the node does not answer `eth_chainId`,
    /// and with `ChainMismatch` when it reports a chain other than the
    /// configured one.
    pub async fn connect(config: &NodeConfig) -> ChainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            RecordChainError::Configuration(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let provider =
            Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>;

        let chain_id = match timeout(timeout_duration, provider.get_chain_id()).await {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => {
                return Err(RecordChainError::Connection {
                    url: config.rpc_url.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(RecordChainError::Connection {
                    url: config.rpc_url.clone(),
                    reason: format!("no answer within {} seconds", config.rpc_timeout_secs),
                })
            }
        };

        if let Some(expected) = config.chain_id {
            if expected != chain_id {
                return Err(RecordChainError::ChainMismatch {
                    expected,
                    actual: chain_id,
                });
            }
        }

        tracing::info!(rpc_url = %config.rpc_url, chain_id, "Connected to node");

        Ok(Self {
            provider,
            endpoint: ChainEndpoint {
                url: config.rpc_url.clone(),
                chain_id: ChainId(chain_id),
            },
            timeout_duration,
        })
    }

    /// The endpoint resolved at connect time.
    pub fn endpoint(&self) -> &ChainEndpoint {
        &self.endpoint
    }

    /// Run one RPC with the request timeout applied.
    async fn request<F, T, E>(&self, method: &'static str, fut: F) -> ChainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Display,
    {
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(method, error = %e, "RPC error");
                Err(RecordChainError::Rpc(format!("{method}: {e}")))
            }
            Err(_) => {
                tracing::warn!(method, "RPC timeout");
                Err(RecordChainError::Timeout {
                    method,
                    secs: self.timeout_duration.as_secs(),
                })
            }
        }
    }

    fn request_for(from: Address, intent: &CallIntent) -> TransactionRequest {
        let mut request = TransactionRequest::default()
            .with_from(from)
            .with_input(intent.input.clone());
        request.to = Some(intent.to.map_or(TxKind::Create, TxKind::Call));
        request
    }
}

impl ChainClient for RpcChainClient {
    fn chain_id(&self) -> u64 {
        self.endpoint.chain_id.0
    }

    async fn nonce_for(&self, address: Address) -> ChainResult<u64> {
        self.request(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address),
        )
        .await
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        self.request("eth_gasPrice", self.provider.get_gas_price())
            .await
    }

    async fn estimate_gas(&self, from: Address, intent: &CallIntent) -> ChainResult<u64> {
        let request = Self::request_for(from, intent);
        match timeout(self.timeout_duration, self.provider.estimate_gas(request)).await {
            Ok(Ok(gas)) => Ok(gas),
            Ok(Err(e)) => Err(RecordChainError::Estimation(e.to_string())),
            Err(_) => Err(RecordChainError::Estimation(format!(
                "eth_estimateGas timed out after {} seconds",
                self.timeout_duration.as_secs()
            ))),
        }
    }

    async fn submit(&self, tx: &SignedTransaction) -> ChainResult<TxHash> {
        let fut = self.provider.send_raw_transaction(&tx.raw);
        match timeout(self.timeout_duration, fut).await {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => {
                let reason = e.to_string();
                if reason.to_lowercase().contains("nonce") {
                    Err(RecordChainError::NonceConflict {
                        nonce: tx.nonce,
                        reason,
                    })
                } else {
                    Err(RecordChainError::Submission(reason))
                }
            }
            Err(_) => Err(RecordChainError::Timeout {
                method: "eth_sendRawTransaction",
                secs: self.timeout_duration.as_secs(),
            }),
        }
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<TransactionReceipt>> {
        let receipt = self
            .request(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(tx_hash),
            )
            .await?;
        Ok(receipt.map(TransactionReceipt::from))
    }

    async fn call(&self, to: Address, input: Bytes) -> ChainResult<Bytes> {
        let request = TransactionRequest::default()
            .with_to(to)
            .with_input(input);
        match timeout(self.timeout_duration, self.provider.call(request)).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                let reason = e.to_string();
                if reason.to_lowercase().contains("revert") {
                    Err(RecordChainError::CallReverted { to, reason })
                } else {
                    Err(RecordChainError::Rpc(format!("eth_call: {reason}")))
                }
            }
            Err(_) => Err(RecordChainError::Timeout {
                method: "eth_call",
                secs: self.timeout_duration.as_secs(),
            }),
        }
    }
}

impl std::fmt::Debug for RpcChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcChainClient")
            .field("rpc_url", &self.endpoint.url)
            .field("chain_id", &self.endpoint.chain_id.0)
            .field("timeout_secs", &self.timeout_duration.as_secs())
            .finish()
    }
}
