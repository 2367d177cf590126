//! Chain-specific types and error definitions.

use alloy::consensus::TxLegacy;
use alloy::primitives::{Address, Bytes, Log, TxHash, TxKind, U256};
use thiserror::Error;

use crate::deployment::DeploymentStage;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// The node this process talks to. Resolved once at connect time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainEndpoint {
    /// JSON-RPC URL of the node.
    pub url: String,
    /// Chain id reported by the node.
    pub chain_id: ChainId,
}

/// Errors that can occur while deploying to or talking with the chain.
#[derive(Debug, Error)]
pub enum RecordChainError {
    /// Missing, malformed or placeholder configuration. Raised before any connection.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The node could not be reached.
    #[error("Cannot connect to node at {url}: {reason}")]
    Connection { url: String, reason: String },

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Contract source could not be compiled.
    #[error("Compilation failed: {0}")]
    Compilation(String),

    /// Gas estimation failed (the transaction builder absorbs this one).
    #[error("Gas estimation failed: {0}")]
    Estimation(String),

    /// The node refused a raw transaction.
    #[error("Transaction submission failed: {0}")]
    Submission(String),

    /// The node refused a raw transaction because its nonce is stale or reused.
    #[error("Nonce {nonce} rejected by node: {reason}")]
    NonceConflict { nonce: u64, reason: String },

    /// No receipt showed up within the configured bound.
    #[error("Transaction {tx_hash} not mined after {waited_secs} seconds")]
    ReceiptTimeout { tx_hash: TxHash, waited_secs: u64 },

    /// The receipt wait was interrupted by a shutdown signal.
    #[error("Wait for transaction {0} was cancelled")]
    Cancelled(TxHash),

    /// Transaction was mined with a failure status.
    #[error("Transaction {0} reverted")]
    Reverted(TxHash),

    /// A read-only call reverted.
    #[error("Call to {to} reverted: {reason}")]
    CallReverted { to: Address, reason: String },

    /// Record id outside `1..=count`.
    #[error("Record {0} not found")]
    NotFound(u64),

    /// No deployment state on disk.
    #[error("No deployment record found at {0}; run `record-chain deploy` first")]
    MissingDeployment(String),

    /// Encoding or decoding against the contract ABI failed.
    #[error("ABI error: {0}")]
    Abi(String),

    /// Reading or writing the deployment state failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Invalid private key format or signing error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// RPC request failed.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// RPC request timed out.
    #[error("RPC {method} timed out after {secs} seconds")]
    Timeout { method: &'static str, secs: u64 },

    /// A deployment step failed; the sequence halted at `stage`.
    #[error("Deployment failed at stage {stage}: {source}")]
    Deployment {
        stage: DeploymentStage,
        #[source]
        source: Box<RecordChainError>,
    },
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, RecordChainError>;

/// What a caller wants executed: a contract creation or a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallIntent {
    /// Target contract. `None` creates a contract from `input`.
    pub to: Option<Address>,
    /// Calldata, or creation code followed by constructor arguments.
    pub input: Bytes,
    /// Fixed gas limit. Skips estimation when set.
    pub gas_limit: Option<u64>,
}

impl CallIntent {
    /// Contract creation with the given init code.
    pub fn create(init_code: Bytes) -> Self {
        Self {
            to: None,
            input: init_code,
            gas_limit: None,
        }
    }

    /// Call into an existing contract.
    pub fn call(to: Address, input: Bytes) -> Self {
        Self {
            to: Some(to),
            input,
            gas_limit: None,
        }
    }

    pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// A fully assembled transaction that has not been signed yet.
///
/// Built fresh for every submission; a new nonce makes an old one useless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub from: Address,
    pub chain_id: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub input: Bytes,
}

impl UnsignedTransaction {
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }

    /// Legacy (EIP-155) form, the format development nodes accept without fee-market fields.
    pub fn to_legacy(&self) -> TxLegacy {
        TxLegacy {
            chain_id: Some(self.chain_id),
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to.map_or(TxKind::Create, TxKind::Call),
            value: U256::ZERO,
            input: self.input.clone(),
        }
    }
}

/// Raw signed transaction ready for `eth_sendRawTransaction`. Single use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    /// EIP-2718 encoded bytes.
    pub raw: Bytes,
    pub hash: TxHash,
    pub from: Address,
    /// Nonce consumed by this transaction.
    pub nonce: u64,
}

/// Node confirmation that a transaction was included in a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    pub gas_used: u64,
    pub success: bool,
    /// Set for contract creations.
    pub contract_address: Option<Address>,
    pub logs: Vec<Log>,
}

impl From<alloy::rpc::types::TransactionReceipt> for TransactionReceipt {
    fn from(receipt: alloy::rpc::types::TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number.unwrap_or_default(),
            gas_used: receipt.gas_used,
            success: receipt.status(),
            contract_address: receipt.contract_address,
            logs: receipt
                .inner
                .logs()
                .iter()
                .map(|log| log.inner.clone())
                .collect(),
        }
    }
}
