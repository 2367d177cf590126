//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from the TOML config file.

use serde::{Deserialize, Serialize};

use crate::blockchain::transaction::{DEFAULT_FALLBACK_GAS_LIMIT, DEFAULT_GAS_PADDING_PERCENT};

/// Marker left in the shipped config for values the operator must fill in.
pub const PLACEHOLDER_MARKER: &str = "REPLACE";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RecordChainConfig {
    /// RPC node settings.
    pub node: NodeConfig,

    /// Deploying and writing account.
    pub account: AccountConfig,

    /// Solidity compiler settings.
    pub compiler: CompilerConfig,

    /// Gas policy and receipt waiting.
    pub transactions: TransactionConfig,

    /// Contract source and deployment state locations.
    pub deployment: DeploymentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// RPC node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Expected chain ID (1337 for Ganache, 31337 for Anvil). Not checked when absent.
    pub chain_id: Option<u64>,

    /// Label stored in the deployment record.
    pub network: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain_id: None,
            network: "Ganache Local".to_string(),
            rpc_timeout_secs: 10,
        }
    }
}

/// The single account this process acts as.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Account address (0x-prefixed hex).
    pub address: String,

    /// Hex private key for `address`.
    pub private_key: String,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            address: "REPLACE_WITH_ACCOUNT_ADDRESS".to_string(),
            private_key: "REPLACE_WITH_PRIVATE_KEY".to_string(),
        }
    }
}

impl AccountConfig {
    /// True while either credential still holds the shipped placeholder.
    pub fn has_placeholder(&self) -> bool {
        self.address.contains(PLACEHOLDER_MARKER) || self.private_key.contains(PLACEHOLDER_MARKER)
    }
}

impl std::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("address", &self.address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Solidity compiler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Path to the `solc` binary.
    pub solc_path: String,

    /// Required compiler version, matched against `solc --version`.
    pub solc_version: String,

    /// Optimizer runs (the optimizer is always enabled).
    pub optimizer_runs: u32,

    /// Target EVM version.
    pub evm_version: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            solc_path: "solc".to_string(),
            solc_version: "0.8.19".to_string(),
            optimizer_runs: 200,
            evm_version: "london".to_string(),
        }
    }
}

/// Gas policy and receipt waiting.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Gas limit used when estimation fails.
    pub fallback_gas_limit: u64,

    /// Gas estimate padding in percent (120 = estimate × 1.2).
    pub gas_padding_percent: u64,

    /// Maximum time to wait for a receipt, in seconds.
    pub receipt_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_interval_ms: u64,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            fallback_gas_limit: DEFAULT_FALLBACK_GAS_LIMIT,
            gas_padding_percent: DEFAULT_GAS_PADDING_PERCENT,
            receipt_timeout_secs: 120,
            receipt_poll_interval_ms: 500,
        }
    }
}

/// Contract source and deployment state locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Solidity source of the record contract.
    pub contract_path: String,

    /// Where the deployment record is written and read.
    pub state_path: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            contract_path: "contracts/DataStorage.sol".to_string(),
            state_path: "deployment_info.json".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
