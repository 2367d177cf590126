//! Record chain: deploy a record-keeping contract to a development node and
//! store and read records on it through locally signed transactions.

pub mod blockchain;
pub mod config;
pub mod contract;
pub mod deployment;
pub mod lifecycle;
pub mod observability;
pub mod records;

pub use blockchain::{ChainClient, RecordChainError, RpcChainClient, Wallet};
pub use config::RecordChainConfig;
pub use deployment::{Deployer, DeploymentRecord, DeploymentStore};
pub use lifecycle::Shutdown;
pub use records::{DataRecord, RecordStore};
