//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration (private key, RPC URL)
//!     → wallet.rs (key loading, signing)
//!     → client.rs (RPC connection with timeouts)
//!     → transaction.rs (build, sign, submit)
//!     → receipt.rs (bounded wait for the mined receipt)
//! ```
//!
//! # Security Constraints
//! - Private keys only from configuration, read once by the wallet
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts

pub mod client;
pub mod receipt;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{ChainClient, RpcChainClient};
pub use receipt::{await_receipt, ReceiptWait};
pub use transaction::{GasPolicy, TxBuilder};
pub use types::{
    CallIntent, ChainEndpoint, ChainId, ChainResult, RecordChainError, SignedTransaction,
    TransactionReceipt, UnsignedTransaction,
};
pub use wallet::Wallet;
