//! Record subsystem.
//!
//! # Data Flow
//! ```text
//! deployment_info.json → RecordStore
//!     store:  TxBuilder → Wallet → ChainClient → receipt → record id
//!     fetch:  ContractHandle::call (eth_call, no gas)
//! ```

pub mod store;
pub mod types;

pub use store::{RecordStore, StoredRecord};
pub use types::{DataRecord, RecordId};
