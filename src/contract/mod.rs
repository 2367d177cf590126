//! Contract subsystem.
//!
//! # Data Flow
//! ```text
//! contracts/DataStorage.sol
//!     → compiler.rs (solc standard JSON → ABI + bytecode)
//!     → deployment (creation transaction)
//!     → handle.rs (address + ABI: encode calls, decode results)
//! ```

pub mod compiler;
pub mod handle;

pub use compiler::{CompiledContract, Compiler, ContractSource, SolcCompiler};
pub use handle::{deployment_payload, ContractHandle};
