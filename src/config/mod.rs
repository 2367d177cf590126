//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, env override of the private key)
//!     → validation.rs (placeholder and range checks)
//!     → RecordChainConfig (validated, immutable)
//!     → passed by reference into every component constructor
//! ```
//!
//! # Design Decisions
//! - Config is loaded once per process and never mutated
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AccountConfig, CompilerConfig, DeploymentConfig, NodeConfig, ObservabilityConfig,
    RecordChainConfig, TransactionConfig,
};
pub use validation::{validate_config, validate_credentials, ValidationError};
