//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject placeholder credentials before any connection is attempted
//! - Validate value ranges (timeouts > 0, padding >= 100%)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RecordChainConfig → Result<(), Vec<ValidationError>>

use alloy::primitives::Address;
use thiserror::Error;

use crate::config::schema::{AccountConfig, RecordChainConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Credentials still hold the shipped `REPLACE_...` values.
    #[error("account credentials are placeholders; copy an address and its private key from your development node")]
    PlaceholderCredentials,

    #[error("account address '{0}' is not a valid address")]
    InvalidAddress(String),

    #[error("private key is empty")]
    MissingPrivateKey,

    #[error("RPC URL '{0}' is not a valid URL")]
    InvalidRpcUrl(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("gas_padding_percent must be at least 100, got {0}")]
    PaddingTooSmall(u64),

    #[error("compiler {field} must not be empty")]
    EmptyCompilerSetting { field: &'static str },
}

/// Credential checks only. Runs before anything talks to the node.
pub fn validate_credentials(account: &AccountConfig) -> Result<(), ValidationError> {
    if account.has_placeholder() {
        return Err(ValidationError::PlaceholderCredentials);
    }
    if account.private_key.trim().is_empty() {
        return Err(ValidationError::MissingPrivateKey);
    }
    if account.address.parse::<Address>().is_err() {
        return Err(ValidationError::InvalidAddress(account.address.clone()));
    }
    Ok(())
}

/// Validate the whole configuration, collecting every problem.
pub fn validate_config(config: &RecordChainConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = validate_credentials(&config.account) {
        errors.push(e);
    }

    if config.node.rpc_url.parse::<url::Url>().is_err() {
        errors.push(ValidationError::InvalidRpcUrl(config.node.rpc_url.clone()));
    }
    if config.node.rpc_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "rpc_timeout_secs",
        });
    }

    let tx = &config.transactions;
    if tx.fallback_gas_limit == 0 {
        errors.push(ValidationError::Zero {
            field: "fallback_gas_limit",
        });
    }
    if tx.gas_padding_percent < 100 {
        errors.push(ValidationError::PaddingTooSmall(tx.gas_padding_percent));
    }
    if tx.receipt_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "receipt_timeout_secs",
        });
    }
    if tx.receipt_poll_interval_ms == 0 {
        errors.push(ValidationError::Zero {
            field: "receipt_poll_interval_ms",
        });
    }

    if config.compiler.solc_version.trim().is_empty() {
        errors.push(ValidationError::EmptyCompilerSetting {
            field: "solc_version",
        });
    }
    if config.compiler.evm_version.trim().is_empty() {
        errors.push(ValidationError::EmptyCompilerSetting {
            field: "evm_version",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
