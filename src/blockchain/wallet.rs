//! Wallet management and transaction signing.
//!
//! # Security
//! - The private key is read once, from configuration, when the wallet is built
//! - Keys are never logged or serialized

use alloy::consensus::{SignableTransaction, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;

use crate::blockchain::types::{
    ChainResult, RecordChainError, SignedTransaction, UnsignedTransaction,
};
use crate::config::AccountConfig;

/// Holds the configured account key and signs transactions with it.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
}

impl Wallet {
    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> ChainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| RecordChainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self { signer, chain_id })
    }

    /// Build the wallet for the configured account.
    ///
    /// The configured address must be the one the key controls.
    pub fn from_account(account: &AccountConfig, chain_id: u64) -> ChainResult<Self> {
        let wallet = Self::from_private_key(&account.private_key, chain_id)?;
        let configured: Address = account.address.parse().map_err(|e| {
            RecordChainError::Configuration(format!(
                "Invalid account address '{}': {}",
                account.address, e
            ))
        })?;
        if configured != wallet.address() {
            return Err(RecordChainError::Wallet(format!(
                "private key controls {}, not the configured account {}",
                wallet.address(),
                configured
            )));
        }
        Ok(wallet)
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Sign a built transaction.
    ///
    /// Deterministic: the same transaction and key always produce the same
    /// raw bytes (RFC 6979 nonces).
    pub fn sign(&self, tx: &UnsignedTransaction) -> ChainResult<SignedTransaction> {
        if tx.from != self.address() {
            return Err(RecordChainError::Wallet(format!(
                "transaction sender {} is not the wallet account {}",
                tx.from,
                self.address()
            )));
        }
        if tx.chain_id != self.chain_id {
            return Err(RecordChainError::ChainMismatch {
                expected: self.chain_id,
                actual: tx.chain_id,
            });
        }

        let legacy = tx.to_legacy();
        let signature = self
            .signer
            .sign_hash_sync(&legacy.signature_hash())
            .map_err(|e| RecordChainError::Wallet(format!("Signing failed: {}", e)))?;
        let signed = legacy.into_signed(signature);
        let hash = *signed.hash();
        let raw = TxEnvelope::Legacy(signed).encoded_2718();

        tracing::debug!(tx_hash = %hash, nonce = tx.nonce, "Transaction signed");

        Ok(SignedTransaction {
            raw: raw.into(),
            hash,
            from: tx.from,
            nonce: tx.nonce,
        })
    }
}
