//! Deployment record persistence.
//!
//! The record is the hand-off between `deploy` and every later record
//! session: `{contract_name, contract_address, abi, network, deployer}`.

use alloy::json_abi::JsonAbi;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::blockchain::types::{ChainResult, RecordChainError};
use crate::contract::ContractHandle;

/// A successful deployment, written once and read by every later session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub contract_name: String,
    /// Taken from a successful creation receipt. Never zero.
    pub contract_address: Address,
    pub abi: JsonAbi,
    /// Network label, e.g. "Ganache Local".
    pub network: String,
    pub deployer: Address,
}

impl DeploymentRecord {
    /// Handle for talking to the recorded contract.
    pub fn contract(&self) -> ContractHandle {
        ContractHandle::new(self.contract_address, self.abi.clone())
    }
}

/// JSON file holding the deployment record.
#[derive(Debug, Clone)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Write the record, replacing any previous deployment.
    pub fn save(&self, record: &DeploymentRecord) -> ChainResult<()> {
        if record.contract_address.is_zero() {
            return Err(RecordChainError::Persistence(
                "refusing to record a deployment without a contract address".to_string(),
            ));
        }

        let file = File::create(&self.path).map_err(|e| self.io_error("writing", e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record)
            .map_err(|e| RecordChainError::Persistence(format!("serializing record: {}", e)))?;
        writer.flush().map_err(|e| self.io_error("writing", e))?;

        tracing::info!(
            path = %self.path.display(),
            contract = %record.contract_address,
            "Deployment record saved"
        );
        Ok(())
    }

    /// Read the record. A missing file is `MissingDeployment`.
    pub fn load(&self) -> ChainResult<DeploymentRecord> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RecordChainError::MissingDeployment(
                    self.path.display().to_string(),
                ))
            }
            Err(e) => return Err(self.io_error("reading", e)),
        };

        let record: DeploymentRecord = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| {
                RecordChainError::Persistence(format!(
                    "{} is not a valid deployment record: {}",
                    self.path.display(),
                    e
                ))
            })?;
        if record.contract_address.is_zero() {
            return Err(RecordChainError::Persistence(format!(
                "{} records no contract address",
                self.path.display()
            )));
        }
        Ok(record)
    }

    fn io_error(&self, action: &str, e: std::io::Error) -> RecordChainError {
        RecordChainError::Persistence(format!("{} {}: {}", action, self.path.display(), e))
    }
}
