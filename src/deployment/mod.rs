//! Deployment subsystem.
//!
//! # Data Flow
//! ```text
//! Unconfigured → Connected → Compiled → Submitted → Mined → Recorded
//!   config        client      solc       creation tx  receipt  deployment_info.json
//! ```
//!
//! # Design Decisions
//! - Linear: no stage is revisited, no partial-deployment retry
//! - Failures carry the stage they happened in
//! - The persisted record is the only hand-off to the record client

pub mod orchestrator;
pub mod record;

use std::fmt;

use crate::blockchain::types::RecordChainError;

pub use orchestrator::Deployer;
pub use record::{DeploymentRecord, DeploymentStore};

/// Deployment progress, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeploymentStage {
    Unconfigured,
    Connected,
    Compiled,
    Submitted,
    Mined,
    Recorded,
}

impl DeploymentStage {
    /// Wrap an error raised while trying to reach this stage.
    pub fn failed(self, source: RecordChainError) -> RecordChainError {
        RecordChainError::Deployment {
            stage: self,
            source: Box::new(source),
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentStage::Unconfigured => "unconfigured",
            DeploymentStage::Connected => "connected",
            DeploymentStage::Compiled => "compiled",
            DeploymentStage::Submitted => "submitted",
            DeploymentStage::Mined => "mined",
            DeploymentStage::Recorded => "recorded",
        };
        f.write_str(name)
    }
}
