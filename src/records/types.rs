//! On-chain record types.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blockchain::types::{ChainResult, RecordChainError};

/// Contract-assigned record id. Dense, starting at 1.
pub type RecordId = u64;

/// A record as returned by `getData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataRecord {
    pub id: RecordId,
    pub content: String,
    pub creator: Address,
    /// Block timestamp at creation, seconds since epoch.
    pub timestamp: u64,
    /// False once logically deleted. Records are never removed.
    pub active: bool,
}

impl DataRecord {
    /// Decode `(uint256 id, string content, address creator, uint256 timestamp, bool active)`.
    pub fn from_values(values: &[DynSolValue]) -> ChainResult<Self> {
        let [id, content, creator, timestamp, active] = values else {
            return Err(RecordChainError::Abi(format!(
                "getData returned {} values, expected 5",
                values.len()
            )));
        };

        Ok(Self {
            id: uint_to_u64(id, "id")?,
            content: content
                .as_str()
                .ok_or_else(|| field_error("content", "string"))?
                .to_string(),
            creator: creator
                .as_address()
                .ok_or_else(|| field_error("creator", "address"))?,
            timestamp: uint_to_u64(timestamp, "timestamp")?,
            active: active.as_bool().ok_or_else(|| field_error("active", "bool"))?,
        })
    }

    /// Creation time as a UTC datetime.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        i64::try_from(self.timestamp)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// "Active" or "Deleted".
    pub fn status(&self) -> &'static str {
        if self.active {
            "Active"
        } else {
            "Deleted"
        }
    }
}

/// Decode a `uint256` that must fit in a `u64`.
pub fn uint_to_u64(value: &DynSolValue, field: &str) -> ChainResult<u64> {
    let (number, _) = value
        .as_uint()
        .ok_or_else(|| field_error(field, "uint256"))?;
    u64_from_u256(number, field)
}

pub fn u64_from_u256(number: U256, field: &str) -> ChainResult<u64> {
    u64::try_from(number)
        .map_err(|_| RecordChainError::Abi(format!("{} {} does not fit in 64 bits", field, number)))
}

fn field_error(field: &str, expected: &str) -> RecordChainError {
    RecordChainError::Abi(format!("getData field `{}` is not a {}", field, expected))
}
