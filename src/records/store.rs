//! Record store client: write and read records on the deployed contract.
//!
//! # Responsibilities
//! - `storeData` through the build → sign → submit → receipt pipeline
//! - Recover the new record id from the `DataStored` event, or from the
//!   record count when the ABI declares no such event
//! - Read single records, the count, and the full list with read-only calls
//!
//! # Preconditions
//! The count fallback assumes this process is the only writer: with a
//! concurrent writer the count may already include someone else's record.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::U256;

use crate::blockchain::client::ChainClient;
use crate::blockchain::receipt::ReceiptWait;
use crate::blockchain::transaction::{GasPolicy, TxBuilder};
use crate::blockchain::types::{CallIntent, ChainResult, RecordChainError, TransactionReceipt};
use crate::blockchain::wallet::Wallet;
use crate::contract::ContractHandle;
use crate::deployment::DeploymentRecord;
use crate::records::types::{u64_from_u256, uint_to_u64, DataRecord, RecordId};

const STORE_DATA: &str = "storeData";
const GET_DATA: &str = "getData";
const GET_DATA_COUNT: &str = "getDataCount";
const DELETE_DATA: &str = "deleteData";
const DATA_STORED: &str = "DataStored";

/// Outcome of a successful `store_data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: RecordId,
    pub receipt: TransactionReceipt,
}

/// Reads and writes records on a deployed `DataStorage` contract.
pub struct RecordStore<C> {
    client: C,
    wallet: Wallet,
    contract: ContractHandle,
    gas: GasPolicy,
    wait: ReceiptWait,
}

impl<C: ChainClient> RecordStore<C> {
    pub fn new(
        client: C,
        wallet: Wallet,
        deployment: &DeploymentRecord,
        gas: GasPolicy,
        wait: ReceiptWait,
    ) -> Self {
        tracing::info!(
            contract = %deployment.contract_address,
            network = %deployment.network,
            "Record store ready"
        );
        Self {
            client,
            wallet,
            contract: deployment.contract(),
            gas,
            wait,
        }
    }

    pub fn contract(&self) -> &ContractHandle {
        &self.contract
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Store `content` as a new record and return its id.
    pub async fn store_data(&self, content: &str) -> ChainResult<RecordId> {
        Ok(self.store_data_with_receipt(content).await?.id)
    }

    /// Like `store_data`, also returning the mined receipt.
    pub async fn store_data_with_receipt(&self, content: &str) -> ChainResult<StoredRecord> {
        let input = self
            .contract
            .encode_call(STORE_DATA, &[DynSolValue::String(content.to_string())])?;
        let receipt = TxBuilder::new(&self.client, self.gas)
            .execute(
                &self.wallet,
                CallIntent::call(self.contract.address(), input),
                &self.wait,
            )
            .await?;

        let id = match self.id_from_logs(&receipt)? {
            Some(id) => id,
            None => {
                tracing::debug!(tx_hash = %receipt.tx_hash, "No DataStored event, reading record count");
                self.count().await?
            }
        };

        tracing::info!(
            record_id = id,
            tx_hash = %receipt.tx_hash,
            block = receipt.block_number,
            gas_used = receipt.gas_used,
            "Record stored"
        );
        Ok(StoredRecord { id, receipt })
    }

    /// Fetch one record. Ids outside `1..=count` are `NotFound`.
    pub async fn fetch_data(&self, id: RecordId) -> ChainResult<DataRecord> {
        self.check_id(id).await?;
        let values = match self
            .contract
            .call(&self.client, GET_DATA, &[uint(id)])
            .await
        {
            Ok(values) => values,
            Err(RecordChainError::CallReverted { .. }) => {
                return Err(RecordChainError::NotFound(id))
            }
            Err(e) => return Err(e),
        };
        DataRecord::from_values(&values)
    }

    /// Number of records ever stored, deleted ones included.
    pub async fn count(&self) -> ChainResult<u64> {
        let values = self.contract.call(&self.client, GET_DATA_COUNT, &[]).await?;
        let count = values.first().ok_or_else(|| {
            RecordChainError::Abi("getDataCount returned no value".to_string())
        })?;
        uint_to_u64(count, "count")
    }

    /// Every record, ids 1 through the current count, one call each.
    pub async fn fetch_all(&self) -> ChainResult<Vec<DataRecord>> {
        let count = self.count().await?;
        let mut records = Vec::with_capacity(count as usize);
        for id in 1..=count {
            records.push(self.fetch_data(id).await?);
        }
        Ok(records)
    }

    /// Logically delete a record. Requires `deleteData` in the recorded ABI.
    pub async fn delete_data(&self, id: RecordId) -> ChainResult<TransactionReceipt> {
        if !self.contract.has_function(DELETE_DATA) {
            return Err(RecordChainError::Abi(
                "deployed contract does not support deleteData".to_string(),
            ));
        }
        self.check_id(id).await?;

        let input = self.contract.encode_call(DELETE_DATA, &[uint(id)])?;
        let receipt = TxBuilder::new(&self.client, self.gas)
            .execute(
                &self.wallet,
                CallIntent::call(self.contract.address(), input),
                &self.wait,
            )
            .await?;
        tracing::info!(record_id = id, tx_hash = %receipt.tx_hash, "Record deleted");
        Ok(receipt)
    }

    async fn check_id(&self, id: RecordId) -> ChainResult<()> {
        if id == 0 || id > self.count().await? {
            return Err(RecordChainError::NotFound(id));
        }
        Ok(())
    }

    /// Id from a `DataStored(uint256 id, ...)` log emitted by the contract.
    ///
    /// `None` when the ABI declares no such event or the receipt holds none.
    fn id_from_logs(&self, receipt: &TransactionReceipt) -> ChainResult<Option<RecordId>> {
        let Some(event) = self.contract.event(DATA_STORED) else {
            return Ok(None);
        };
        let id_indexed = event.inputs.first().is_some_and(|param| param.indexed);
        let selector = event.selector();

        let Some(log) = receipt.logs.iter().find(|log| {
            log.address == self.contract.address()
                && log.data.topics().first() == Some(&selector)
        }) else {
            return Ok(None);
        };

        let word = if id_indexed {
            log.data.topics().get(1).map(|topic| topic.0)
        } else {
            log.data
                .data
                .get(..32)
                .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok())
        };
        let word = word.ok_or_else(|| {
            RecordChainError::Abi("DataStored event carries no record id".to_string())
        })?;
        u64_from_u256(U256::from_be_bytes(word), "record id").map(Some)
    }
}

fn uint(id: RecordId) -> DynSolValue {
    DynSolValue::Uint(U256::from(id), 256)
}
