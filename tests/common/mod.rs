//! Shared utilities for integration testing: an in-memory chain running a
//! `DataStorage` model, and a compiler stub.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::consensus::{SignableTransaction, TxEnvelope};
use alloy::dyn_abi::{DynSolValue, FunctionExt, JsonAbiExt};
use alloy::eips::eip2718::Decodable2718;
use alloy::json_abi::{Function, JsonAbi};
use alloy::primitives::{keccak256, Address, Bytes, Log, TxHash, TxKind, B256, U256};

use record_chain::blockchain::{
    CallIntent, ChainClient, ChainResult, GasPolicy, ReceiptWait, RecordChainError,
    SignedTransaction, TransactionReceipt, Wallet,
};
use record_chain::config::RecordChainConfig;
use record_chain::contract::{CompiledContract, Compiler, ContractSource};
use record_chain::deployment::{Deployer, DeploymentRecord};
use record_chain::lifecycle::Shutdown;
use record_chain::records::RecordStore;

/// First Anvil/Hardhat development account.
pub const DEV_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";
pub const DEV_PRIVATE_KEY: &str =
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

pub const CHAIN_ID: u64 = 1337;
pub const GAS_PRICE: u128 = 20_000_000_000;
pub const BASE_TIMESTAMP: u64 = 1_700_000_000;

pub const DATA_STORAGE_ABI: &str = r#"[
    {"type":"function","name":"storeData","stateMutability":"nonpayable",
     "inputs":[{"name":"_content","type":"string","internalType":"string"}],
     "outputs":[{"name":"","type":"uint256","internalType":"uint256"}]},
    {"type":"function","name":"getData","stateMutability":"view",
     "inputs":[{"name":"_id","type":"uint256","internalType":"uint256"}],
     "outputs":[
        {"name":"","type":"uint256","internalType":"uint256"},
        {"name":"","type":"string","internalType":"string"},
        {"name":"","type":"address","internalType":"address"},
        {"name":"","type":"uint256","internalType":"uint256"},
        {"name":"","type":"bool","internalType":"bool"}]},
    {"type":"function","name":"getDataCount","stateMutability":"view",
     "inputs":[],
     "outputs":[{"name":"","type":"uint256","internalType":"uint256"}]},
    {"type":"function","name":"deleteData","stateMutability":"nonpayable",
     "inputs":[{"name":"_id","type":"uint256","internalType":"uint256"}],
     "outputs":[]},
    {"type":"event","name":"DataStored","anonymous":false,
     "inputs":[
        {"name":"id","type":"uint256","indexed":true,"internalType":"uint256"},
        {"name":"creator","type":"address","indexed":true,"internalType":"address"},
        {"name":"timestamp","type":"uint256","indexed":false,"internalType":"uint256"}]}
]"#;

pub fn data_storage_abi() -> JsonAbi {
    serde_json::from_str(DATA_STORAGE_ABI).unwrap()
}

pub fn dev_address() -> Address {
    DEV_ADDRESS.parse().unwrap()
}

/// Valid configuration for the dev account, with state kept under `dir`.
pub fn test_config(dir: &Path) -> RecordChainConfig {
    let mut config = RecordChainConfig::default();
    config.account.address = DEV_ADDRESS.to_string();
    config.account.private_key = DEV_PRIVATE_KEY.to_string();
    config.node.network = "Test Chain".to_string();
    config.deployment.contract_path = concat!(env!("CARGO_MANIFEST_DIR"), "/contracts/DataStorage.sol").to_string();
    config.deployment.state_path = dir.join("deployment_info.json").display().to_string();
    config.transactions.receipt_timeout_secs = 5;
    config.transactions.receipt_poll_interval_ms = 10;
    config
}

pub fn quick_wait(shutdown: Shutdown) -> ReceiptWait {
    ReceiptWait::new(Duration::from_secs(5), Duration::from_millis(10), shutdown)
}

/// Deploy the contract described by `compiler` onto `chain`.
pub async fn deploy_with(
    config: &RecordChainConfig,
    chain: &FakeChain,
    compiler: StubCompiler,
) -> DeploymentRecord {
    let mut deployer =
        Deployer::new(config, chain.clone(), compiler, quick_wait(Shutdown::new())).unwrap();
    deployer
        .deploy(Path::new(&config.deployment.contract_path), &[])
        .await
        .unwrap()
}

/// Record store acting as the dev account on `chain`.
pub fn record_store(
    config: &RecordChainConfig,
    chain: &FakeChain,
    deployment: &DeploymentRecord,
    wait: ReceiptWait,
) -> RecordStore<FakeChain> {
    let wallet = Wallet::from_account(&config.account, CHAIN_ID).unwrap();
    RecordStore::new(
        chain.clone(),
        wallet,
        deployment,
        GasPolicy::from(&config.transactions),
        wait,
    )
}

/// Fresh chain with `DataStorage` deployed and a store ready to use it.
pub async fn deployed_store(config: &RecordChainConfig) -> (FakeChain, RecordStore<FakeChain>) {
    let chain = FakeChain::new();
    let deployment = deploy_with(config, &chain, StubCompiler::default()).await;
    let store = record_store(config, &chain, &deployment, quick_wait(Shutdown::new()));
    (chain, store)
}

/// What the chain saw for one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub from: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub creation: bool,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    content: String,
    creator: Address,
    timestamp: u64,
    active: bool,
}

#[derive(Default)]
struct ChainState {
    nonces: HashMap<Address, u64>,
    contract: Option<Address>,
    records: Vec<StoredEntry>,
    receipts: HashMap<TxHash, TransactionReceipt>,
    block_number: u64,
    submissions: Vec<Submission>,
    submit_attempts: usize,
    gas_estimate: u64,
    fail_estimation: bool,
    hold_receipts: bool,
    stale_nonces: bool,
    emit_events: bool,
}

/// In-memory chain that executes signed transactions against a `DataStorage` model.
///
/// Raw transactions are decoded and their signatures recovered, so nonces,
/// senders and gas limits are the ones the wallet actually signed.
#[derive(Clone)]
pub struct FakeChain {
    abi: Arc<JsonAbi>,
    state: Arc<Mutex<ChainState>>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeChain {
    pub fn new() -> Self {
        let state = ChainState {
            gas_estimate: 50_000,
            emit_events: true,
            ..ChainState::default()
        };
        Self {
            abi: Arc::new(data_storage_abi()),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Make every gas estimate fail.
    pub fn fail_estimation(&self, fail: bool) {
        self.state.lock().unwrap().fail_estimation = fail;
    }

    pub fn set_gas_estimate(&self, estimate: u64) {
        self.state.lock().unwrap().gas_estimate = estimate;
    }

    /// Keep every transaction pending: `receipt` returns `None`.
    pub fn hold_receipts(&self, hold: bool) {
        self.state.lock().unwrap().hold_receipts = hold;
    }

    /// Report nonces one behind, as if another writer got in first.
    pub fn report_stale_nonces(&self, stale: bool) {
        self.state.lock().unwrap().stale_nonces = stale;
    }

    /// Stop emitting `DataStored` logs.
    pub fn emit_events(&self, emit: bool) {
        self.state.lock().unwrap().emit_events = emit;
    }

    /// Store a record directly, as another writer would.
    pub fn insert_foreign_record(&self, content: &str, creator: Address) {
        let mut state = self.state.lock().unwrap();
        let timestamp = BASE_TIMESTAMP + state.block_number;
        state.records.push(StoredEntry {
            content: content.to_string(),
            creator,
            timestamp,
            active: true,
        });
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submit_attempts(&self) -> usize {
        self.state.lock().unwrap().submit_attempts
    }

    pub fn contract_address(&self) -> Option<Address> {
        self.state.lock().unwrap().contract
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().unwrap().records.len()
    }

    fn function(&self, name: &str) -> &Function {
        &self.abi.function(name).unwrap()[0]
    }

    /// Function whose selector prefixes `input`.
    fn dispatch<'a>(&'a self, input: &[u8]) -> Option<&'a Function> {
        let selector = input.get(..4)?;
        self.abi
            .functions()
            .find(|function| function.selector().as_slice() == selector)
    }

    fn record_output(&self, state: &ChainState, id: u64) -> Option<Vec<u8>> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        let entry = state.records.get(index)?;
        let values = [
            DynSolValue::Uint(U256::from(id), 256),
            DynSolValue::String(entry.content.clone()),
            DynSolValue::Address(entry.creator),
            DynSolValue::Uint(U256::from(entry.timestamp), 256),
            DynSolValue::Bool(entry.active),
        ];
        self.function("getData").abi_encode_output(&values).ok()
    }

    /// Apply a call transaction. Returns success and emitted logs.
    fn execute_call(
        &self,
        state: &mut ChainState,
        from: Address,
        to: Address,
        input: &[u8],
    ) -> (bool, Vec<Log>) {
        if state.contract != Some(to) {
            return (false, Vec::new());
        }
        let Some(function) = self.dispatch(input) else {
            return (false, Vec::new());
        };
        let Ok(args) = function.abi_decode_input(&input[4..]) else {
            return (false, Vec::new());
        };

        match function.name.as_str() {
            "storeData" => {
                let Some(content) = args.first().and_then(|value| value.as_str()) else {
                    return (false, Vec::new());
                };
                let timestamp = BASE_TIMESTAMP + state.block_number;
                state.records.push(StoredEntry {
                    content: content.to_string(),
                    creator: from,
                    timestamp,
                    active: true,
                });
                let id = state.records.len() as u64;

                let mut logs = Vec::new();
                if state.emit_events {
                    let event = &self.abi.event("DataStored").unwrap()[0];
                    logs.push(Log::new_unchecked(
                        to,
                        vec![
                            event.selector(),
                            B256::from(U256::from(id).to_be_bytes::<32>()),
                            from.into_word(),
                        ],
                        Bytes::from(U256::from(timestamp).to_be_bytes::<32>().to_vec()),
                    ));
                }
                (true, logs)
            }
            "deleteData" => {
                let Some((id, _)) = args.first().and_then(|value| value.as_uint()) else {
                    return (false, Vec::new());
                };
                let Some(index) = usize::try_from(id)
                    .ok()
                    .and_then(|id| id.checked_sub(1))
                    .filter(|index| *index < state.records.len())
                else {
                    return (false, Vec::new());
                };
                state.records[index].active = false;
                (true, Vec::new())
            }
            _ => (false, Vec::new()),
        }
    }
}

impl ChainClient for FakeChain {
    fn chain_id(&self) -> u64 {
        CHAIN_ID
    }

    async fn nonce_for(&self, address: Address) -> ChainResult<u64> {
        let state = self.state.lock().unwrap();
        let nonce = state.nonces.get(&address).copied().unwrap_or(0);
        if state.stale_nonces {
            Ok(nonce.saturating_sub(1))
        } else {
            Ok(nonce)
        }
    }

    async fn gas_price(&self) -> ChainResult<u128> {
        Ok(GAS_PRICE)
    }

    async fn estimate_gas(&self, _from: Address, _intent: &CallIntent) -> ChainResult<u64> {
        let state = self.state.lock().unwrap();
        if state.fail_estimation {
            return Err(RecordChainError::Estimation(
                "execution reverted".to_string(),
            ));
        }
        Ok(state.gas_estimate)
    }

    async fn submit(&self, tx: &SignedTransaction) -> ChainResult<TxHash> {
        let mut state = self.state.lock().unwrap();
        state.submit_attempts += 1;

        let envelope = TxEnvelope::decode_2718(&mut tx.raw.as_ref())
            .map_err(|e| RecordChainError::Submission(format!("undecodable transaction: {}", e)))?;
        let TxEnvelope::Legacy(signed) = envelope else {
            return Err(RecordChainError::Submission(
                "only legacy transactions are accepted".to_string(),
            ));
        };
        let from = signed
            .signature()
            .recover_address_from_prehash(&signed.tx().signature_hash())
            .map_err(|e| RecordChainError::Submission(format!("bad signature: {}", e)))?;
        let legacy = signed.tx();

        let expected = state.nonces.get(&from).copied().unwrap_or(0);
        if legacy.nonce != expected {
            return Err(RecordChainError::NonceConflict {
                nonce: legacy.nonce,
                reason: format!("nonce too low: next nonce {}", expected),
            });
        }
        state.nonces.insert(from, expected + 1);
        state.block_number += 1;

        let (success, contract_address, logs) = match legacy.to {
            TxKind::Create => {
                let address = from.create(legacy.nonce);
                state.contract = Some(address);
                (true, Some(address), Vec::new())
            }
            TxKind::Call(to) => {
                let (success, logs) = self.execute_call(&mut state, from, to, &legacy.input);
                (success, None, logs)
            }
        };

        state.submissions.push(Submission {
            from,
            nonce: legacy.nonce,
            gas_limit: legacy.gas_limit,
            creation: legacy.to.is_create(),
        });

        let tx_hash = keccak256(&tx.raw);
        let receipt = TransactionReceipt {
            tx_hash,
            block_number: state.block_number,
            gas_used: legacy.gas_limit.min(45_000),
            success,
            contract_address,
            logs,
        };
        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn receipt(&self, tx_hash: TxHash) -> ChainResult<Option<TransactionReceipt>> {
        let state = self.state.lock().unwrap();
        if state.hold_receipts {
            return Ok(None);
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }

    async fn call(&self, to: Address, input: Bytes) -> ChainResult<Bytes> {
        let state = self.state.lock().unwrap();
        let reverted = |reason: &str| RecordChainError::CallReverted {
            to,
            reason: reason.to_string(),
        };
        if state.contract != Some(to) {
            return Err(reverted("no contract at address"));
        }
        let function = self.dispatch(&input).ok_or_else(|| reverted("unknown selector"))?;

        let output = match function.name.as_str() {
            "getDataCount" => function
                .abi_encode_output(&[DynSolValue::Uint(U256::from(state.records.len()), 256)])
                .map_err(|e| reverted(&e.to_string()))?,
            "getData" => {
                let args = function
                    .abi_decode_input(&input[4..])
                    .map_err(|e| reverted(&e.to_string()))?;
                let id = args
                    .first()
                    .and_then(|value| value.as_uint())
                    .and_then(|(id, _)| u64::try_from(id).ok())
                    .ok_or_else(|| reverted("bad id"))?;
                self.record_output(&state, id)
                    .ok_or_else(|| reverted("Record does not exist"))?
            }
            _ => return Err(reverted("not a view function")),
        };
        Ok(output.into())
    }
}

/// Compiler stand-in returning the `DataStorage` fixture.
#[derive(Clone, Default)]
pub struct StubCompiler {
    pub failure: Option<String>,
    pub abi: Option<JsonAbi>,
}

impl StubCompiler {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            abi: None,
        }
    }

    pub fn with_abi(abi: JsonAbi) -> Self {
        Self {
            failure: None,
            abi: Some(abi),
        }
    }
}

impl Compiler for StubCompiler {
    async fn compile(&self, source: &ContractSource) -> ChainResult<CompiledContract> {
        if let Some(message) = &self.failure {
            return Err(RecordChainError::Compilation(message.clone()));
        }
        Ok(CompiledContract {
            name: source.stem().to_string(),
            abi: self.abi.clone().unwrap_or_else(data_storage_abi),
            bytecode: Bytes::from_static(&[0x60, 0x80, 0x60, 0x40, 0x52]),
        })
    }
}
