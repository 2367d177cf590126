//! Compile, deploy, and record the contract.

use alloy::dyn_abi::DynSolValue;
use alloy::primitives::TxHash;
use std::path::Path;

use crate::blockchain::client::ChainClient;
use crate::blockchain::receipt::{await_receipt, ReceiptWait};
use crate::blockchain::transaction::{GasPolicy, TxBuilder};
use crate::blockchain::types::{
    CallIntent, ChainResult, RecordChainError, TransactionReceipt,
};
use crate::blockchain::wallet::Wallet;
use crate::config::{validate_credentials, RecordChainConfig};
use crate::contract::{deployment_payload, CompiledContract, Compiler, ContractSource};
use crate::deployment::record::{DeploymentRecord, DeploymentStore};
use crate::deployment::DeploymentStage;
use crate::observability::metrics;

/// Drives one deployment through its stages.
///
/// Stages only move forward. The first failure halts the sequence and is
/// returned wrapped with the stage that was being entered.
pub struct Deployer<C, K> {
    client: C,
    compiler: K,
    wallet: Wallet,
    store: DeploymentStore,
    network: String,
    gas: GasPolicy,
    wait: ReceiptWait,
    stage: DeploymentStage,
}

impl<C: ChainClient, K: Compiler> Deployer<C, K> {
    /// Validate credentials and take a connected client.
    ///
    /// Placeholder credentials are a `Configuration` error; callers check them
    /// before connecting, this repeats the check so no deployment can start
    /// with them.
    pub fn new(
        config: &RecordChainConfig,
        client: C,
        compiler: K,
        wait: ReceiptWait,
    ) -> ChainResult<Self> {
        validate_credentials(&config.account)
            .map_err(|e| RecordChainError::Configuration(e.to_string()))?;
        let wallet = Wallet::from_account(&config.account, client.chain_id())?;

        Ok(Self {
            client,
            compiler,
            wallet,
            store: DeploymentStore::new(&config.deployment.state_path),
            network: config.node.network.clone(),
            gas: GasPolicy::from(&config.transactions),
            wait,
            stage: DeploymentStage::Connected,
        })
    }

    pub fn stage(&self) -> DeploymentStage {
        self.stage
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run every remaining stage for the contract at `contract_path`.
    pub async fn deploy(
        &mut self,
        contract_path: &Path,
        constructor_args: &[DynSolValue],
    ) -> ChainResult<DeploymentRecord> {
        let compiled = self.compile(contract_path).await?;
        let tx_hash = self.submit(&compiled, constructor_args).await?;
        let receipt = self.mine(tx_hash).await?;
        self.record(compiled, &receipt)
    }

    async fn compile(&mut self, contract_path: &Path) -> ChainResult<CompiledContract> {
        let next = DeploymentStage::Compiled;
        self.expect_stage(DeploymentStage::Connected, next)?;

        let compiled = async {
            let source = ContractSource::read(contract_path)?;
            self.compiler.compile(&source).await
        }
        .await
        .map_err(|e| next.failed(e))?;

        self.advance(next);
        Ok(compiled)
    }

    async fn submit(
        &mut self,
        compiled: &CompiledContract,
        constructor_args: &[DynSolValue],
    ) -> ChainResult<TxHash> {
        let next = DeploymentStage::Submitted;
        self.expect_stage(DeploymentStage::Compiled, next)?;

        let tx_hash = async {
            let payload = deployment_payload(&compiled.bytecode, &compiled.abi, constructor_args)?;
            let builder = TxBuilder::new(&self.client, self.gas);
            let unsigned = builder
                .build(self.wallet.address(), CallIntent::create(payload))
                .await?;
            let signed = self.wallet.sign(&unsigned)?;
            let tx_hash = self.client.submit(&signed).await?;
            metrics::record_transaction_submitted("create");
            tracing::info!(
                tx_hash = %tx_hash,
                contract = %compiled.name,
                nonce = unsigned.nonce,
                gas_limit = unsigned.gas_limit,
                "Deployment transaction submitted"
            );
            Ok::<_, RecordChainError>(tx_hash)
        }
        .await
        .map_err(|e| next.failed(e))?;

        self.advance(next);
        Ok(tx_hash)
    }

    async fn mine(&mut self, tx_hash: TxHash) -> ChainResult<TransactionReceipt> {
        let next = DeploymentStage::Mined;
        self.expect_stage(DeploymentStage::Submitted, next)?;

        let receipt = await_receipt(&self.client, tx_hash, &self.wait)
            .await
            .map_err(|e| next.failed(e))?;
        metrics::record_gas_used("create", receipt.gas_used);
        if !receipt.success {
            return Err(next.failed(RecordChainError::Reverted(tx_hash)));
        }
        if receipt.contract_address.is_none() {
            return Err(next.failed(RecordChainError::Rpc(format!(
                "receipt for {} carries no contract address",
                tx_hash
            ))));
        }

        tracing::info!(
            contract_address = ?receipt.contract_address,
            gas_used = receipt.gas_used,
            block = receipt.block_number,
            "Contract deployed"
        );
        self.advance(next);
        Ok(receipt)
    }

    fn record(
        &mut self,
        compiled: CompiledContract,
        receipt: &TransactionReceipt,
    ) -> ChainResult<DeploymentRecord> {
        let next = DeploymentStage::Recorded;
        self.expect_stage(DeploymentStage::Mined, next)?;

        let contract_address = receipt.contract_address.ok_or_else(|| {
            next.failed(RecordChainError::Persistence(
                "mined receipt has no contract address".to_string(),
            ))
        })?;
        let record = DeploymentRecord {
            contract_name: compiled.name,
            contract_address,
            abi: compiled.abi,
            network: self.network.clone(),
            deployer: self.wallet.address(),
        };
        self.store.save(&record).map_err(|e| next.failed(e))?;

        self.advance(next);
        Ok(record)
    }

    fn expect_stage(&self, expected: DeploymentStage, next: DeploymentStage) -> ChainResult<()> {
        if self.stage != expected {
            return Err(next.failed(RecordChainError::Configuration(format!(
                "deployment is at stage {}, cannot move to {}",
                self.stage, next
            ))));
        }
        Ok(())
    }

    fn advance(&mut self, next: DeploymentStage) {
        tracing::debug!(from = %self.stage, to = %next, "Deployment stage reached");
        self.stage = next;
    }
}
