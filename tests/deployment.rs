//! Deployment pipeline tests against the in-memory chain.

use std::path::Path;
use std::time::Duration;

use record_chain::blockchain::ReceiptWait;
use record_chain::config::AccountConfig;
use record_chain::deployment::{Deployer, DeploymentStage, DeploymentStore};
use record_chain::lifecycle::Shutdown;
use record_chain::RecordChainError;

mod common;
use common::*;

#[tokio::test]
async fn test_deploy_writes_deployment_record() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let chain = FakeChain::new();

    let mut deployer =
        Deployer::new(&config, chain.clone(), StubCompiler::default(), quick_wait(Shutdown::new()))
            .unwrap();
    assert_eq!(deployer.stage(), DeploymentStage::Connected);

    let record = deployer
        .deploy(Path::new(&config.deployment.contract_path), &[])
        .await
        .unwrap();

    assert_eq!(deployer.stage(), DeploymentStage::Recorded);
    assert_eq!(record.contract_name, "DataStorage");
    assert_eq!(record.contract_address, dev_address().create(0));
    assert_eq!(chain.contract_address(), Some(record.contract_address));
    assert_eq!(record.deployer, dev_address());
    assert_eq!(record.network, "Test Chain");
    assert_eq!(record.abi, data_storage_abi());

    let loaded = DeploymentStore::new(&config.deployment.state_path)
        .load()
        .unwrap();
    assert_eq!(loaded, record);
}

#[tokio::test]
async fn test_deployment_record_file_shape() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let chain = FakeChain::new();
    deploy_with(&config, &chain, StubCompiler::default()).await;

    let content = std::fs::read_to_string(&config.deployment.state_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&content).unwrap();
    for key in ["contract_name", "contract_address", "abi", "network", "deployer"] {
        assert!(json.get(key).is_some(), "missing {}", key);
    }
    assert!(json["abi"].is_array());
    assert_eq!(json["network"], "Test Chain");
}

#[tokio::test]
async fn test_store_after_deploy_assigns_sequential_ids() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let (_chain, store) = deployed_store(&config).await;

    assert_eq!(store.store_data("alpha").await.unwrap(), 1);
    assert_eq!(store.store_data("beta").await.unwrap(), 2);

    let first = store.fetch_data(1).await.unwrap();
    assert_eq!(first.content, "alpha");
    assert_eq!(first.creator, dev_address());
    assert!(first.active);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_placeholder_credentials_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.account = AccountConfig::default();
    let chain = FakeChain::new();

    let result = Deployer::new(&config, chain.clone(), StubCompiler::default(), quick_wait(Shutdown::new()));
    assert!(matches!(result, Err(RecordChainError::Configuration(_))));
    assert_eq!(chain.submit_attempts(), 0);
    assert!(!Path::new(&config.deployment.state_path).exists());
}

#[tokio::test]
async fn test_compile_failure_halts_before_submission() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let chain = FakeChain::new();

    let mut deployer = Deployer::new(
        &config,
        chain.clone(),
        StubCompiler::failing("ParserError: Expected ';'"),
        quick_wait(Shutdown::new()),
    )
    .unwrap();
    let err = deployer
        .deploy(Path::new(&config.deployment.contract_path), &[])
        .await
        .unwrap_err();

    match err {
        RecordChainError::Deployment { stage, source } => {
            assert_eq!(stage, DeploymentStage::Compiled);
            assert!(matches!(*source, RecordChainError::Compilation(_)));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(deployer.stage(), DeploymentStage::Connected);
    assert_eq!(chain.submit_attempts(), 0);
    assert!(!Path::new(&config.deployment.state_path).exists());
}

#[tokio::test]
async fn test_missing_contract_source_fails_compilation() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.deployment.contract_path = dir.path().join("Missing.sol").display().to_string();
    let chain = FakeChain::new();

    let mut deployer =
        Deployer::new(&config, chain, StubCompiler::default(), quick_wait(Shutdown::new()))
            .unwrap();
    let err = deployer
        .deploy(Path::new(&config.deployment.contract_path), &[])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RecordChainError::Deployment { stage: DeploymentStage::Compiled, .. }
    ));
}

#[tokio::test]
async fn test_unmined_deployment_is_not_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let chain = FakeChain::new();
    chain.hold_receipts(true);

    let wait = ReceiptWait::new(Duration::from_millis(100), Duration::from_millis(10), Shutdown::new());
    let mut deployer = Deployer::new(&config, chain.clone(), StubCompiler::default(), wait).unwrap();
    let err = deployer
        .deploy(Path::new(&config.deployment.contract_path), &[])
        .await
        .unwrap_err();

    match err {
        RecordChainError::Deployment { stage, source } => {
            assert_eq!(stage, DeploymentStage::Mined);
            assert!(matches!(*source, RecordChainError::ReceiptTimeout { .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(deployer.stage(), DeploymentStage::Submitted);
    assert_eq!(chain.submit_attempts(), 1);
    assert!(!Path::new(&config.deployment.state_path).exists());
}

#[tokio::test]
async fn test_missing_deployment_record_is_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let store = DeploymentStore::new(dir.path().join("deployment_info.json"));
    assert!(matches!(
        store.load(),
        Err(RecordChainError::MissingDeployment(_))
    ));
}
