//! Solidity compilation through `solc --standard-json`.
//!
//! The compiler is an external collaborator: this module only builds the
//! standard-JSON input, runs the binary and picks the ABI and bytecode out
//! of its output.

use alloy::json_abi::JsonAbi;
use alloy::primitives::{hex, Bytes};
use serde_json::{json, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::blockchain::types::{ChainResult, RecordChainError};
use crate::config::CompilerConfig;

/// Contract source text and the file name it is compiled under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSource {
    pub file_name: String,
    pub content: String,
}

impl ContractSource {
    /// Read a source file from disk.
    pub fn read(path: &Path) -> ChainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RecordChainError::Compilation(format!(
                "contract source not found at {}: {}",
                path.display(),
                e
            ))
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Contract.sol".to_string());
        Ok(Self { file_name, content })
    }

    /// File name without the `.sol` extension.
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(".sol")
            .unwrap_or(&self.file_name)
    }
}

/// Output of a successful compilation. Consumed once by deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledContract {
    pub name: String,
    pub abi: JsonAbi,
    /// Creation bytecode.
    pub bytecode: Bytes,
}

/// Turns contract source into ABI and bytecode.
pub trait Compiler: Send + Sync {
    fn compile(
        &self,
        source: &ContractSource,
    ) -> impl Future<Output = ChainResult<CompiledContract>> + Send;
}

/// Settings passed to solc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerSettings {
    pub version: String,
    pub optimizer_runs: u32,
    pub evm_version: String,
}

impl From<&CompilerConfig> for CompilerSettings {
    fn from(config: &CompilerConfig) -> Self {
        Self {
            version: config.solc_version.clone(),
            optimizer_runs: config.optimizer_runs,
            evm_version: config.evm_version.clone(),
        }
    }
}

/// Runs a local `solc` binary.
#[derive(Debug, Clone)]
pub struct SolcCompiler {
    solc_path: PathBuf,
    settings: CompilerSettings,
}

impl SolcCompiler {
    pub fn new(config: &CompilerConfig) -> Self {
        Self {
            solc_path: PathBuf::from(&config.solc_path),
            settings: CompilerSettings::from(config),
        }
    }

    async fn check_version(&self) -> ChainResult<()> {
        let output = Command::new(&self.solc_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| {
                RecordChainError::Compilation(format!(
                    "cannot run {}: {}",
                    self.solc_path.display(),
                    e
                ))
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !version_matches(&stdout, &self.settings.version) {
            return Err(RecordChainError::Compilation(format!(
                "{} is not solc {} (reported: {})",
                self.solc_path.display(),
                self.settings.version,
                stdout.trim()
            )));
        }
        Ok(())
    }
}

impl Compiler for SolcCompiler {
    async fn compile(&self, source: &ContractSource) -> ChainResult<CompiledContract> {
        self.check_version().await?;
        tracing::info!(file = %source.file_name, version = %self.settings.version, "Compiling contract");

        let input = standard_json_input(source, &self.settings);
        let mut child = Command::new(&self.solc_path)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecordChainError::Compilation(format!("cannot start solc: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.to_string().as_bytes())
                .await
                .map_err(|e| RecordChainError::Compilation(format!("writing solc input: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RecordChainError::Compilation(format!("waiting for solc: {}", e)))?;
        if !output.status.success() {
            return Err(RecordChainError::Compilation(format!(
                "solc exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let compiled = parse_standard_json_output(source, &String::from_utf8_lossy(&output.stdout))?;
        tracing::info!(contract = %compiled.name, bytecode_len = compiled.bytecode.len(), "Contract compiled");
        Ok(compiled)
    }
}

/// `solc --version` prints `Version: 0.8.19+commit...`.
pub fn version_matches(version_output: &str, version: &str) -> bool {
    version_output
        .lines()
        .filter_map(|line| line.strip_prefix("Version: "))
        .any(|reported| {
            reported == version
                || reported
                    .strip_prefix(version)
                    .is_some_and(|rest| rest.starts_with('+'))
        })
}

/// Standard-JSON input: optimizer on, fixed EVM version, ABI and bytecode selected.
pub fn standard_json_input(source: &ContractSource, settings: &CompilerSettings) -> Value {
    let mut sources = serde_json::Map::new();
    sources.insert(source.file_name.clone(), json!({ "content": source.content }));

    json!({
        "language": "Solidity",
        "sources": sources,
        "settings": {
            "optimizer": { "enabled": true, "runs": settings.optimizer_runs },
            "evmVersion": settings.evm_version,
            "outputSelection": {
                "*": { "*": ["abi", "evm.bytecode", "evm.deployedBytecode"] }
            }
        }
    })
}

/// Pick the contract out of solc's standard-JSON output.
///
/// Prefers the contract named after the file, otherwise the first one.
/// Any diagnostic with severity `error` fails the compilation.
pub fn parse_standard_json_output(
    source: &ContractSource,
    output: &str,
) -> ChainResult<CompiledContract> {
    let output: Value = serde_json::from_str(output)
        .map_err(|e| RecordChainError::Compilation(format!("unreadable solc output: {}", e)))?;

    let errors: Vec<String> = output["errors"]
        .as_array()
        .into_iter()
        .flatten()
        .filter(|diag| diag["severity"] == "error")
        .map(|diag| {
            diag["formattedMessage"]
                .as_str()
                .or_else(|| diag["message"].as_str())
                .unwrap_or("unknown error")
                .trim()
                .to_string()
        })
        .collect();
    if !errors.is_empty() {
        return Err(RecordChainError::Compilation(errors.join("\n")));
    }

    let contracts = output["contracts"][&source.file_name]
        .as_object()
        .filter(|contracts| !contracts.is_empty())
        .ok_or_else(|| {
            RecordChainError::Compilation(format!("no contracts found in {}", source.file_name))
        })?;
    let (name, artifact) = contracts
        .get(source.stem())
        .map(|artifact| (source.stem().to_string(), artifact))
        .or_else(|| contracts.iter().next().map(|(name, artifact)| (name.clone(), artifact)))
        .ok_or_else(|| {
            RecordChainError::Compilation(format!("no contracts found in {}", source.file_name))
        })?;

    let abi: JsonAbi = serde_json::from_value(artifact["abi"].clone())
        .map_err(|e| RecordChainError::Compilation(format!("invalid ABI for {}: {}", name, e)))?;
    let object = artifact["evm"]["bytecode"]["object"].as_str().unwrap_or_default();
    if object.is_empty() {
        return Err(RecordChainError::Compilation(format!(
            "{} has no bytecode (abstract contract or interface?)",
            name
        )));
    }
    let bytecode = hex::decode(object)
        .map_err(|e| RecordChainError::Compilation(format!("invalid bytecode for {}: {}", name, e)))?;

    Ok(CompiledContract {
        name,
        abi,
        bytecode: bytecode.into(),
    })
}
