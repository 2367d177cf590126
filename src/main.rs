//! record-chain CLI.
//!
//! ```text
//! record-chain deploy            compile + deploy DataStorage, write deployment_info.json
//! record-chain store <content>   signed storeData transaction, prints the new id
//! record-chain fetch <id>        read-only getData
//! record-chain count | list      read-only getDataCount / every record
//! record-chain delete <id>       signed deleteData transaction
//! record-chain demo              the scripted store-and-read walkthrough
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use record_chain::blockchain::{ChainClient, GasPolicy, ReceiptWait, RpcChainClient, Wallet};
use record_chain::config::{load_config, ConfigError, RecordChainConfig};
use record_chain::contract::SolcCompiler;
use record_chain::deployment::{Deployer, DeploymentRecord, DeploymentStore};
use record_chain::lifecycle::{signals::cancel_on_ctrl_c, Shutdown};
use record_chain::observability::logging::init_logging;
use record_chain::records::{DataRecord, RecordStore};
use record_chain::RecordChainError;

const RULE: &str = "============================================================";

#[derive(Parser)]
#[command(name = "record-chain")]
#[command(about = "Deploy the DataStorage contract and manage records on a development chain", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile and deploy the record contract
    Deploy,
    /// Store a new record
    Store { content: String },
    /// Fetch one record by id
    Fetch { id: u64 },
    /// Print the number of stored records
    Count,
    /// List every stored record
    List,
    /// Mark a record as deleted
    Delete { id: u64 },
    /// Store two sample records and read everything back
    Demo,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&cli.config, &e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&config.observability.log_level);
    tracing::debug!(config = ?config, "Configuration loaded");

    let shutdown = Shutdown::new();
    cancel_on_ctrl_c(shutdown.clone());

    match run(cli.command, &config, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(
    command: Commands,
    config: &RecordChainConfig,
    shutdown: Shutdown,
) -> Result<(), RecordChainError> {
    let wait = ReceiptWait::from_config(&config.transactions, shutdown);

    match command {
        Commands::Deploy => {
            let client = RpcChainClient::connect(&config.node).await?;
            deploy(config, client, wait).await?;
        }
        Commands::Store { content } => {
            store_one(&open_store(config, wait).await?, &content).await?;
        }
        Commands::Fetch { id } => {
            print_record(&open_store(config, wait).await?.fetch_data(id).await?);
        }
        Commands::Count => {
            let count = open_store(config, wait).await?.count().await?;
            println!("Total records on blockchain: {}", count);
        }
        Commands::List => list_all(&open_store(config, wait).await?).await?,
        Commands::Delete { id } => {
            let receipt = open_store(config, wait).await?.delete_data(id).await?;
            println!("Record {} marked as deleted", id);
            println!("Transaction hash: {}", receipt.tx_hash);
            println!("Block number: {}", receipt.block_number);
        }
        Commands::Demo => demo(&open_store(config, wait).await?).await?,
    }
    Ok(())
}

/// Record store for the recorded deployment.
///
/// Missing deployment state is reported before touching the node.
async fn open_store(
    config: &RecordChainConfig,
    wait: ReceiptWait,
) -> Result<RecordStore<RpcChainClient>, RecordChainError> {
    let deployment = DeploymentStore::new(&config.deployment.state_path).load()?;
    let client = RpcChainClient::connect(&config.node).await?;
    println!("Connected to {} (chain {})", client.endpoint().url, client.chain_id());
    println!("Contract: {}\n", deployment.contract_address);

    let wallet = Wallet::from_account(&config.account, client.chain_id())?;
    Ok(RecordStore::new(
        client,
        wallet,
        &deployment,
        GasPolicy::from(&config.transactions),
        wait,
    ))
}

async fn deploy(
    config: &RecordChainConfig,
    client: RpcChainClient,
    wait: ReceiptWait,
) -> Result<(), RecordChainError> {
    println!("{RULE}\nContract Deployment\n{RULE}\n");
    println!("Connected to {}", client.endpoint().url);
    println!("Chain ID: {}", client.chain_id());
    println!("Account: {}\n", config.account.address);

    let compiler = SolcCompiler::new(&config.compiler);
    let mut deployer = Deployer::new(config, client, compiler, wait)?;
    let record = deployer
        .deploy(Path::new(&config.deployment.contract_path), &[])
        .await?;

    print_deployment(&record, &config.deployment.state_path);
    Ok(())
}

async fn store_one<C: ChainClient>(
    store: &RecordStore<C>,
    content: &str,
) -> Result<u64, RecordChainError> {
    println!("Data: {}", content);
    let stored = store.store_data_with_receipt(content).await?;
    println!("Data added successfully");
    println!("Record ID: {}", stored.id);
    println!("Transaction hash: {}", stored.receipt.tx_hash);
    println!("Block number: {}", stored.receipt.block_number);
    println!("Gas used: {}\n", stored.receipt.gas_used);
    Ok(stored.id)
}

async fn list_all<C: ChainClient>(store: &RecordStore<C>) -> Result<(), RecordChainError> {
    let records = store.fetch_all().await?;
    println!("Total records on blockchain: {}\n", records.len());
    for record in &records {
        println!("Record {}: {} [{}]", record.id, preview(&record.content, 50), record.status());
    }
    Ok(())
}

async fn demo<C: ChainClient>(store: &RecordStore<C>) -> Result<(), RecordChainError> {
    println!("Demo 1: adding data\n");
    let first = store_one(store, "Student Record: Name=Ranveer, Roll=2023001, Grade=A+").await?;

    println!("Demo 2: reading data\n");
    print_record(&store.fetch_data(first).await?);

    println!("Demo 3: adding more data\n");
    let second = store_one(
        store,
        "Document Hash: abc123def456 | Type: Invoice | Amount: Rs.5000",
    )
    .await?;

    println!("Demo 4: reading second record\n");
    print_record(&store.fetch_data(second).await?);

    println!("Reading all records:\n");
    list_all(store).await?;
    println!("\nDemo completed successfully");
    Ok(())
}

fn print_deployment(record: &DeploymentRecord, state_path: &str) {
    println!("\n{RULE}\nContract deployed successfully\n{RULE}");
    println!("Contract: {}", record.contract_name);
    println!("Contract address: {}", record.contract_address);
    println!("Network: {}", record.network);
    println!("Deployer: {}", record.deployer);
    println!("Deployment info saved to {}\n", state_path);
    println!("Next steps:");
    println!("1. Run 'record-chain demo' to store and read sample records");
    println!("2. Use 'record-chain store <content>' and 'record-chain fetch <id>'");
}

fn print_record(record: &DataRecord) {
    let timestamp = record
        .created_at()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| record.timestamp.to_string());
    println!("{RULE}");
    println!("Record ID: {}", record.id);
    println!("Data: {}", record.content);
    println!("Creator: {}", record.creator);
    println!("Timestamp: {}", timestamp);
    println!("Status: {}", record.status());
    println!("{RULE}\n");
}

fn preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn report_config_error(path: &Path, e: &ConfigError) {
    eprintln!("Error loading {}: {}", path.display(), e);
    if e.is_placeholder() {
        eprintln!("\nSteps to configure:");
        eprintln!("1. Start your development node (Ganache or Anvil)");
        eprintln!("2. Copy an account address");
        eprintln!("3. Copy the private key of that account");
        eprintln!("4. Update {} with these values", path.display());
    }
}

fn report_error(e: &RecordChainError) {
    eprintln!("Error: {}", e);
    match e {
        RecordChainError::MissingDeployment(_) => {
            eprintln!("Please run 'record-chain deploy' first");
        }
        RecordChainError::Connection { .. } => {
            eprintln!("Is the development node running?");
        }
        RecordChainError::ReceiptTimeout { .. } | RecordChainError::Cancelled(_) => {
            eprintln!("The transaction may still be mined; check with 'record-chain count' before retrying");
        }
        RecordChainError::NonceConflict { .. } => {
            eprintln!("Another transaction from this account used the same nonce; run the command again");
        }
        _ => {}
    }
}
