//! bcos-console
//!
//! Command-line front end for a FISCO BCOS node. Each subcommand performs
//! one client call and prints the result as JSON.
//!
//! Usage:
//!   bcos-console [--rpc <url>] [--group <id>] [--timeout-ms <ms>] [--config <file>] <command>
//!   bcos-console getBlockNumber
//!   bcos-console getBlockByNumber 100 false
//!   bcos-console --rpc ws://127.0.0.1:8546 watchHeads

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use bcos_core::quantity::decode_u64;
use bcos_core::{Address, GroupId, H256};
use bcos_rpc::{ClientConfig, RpcClient};

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "bcos-console",
    version,
    about = "Query a FISCO BCOS node over JSON-RPC"
)]
struct Args {
    /// JSON config file; flags given on the command line take precedence.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Node RPC endpoint (http(s):// or ws(s)://).
    #[arg(long, global = true)]
    rpc: Option<String>,

    /// Group to query.
    #[arg(long, global = true)]
    group: Option<u32>,

    /// Per-call deadline in milliseconds; 0 disables it.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Node version information.
    #[command(name = "getClientVersion")]
    GetClientVersion,

    /// The group this console is bound to.
    #[command(name = "getGroupID")]
    GetGroupId,

    /// Latest block number of the group.
    #[command(name = "getBlockNumber")]
    GetBlockNumber,

    #[command(name = "getPbftView")]
    GetPbftView,

    #[command(name = "getSealerList")]
    GetSealerList,

    #[command(name = "getObserverList")]
    GetObserverList,

    #[command(name = "getConsensusStatus")]
    GetConsensusStatus,

    #[command(name = "getSyncStatus")]
    GetSyncStatus,

    /// Connected peers.
    #[command(name = "getPeers")]
    GetPeers,

    /// Node ids of the group's consensus and observer nodes.
    #[command(name = "getGroupPeers")]
    GetGroupPeers,

    #[command(name = "getNodeIDList")]
    GetNodeIdList,

    /// Groups the node belongs to.
    #[command(name = "getGroupList")]
    GetGroupList,

    #[command(name = "getBlockByHash")]
    GetBlockByHash {
        hash: H256,
        /// Include full transactions rather than hashes.
        #[arg(default_value_t = true, action = clap::ArgAction::Set)]
        include_transactions: bool,
    },

    #[command(name = "getBlockByNumber")]
    GetBlockByNumber {
        #[arg(value_parser = parse_number)]
        number: u64,
        #[arg(default_value_t = true, action = clap::ArgAction::Set)]
        include_transactions: bool,
    },

    #[command(name = "getBlockHashByNumber")]
    GetBlockHashByNumber {
        #[arg(value_parser = parse_number)]
        number: u64,
    },

    #[command(name = "getTransactionByHash")]
    GetTransactionByHash { hash: H256 },

    #[command(name = "getTransactionByBlockHashAndIndex")]
    GetTransactionByBlockHashAndIndex {
        block_hash: H256,
        #[arg(value_parser = parse_number)]
        index: u64,
    },

    #[command(name = "getTransactionByBlockNumberAndIndex")]
    GetTransactionByBlockNumberAndIndex {
        #[arg(value_parser = parse_number)]
        number: u64,
        #[arg(value_parser = parse_number)]
        index: u64,
    },

    #[command(name = "getTransactionReceipt")]
    GetTransactionReceipt { hash: H256 },

    #[command(name = "getPendingTransactions")]
    GetPendingTransactions,

    #[command(name = "getPendingTxSize")]
    GetPendingTxSize,

    /// Contract code at an address.
    #[command(name = "getCode")]
    GetCode { address: Address },

    #[command(name = "getTotalTransactionCount")]
    GetTotalTransactionCount,

    /// A system configuration value, e.g. tx_count_limit or tx_gas_limit.
    #[command(name = "getSystemConfigByKey")]
    GetSystemConfigByKey { key: String },

    /// Block synchronisation progress, or false when idle.
    Syncing,

    /// Print new block headers until interrupted (WebSocket endpoints only).
    #[command(name = "watchHeads")]
    WatchHeads,
}

/// Decimal or `0x` quantity.
fn parse_number(s: &str) -> Result<u64, String> {
    if s.starts_with("0x") || s.starts_with("0X") {
        decode_u64(s).map_err(|e| e.to_string())
    } else {
        s.parse().map_err(|e| format!("{s:?}: {e}"))
    }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_config(args: &Args) -> anyhow::Result<ClientConfig> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(rpc) = &args.rpc {
        config.endpoint = rpc.clone();
    }
    if let Some(group) = args.group {
        config.group_id = GroupId(group);
    }
    if let Some(ms) = args.timeout_ms {
        config.request_timeout_ms = ms;
    }
    config.validate().context("invalid client configuration")?;
    Ok(config)
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,bcos_console=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;
    let client = RpcClient::dial(&config)
        .await
        .with_context(|| format!("connecting to {}", config.endpoint))?;

    let result = run(&client, args.command).await;
    client.close();
    result
}

async fn run(client: &RpcClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::GetClientVersion => print_json(&client.client_version().await?),
        Command::GetGroupId => print_json(&client.group_id()),
        Command::GetBlockNumber => print_json(&client.block_number().await?),
        Command::GetPbftView => print_json(&client.pbft_view().await?),
        Command::GetSealerList => print_json(&client.sealer_list().await?),
        Command::GetObserverList => print_json(&client.observer_list().await?),
        Command::GetConsensusStatus => print_json(&client.consensus_status().await?),
        Command::GetSyncStatus => print_json(&client.sync_status().await?),
        Command::GetPeers => print_json(&client.peers().await?),
        Command::GetGroupPeers => print_json(&client.group_peers().await?),
        Command::GetNodeIdList => print_json(&client.node_id_list().await?),
        Command::GetGroupList => print_json(&client.group_list().await?),

        Command::GetBlockByHash {
            hash,
            include_transactions,
        } => print_json(
            &client
                .block_by_hash(hash, include_transactions)
                .await
                .context("block not found")?,
        ),
        Command::GetBlockByNumber {
            number,
            include_transactions,
        } => print_json(
            &client
                .block_by_number(number, include_transactions)
                .await
                .context("block not found")?,
        ),
        Command::GetBlockHashByNumber { number } => {
            print_json(&client.block_hash_by_number(number).await?)
        }

        Command::GetTransactionByHash { hash } => {
            print_json(&client.transaction_by_hash(hash).await?)
        }
        Command::GetTransactionByBlockHashAndIndex { block_hash, index } => print_json(
            &client
                .transaction_by_block_hash_and_index(block_hash, index)
                .await?,
        ),
        Command::GetTransactionByBlockNumberAndIndex { number, index } => print_json(
            &client
                .transaction_by_block_number_and_index(number, index)
                .await?,
        ),
        Command::GetTransactionReceipt { hash } => {
            let receipt = client.group_transaction_receipt(hash).await?;
            if !receipt.is_success() {
                info!(status = %receipt.status(), "transaction did not succeed");
            }
            print_json(&receipt)
        }
        Command::GetPendingTransactions => print_json(&client.pending_transactions().await?),
        Command::GetPendingTxSize => print_json(&client.pending_tx_size().await?),

        Command::GetCode { address } => {
            let code = client.code(address).await?;
            print_json(&format!("0x{}", hex::encode(code)))
        }
        Command::GetTotalTransactionCount => {
            print_json(&client.total_transaction_count().await?)
        }
        Command::GetSystemConfigByKey { key } => {
            print_json(&client.system_config_by_key(&key).await?)
        }

        Command::Syncing => match client.sync_progress().await? {
            Some(progress) => print_json(&progress),
            None => print_json(&false),
        },

        Command::WatchHeads => watch_heads(client).await,
    }
}

async fn watch_heads(client: &RpcClient) -> anyhow::Result<()> {
    let mut heads = client
        .subscribe_new_head()
        .await
        .context("subscribing to new heads")?;
    info!(subscription = heads.id(), "watching new heads; Ctrl-C to stop");

    loop {
        tokio::select! {
            head = heads.next() => match head {
                Some(head) => print_json(&head?)?,
                None => bail!("subscription closed by the node"),
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    heads.unsubscribe().await.context("unsubscribing")?;
    Ok(())
}
