//! loopflow-cli — Command-line client for a Loopflow node.
//!
//! Submits descriptor batches, runs cycle queries and inspects the store
//! through the node's HTTP gateway.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use loopflow_core::constants::{CYCLE_COUNT_PREFIX, DEFAULT_HTTP_PORT};
use reqwest::Client;
use serde_json::{json, Value};

/// Loopflow command-line client.
#[derive(Parser)]
#[command(name = "loopflow-cli")]
#[command(version, about = "Submit blocks to and query a Loopflow node.")]
struct Cli {
    /// Base URL of the node's HTTP gateway.
    #[arg(long, global = true, default_value_t = default_endpoint())]
    endpoint: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a batch of descriptors as the next block.
    Mine(MineArgs),
    /// Count address-local cycles in a block range.
    Cycles(CyclesArgs),
    /// Show store counters.
    Status,
    /// Show one block and its outputs.
    Block {
        /// Block key.
        key: u64,
    },
}

#[derive(Args)]
struct MineArgs {
    /// Descriptors `<txid>:<index>`, comma-separated.
    #[arg(short, long, value_delimiter = ',', required = true)]
    transactions: Vec<String>,

    /// Owner of the block's self-funded outputs.
    #[arg(short, long)]
    miner: Option<String>,
}

#[derive(Args)]
struct CyclesArgs {
    /// First block key (inclusive).
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    from: i64,

    /// Last block key (inclusive).
    #[arg(long, allow_negative_numbers = true)]
    to: i64,

    /// Longest cycle counted.
    #[arg(long, allow_negative_numbers = true)]
    max_length: i64,
}

fn default_endpoint() -> String {
    format!("http://127.0.0.1:{DEFAULT_HTTP_PORT}")
}

/// HTTP client for the node gateway.
struct NodeClient {
    client: Client,
    endpoint: String,
}

impl NodeClient {
    fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .with_context(|| format!("failed to reach node at {}", self.endpoint))?;
        let status = resp.status();
        let body: Value = resp.json().await.context("invalid JSON response")?;
        if !status.is_success() {
            bail!("node returned {status}: {}", body["error"]);
        }
        Ok(body)
    }

    async fn mine_block(&self, transactions: &[String], miner: Option<&str>) -> Result<Value> {
        let resp = self
            .client
            .post(self.url("/api/blocks"))
            .json(&json!({ "transactions": transactions, "miner": miner }))
            .send()
            .await
            .with_context(|| format!("failed to reach node at {}", self.endpoint))?;
        let status = resp.status();
        if !status.is_success() {
            bail!("node returned {status}: {}", resp.text().await.unwrap_or_default());
        }
        resp.json().await.context("invalid JSON response")
    }

    async fn count_cycles(&self, from: i64, to: i64, max_length: i64) -> Result<u64> {
        let params = [
            ("fromBlock", from.to_string()),
            ("toBlock", to.to_string()),
            ("maxCycleLength", max_length.to_string()),
        ];
        let resp = self
            .client
            .post(self.url("/count_cycles"))
            .form(&params)
            .send()
            .await
            .with_context(|| format!("failed to reach node at {}", self.endpoint))?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            bail!("node returned {status}: {text}");
        }
        parse_cycle_count(&text)
    }
}

/// Parse the `NumberOfCycles: <n>` reply.
fn parse_cycle_count(text: &str) -> Result<u64> {
    let Some(n) = text.trim().strip_prefix(CYCLE_COUNT_PREFIX) else {
        bail!("unexpected reply: {text:?}");
    };
    n.parse().with_context(|| format!("unexpected count: {n:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let client = NodeClient::new(&cli.endpoint)?;
    tracing::debug!(endpoint = %cli.endpoint, "connecting");

    match cli.command {
        Commands::Mine(args) => {
            let report = client.mine_block(&args.transactions, args.miner.as_deref()).await?;
            println!("Block:    {}", report["block"]);
            if let Some(accepted) = report["accepted"].as_array() {
                let ids: Vec<&str> = accepted.iter().filter_map(Value::as_str).collect();
                println!("Accepted: {} [{}]", ids.len(), ids.join(", "));
            }
            if let Some(rejected) = report["rejected"].as_array() {
                println!("Rejected: {}", rejected.len());
                for r in rejected {
                    println!("  #{} {}: {}", r["index"], r["descriptor"], r["reason"].as_str().unwrap_or(""));
                }
            }
        }
        Commands::Cycles(args) => {
            let count = client.count_cycles(args.from, args.to, args.max_length).await?;
            println!("{CYCLE_COUNT_PREFIX}{count}");
        }
        Commands::Status => {
            let status = client.get_json("/api/status").await?;
            println!("Blocks:    {}", status["blocks"]);
            println!("Outputs:   {}", status["vertices"]);
            println!("Transfers: {}", status["transfers"]);
            println!("Coinbase:  {}", status["coinbase_address"].as_str().unwrap_or(""));
        }
        Commands::Block { key } => {
            let block = client.get_json(&format!("/api/blocks/{key}")).await?;
            println!("Block {}", block["key"]);
            if let Some(outputs) = block["outputs"].as_array() {
                for o in outputs {
                    println!(
                        "  {}  {}",
                        o["id"].as_str().unwrap_or(""),
                        o["address"].as_str().unwrap_or("")
                    );
                }
            }
        }
    }

    Ok(())
}
