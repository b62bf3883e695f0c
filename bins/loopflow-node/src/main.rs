//! Loopflow node binary.
//!
//! Holds the transaction store in memory and serves the block ingestion and
//! cycle counting endpoints over HTTP until Ctrl+C.

use anyhow::{Context, Result};
use clap::Parser;
use loopflow_node_lib::{router, AppState, Ledger, NodeConfig};
use tracing::info;

/// Loopflow node: in-memory transaction store with an HTTP gateway.
#[derive(Parser, Debug)]
#[command(
    name = "loopflow-node",
    version,
    about = "In-memory transaction store that counts address-local cycles"
)]
struct Args {
    /// HTTP bind address
    #[arg(long, default_value = "127.0.0.1")]
    http_bind: String,

    /// HTTP port
    #[arg(long, default_value_t = loopflow_core::constants::DEFAULT_HTTP_PORT)]
    http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format ("text" or "json")
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Owner of self-funded outputs when a block names no miner
    #[arg(long, default_value = loopflow_core::constants::DEFAULT_COINBASE_ADDRESS)]
    coinbase_address: String,

    /// Addresses minted as the genesis block (comma-separated)
    #[arg(long = "genesis", value_delimiter = ',')]
    genesis_addresses: Vec<String>,
}

impl Args {
    /// Convert CLI args into a NodeConfig.
    fn into_config(self) -> NodeConfig {
        NodeConfig {
            http_bind: self.http_bind,
            http_port: self.http_port,
            log_level: self.log_level,
            log_format: self.log_format,
            coinbase_address: self.coinbase_address,
            genesis_addresses: self
                .genesis_addresses
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse().into_config();

    init_logging(&config.log_level, config.json_logs());

    info!("Loopflow Node v{}", env!("CARGO_PKG_VERSION"));
    info!("http_addr: {}", config.http_addr());
    info!("coinbase_address: {}", config.coinbase_address);
    info!("genesis_addresses: {:?}", config.genesis_addresses);

    let ledger = Ledger::new(&config).context("failed to initialize ledger")?;
    let addr = config.http_addr();
    let app = router(AppState::new(ledger, config));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("listening on http://{addr} (Ctrl+C to stop)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Loopflow node shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down..."),
        Err(e) => tracing::error!("failed to install Ctrl+C handler: {e}"),
    }
}

/// Initialize tracing subscriber with the given log level and output format.
///
/// JSON output suits log aggregation pipelines; otherwise human-readable text.
fn init_logging(level_str: &str, json: bool) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true))
            .init();
    }
}
