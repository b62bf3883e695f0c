//! Node configuration for the Loopflow gateway.
//!
//! Provides [`NodeConfig`] with defaults for HTTP binding, logging, and the
//! ledger's coinbase and genesis settings. The node binary maps its CLI
//! arguments onto it.

use loopflow_core::constants::{DEFAULT_COINBASE_ADDRESS, DEFAULT_HTTP_PORT};

/// Configuration for a node instance.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// IP address for the HTTP gateway to bind to.
    pub http_bind: String,
    /// Port for the HTTP gateway.
    pub http_port: u16,
    /// Log level filter string (e.g. "info", "debug", "loopflow_core=trace").
    pub log_level: String,
    /// Log output format: "text" or "json".
    pub log_format: String,
    /// Owner of self-funded outputs when a mined block names no miner.
    pub coinbase_address: String,
    /// Addresses minted as block 0 at startup. Empty means no genesis block.
    pub genesis_addresses: Vec<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            http_bind: "127.0.0.1".to_string(),
            http_port: DEFAULT_HTTP_PORT,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            coinbase_address: DEFAULT_COINBASE_ADDRESS.to_string(),
            genesis_addresses: Vec::new(),
        }
    }
}

impl NodeConfig {
    /// Socket address string for the HTTP gateway.
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_bind, self.http_port)
    }

    /// Whether logs should be emitted as JSON.
    pub fn json_logs(&self) -> bool {
        self.log_format.eq_ignore_ascii_case("json")
    }
}
