//! # loopflow-node — Shared ledger and HTTP gateway.
//!
//! Composes the core store into a running service:
//! - [`ledger::Ledger`] — the transaction store behind a reader/writer lock
//! - [`http`] — axum router serving the block and cycle endpoints
//! - [`config::NodeConfig`] — node configuration

use std::sync::Arc;

pub mod config;
pub mod http;
pub mod ledger;

pub use config::NodeConfig;
pub use http::router;
pub use ledger::{Ledger, LedgerStatus};

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// Ledger handle, cloned per request.
    pub ledger: Ledger,
    /// Node configuration.
    pub config: Arc<NodeConfig>,
}

impl AppState {
    pub fn new(ledger: Ledger, config: NodeConfig) -> Self {
        Self {
            ledger,
            config: Arc::new(config),
        }
    }
}
