//! Shared test helpers for E2E and integration tests.

use loopflow_core::genesis::mint_genesis;
use loopflow_core::ingest::add_transactions;
use loopflow_core::store::TransactionStore;
use loopflow_core::types::{BlockKey, VertexId};
use loopflow_node_lib::{Ledger, NodeConfig};

/// Default owner of self-funded outputs in test stores.
pub const MINER: &str = "miner";

/// Shorthand vertex id.
pub fn vid(block: u64, position: u64) -> VertexId {
    VertexId::new(BlockKey(block), position)
}

/// Descriptors for a block of `n` outputs funding each other in one ring.
///
/// Output `i` is funded by output `i - 1` (wrapping), all inside block `key`.
pub fn ring(key: u64, n: u64) -> Vec<String> {
    (0..n).map(|i| format!("{key}:{}", (i + n - 1) % n)).collect()
}

/// A store with `genesis` minted (if non-empty) and each batch ingested in order.
pub fn store_from(genesis: &[&str], batches: &[Vec<String>]) -> TransactionStore {
    let mut store = TransactionStore::new();
    mint_genesis(&mut store, genesis).unwrap();
    for batch in batches {
        add_transactions(&mut store, batch, MINER).unwrap();
    }
    store
}

/// A ledger with default config and the given genesis addresses.
pub fn ledger_with_genesis(addresses: &[&str]) -> Ledger {
    let config = NodeConfig {
        genesis_addresses: addresses.iter().map(|a| a.to_string()).collect(),
        ..NodeConfig::default()
    };
    Ledger::new(&config).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_wraps_to_last_output() {
        assert_eq!(ring(3, 3), vec!["3:2", "3:0", "3:1"]);
    }
}
