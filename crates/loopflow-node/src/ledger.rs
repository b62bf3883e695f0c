//! Shared ledger: the transaction store behind a reader/writer lock.
//!
//! Ingestion takes the write lock for the whole resolve-and-append step, so
//! block keys stay dense under concurrent ingestion and a running query never
//! sees a block appear mid-search. Queries take the read lock for their whole
//! duration and may run in parallel with each other.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use loopflow_core::cycles::CycleQuery;
use loopflow_core::error::LoopflowError;
use loopflow_core::genesis::mint_genesis;
use loopflow_core::ingest::{add_transactions, IngestReport};
use loopflow_core::store::TransactionStore;
use loopflow_core::traits::OutputGraph;
use loopflow_core::types::{Block, BlockKey};

use crate::config::NodeConfig;

/// Point-in-time counters of the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStatus {
    pub blocks: u64,
    pub vertices: usize,
    pub transfers: usize,
    pub coinbase_address: String,
}

/// Thread-safe handle to the in-memory store. Cheap to clone.
#[derive(Clone)]
pub struct Ledger {
    store: Arc<RwLock<TransactionStore>>,
    coinbase_address: Arc<str>,
}

impl Ledger {
    /// Create a ledger, minting the genesis block if `config` lists addresses.
    pub fn new(config: &NodeConfig) -> Result<Self, LoopflowError> {
        let mut store = TransactionStore::new();
        mint_genesis(&mut store, &config.genesis_addresses)?;
        info!(
            genesis_outputs = config.genesis_addresses.len(),
            coinbase = %config.coinbase_address,
            "ledger initialized"
        );
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            coinbase_address: config.coinbase_address.as_str().into(),
        })
    }

    /// Ingest a descriptor batch as the next block, using the default coinbase.
    pub fn add_transactions<S: AsRef<str>>(&self, descriptors: &[S]) -> Result<IngestReport, LoopflowError> {
        self.mine_block(descriptors, None)
    }

    /// Ingest a descriptor batch as the next block.
    ///
    /// `miner` owns the block's self-funded outputs; defaults to the
    /// configured coinbase address.
    pub fn mine_block<S: AsRef<str>>(
        &self,
        descriptors: &[S],
        miner: Option<&str>,
    ) -> Result<IngestReport, LoopflowError> {
        let coinbase = miner
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(&*self.coinbase_address);
        let mut store = self.store.write();
        Ok(add_transactions(&mut store, descriptors, coinbase)?)
    }

    /// Count cycles for an already-validated query.
    pub fn count_cycles(&self, query: &CycleQuery) -> u64 {
        let started = Instant::now();
        let store = self.store.read();
        let count = query.run(&*store);
        debug!(
            from = query.from_block,
            to = query.to_block,
            max_len = query.max_cycle_length,
            count,
            elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
            "cycle query finished"
        );
        count
    }

    /// Count cycles in `from_block..=to_block` no longer than `max_cycle_length`.
    pub fn count_cycles_in_range(&self, from_block: i64, to_block: i64, max_cycle_length: i64) -> u64 {
        self.count_cycles(&CycleQuery::new(from_block, to_block, max_cycle_length))
    }

    /// Validate raw request parameters, then count.
    pub fn count_cycles_from_params(
        &self,
        from_block: Option<&str>,
        to_block: Option<&str>,
        max_cycle_length: Option<&str>,
    ) -> Result<u64, LoopflowError> {
        let query = CycleQuery::from_params(from_block, to_block, max_cycle_length)?;
        Ok(self.count_cycles(&query))
    }

    /// Copy of the block stored under `key`.
    pub fn block(&self, key: BlockKey) -> Option<Block> {
        self.store.read().block(key).cloned()
    }

    pub fn block_count(&self) -> u64 {
        self.store.read().block_count()
    }

    pub fn status(&self) -> LedgerStatus {
        let store = self.store.read();
        LedgerStatus {
            blocks: store.block_count(),
            vertices: store.vertex_count(),
            transfers: store.transfer_count(),
            coinbase_address: self.coinbase_address.to_string(),
        }
    }

    pub fn coinbase_address(&self) -> &str {
        &self.coinbase_address
    }
}
