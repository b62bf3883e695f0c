//! In-memory, append-only transaction store.
//!
//! Keeps four indexes that are always updated together by
//! [`TransactionStore::append_block`]:
//! - blocks, dense by [`BlockKey`]
//! - transaction id → block key, used to resolve descriptors
//! - vertex id → position of the vertex in its block
//! - vertex id → outputs it funds (the value-flow adjacency)
//!
//! Not thread-safe. The node wraps it in a `RwLock`.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{LookupError, StoreError};
use crate::traits::OutputGraph;
use crate::types::{Block, BlockKey, Transfer, Vertex, VertexId};

/// Append-only store of blocks and the transfers between their outputs.
#[derive(Debug, Default)]
pub struct TransactionStore {
    blocks: Vec<Block>,
    transactions: HashMap<String, BlockKey>,
    vertices: HashMap<VertexId, usize>,
    spenders: HashMap<VertexId, Vec<VertexId>>,
    transfer_count: usize,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key the next appended block must carry.
    pub fn next_key(&self) -> BlockKey {
        BlockKey(self.blocks.len() as u64)
    }

    /// Look up a block by its decimal string key.
    pub fn get_block(&self, key: &str) -> Option<&Block> {
        let key = self.transactions.get(key)?;
        self.block(*key)
    }

    /// Total number of minted outputs across all blocks.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Total number of recorded transfers.
    pub fn transfer_count(&self) -> usize {
        self.transfer_count
    }

    /// Iterate over blocks in key order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Append `block` and the transfers funding its outputs.
    ///
    /// The block key must equal [`next_key`](Self::next_key). Every transfer
    /// must land on an output of `block` and start from an output that is
    /// either already stored or part of `block`. Nothing is written unless
    /// all checks pass.
    pub fn append_block(&mut self, block: Block, transfers: Vec<Transfer>) -> Result<(), StoreError> {
        let expected = self.next_key();
        if block.key != expected {
            return Err(StoreError::NonSequentialBlock {
                expected: expected.0,
                got: block.key.0,
            });
        }

        let in_block = |id: &VertexId| id.block == block.key && block.output(id.position).is_some();
        for transfer in &transfers {
            if !in_block(&transfer.to) {
                return Err(StoreError::DanglingTransfer(transfer.to.to_string()));
            }
            if !in_block(&transfer.from) && !self.vertices.contains_key(&transfer.from) {
                return Err(StoreError::DanglingTransfer(transfer.from.to_string()));
            }
        }

        for (position, vertex) in block.vertices.iter().enumerate() {
            self.vertices.insert(vertex.id, position);
        }
        for transfer in &transfers {
            self.spenders.entry(transfer.from).or_default().push(transfer.to);
        }
        self.transfer_count += transfers.len();
        self.transactions.insert(block.key.txid(), block.key);

        debug!(
            block = %block.key,
            outputs = block.len(),
            transfers = transfers.len(),
            "block appended"
        );
        self.blocks.push(block);
        Ok(())
    }
}

impl OutputGraph for TransactionStore {
    fn block_count(&self) -> u64 {
        self.blocks.len() as u64
    }

    fn block(&self, key: BlockKey) -> Option<&Block> {
        usize::try_from(key.0).ok().and_then(|i| self.blocks.get(i))
    }

    fn vertex(&self, id: &VertexId) -> Option<&Vertex> {
        let position = self.vertices.get(id)?;
        self.block(id.block)?.vertices.get(*position)
    }

    fn spenders(&self, id: &VertexId) -> &[VertexId] {
        self.spenders.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn lookup_output(&self, txid: &str, index: u64) -> Result<&Vertex, LookupError> {
        let block = self
            .get_block(txid)
            .ok_or_else(|| LookupError::UnknownTransaction(txid.to_string()))?;
        block.output(index).ok_or_else(|| LookupError::OutputOutOfRange {
            txid: txid.to_string(),
            index,
            len: block.len(),
        })
    }
}
