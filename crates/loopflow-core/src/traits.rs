//! Trait interfaces for Loopflow.
//!
//! [`OutputGraph`] is the read-only view of minted outputs and the transfers
//! between them. The cycle search and the ingestion resolver only ever read
//! through it; [`TransactionStore`](crate::store::TransactionStore) is the
//! production implementation.

use crate::error::LookupError;
use crate::types::{Block, BlockKey, Vertex, VertexId};

/// Read-only view of the value-flow graph.
pub trait OutputGraph {
    /// Number of blocks appended so far. Keys run `0..block_count()`.
    fn block_count(&self) -> u64;

    /// Block stored under `key`, if any.
    fn block(&self, key: BlockKey) -> Option<&Block>;

    /// Vertex with the given id, if minted.
    fn vertex(&self, id: &VertexId) -> Option<&Vertex>;

    /// Outputs funded by `id`, in the order they were minted.
    fn spenders(&self, id: &VertexId) -> &[VertexId];

    /// Resolve output `index` of transaction `txid`.
    fn lookup_output(&self, txid: &str, index: u64) -> Result<&Vertex, LookupError>;

    /// Whether any block has been appended.
    ///
    /// Default implementation: `block_count() > 0`.
    fn is_empty(&self) -> bool {
        self.block_count() == 0
    }
}
