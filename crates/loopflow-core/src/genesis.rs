//! Genesis allocation.
//!
//! Descriptors can only reference outputs that already exist, so a fresh
//! store needs a source of addresses. The genesis block (key 0) mints one
//! unfunded output per configured address, in order.

use tracing::info;

use crate::error::StoreError;
use crate::store::TransactionStore;
use crate::types::{Block, BlockKey, Vertex, VertexId};

/// Build the genesis block for `addresses`.
pub fn genesis_block<S: AsRef<str>>(addresses: &[S]) -> Block {
    Block {
        key: BlockKey::GENESIS,
        vertices: addresses
            .iter()
            .enumerate()
            .map(|(i, address)| {
                let address: &str = address.as_ref();
                Vertex::new(VertexId::new(BlockKey::GENESIS, i as u64), address)
            })
            .collect(),
    }
}

/// Append the genesis block to an empty `store`.
///
/// Returns `Ok(None)` without touching the store when `addresses` is empty.
/// Fails with [`StoreError::NonSequentialBlock`] if the store already holds
/// blocks.
pub fn mint_genesis<S: AsRef<str>>(
    store: &mut TransactionStore,
    addresses: &[S],
) -> Result<Option<BlockKey>, StoreError> {
    if addresses.is_empty() {
        return Ok(None);
    }
    let block = genesis_block(addresses);
    let outputs = block.len();
    store.append_block(block, Vec::new())?;
    info!(outputs, "genesis block minted");
    Ok(Some(BlockKey::GENESIS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::OutputGraph;

    #[test]
    fn genesis_block_positions_follow_address_order() {
        let block = genesis_block(&["alice", "bob"]);
        assert_eq!(block.key, BlockKey::GENESIS);
        assert_eq!(block.vertices[1].id.to_string(), "0:1");
        assert_eq!(block.vertices[1].address, "bob");
    }

    #[test]
    fn mint_genesis_is_noop_for_empty_allocation() {
        let mut store = TransactionStore::new();
        assert_eq!(mint_genesis::<&str>(&mut store, &[]).unwrap(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn mint_genesis_appends_block_zero() {
        let mut store = TransactionStore::new();
        assert_eq!(mint_genesis(&mut store, &["alice"]).unwrap(), Some(BlockKey(0)));
        assert_eq!(store.lookup_output("0", 0).unwrap().address, "alice");
        assert_eq!(store.transfer_count(), 0);
    }

    #[test]
    fn mint_genesis_fails_on_non_empty_store() {
        let mut store = TransactionStore::new();
        mint_genesis(&mut store, &["alice"]).unwrap();
        let err = mint_genesis(&mut store, &["bob"]).unwrap_err();
        assert_eq!(err, StoreError::NonSequentialBlock { expected: 1, got: 0 });
    }
}
