//! End-to-end tests for the store and the shared ledger.
//!
//! Each test builds a ledger or store from scratch, ingests descriptor
//! batches, and checks what a client observes: assigned block keys, the
//! accepted and skipped descriptors, and cycle counts over block ranges.

use std::thread;

use loopflow_core::count_cycles_in_range;
use loopflow_core::error::{IngestError, LookupError, LoopflowError, QueryError};
use loopflow_core::ingest::add_transactions;
use loopflow_core::store::TransactionStore;
use loopflow_core::traits::OutputGraph;
use loopflow_core::types::BlockKey;
use loopflow_node_lib::{Ledger, NodeConfig};
use loopflow_tests::helpers::*;
use proptest::prelude::*;

fn ledger() -> Ledger {
    Ledger::new(&NodeConfig::default()).unwrap()
}

// ======================================================================
// Ingestion
// ======================================================================

#[test]
fn e2e_valid_and_malformed_descriptors() {
    let l = ledger_with_genesis(&["alice", "bob"]);
    let report = l.add_transactions(&["0:0", "bad", "0:1", "0:x"]).unwrap();

    assert_eq!(report.block, BlockKey(1));
    assert_eq!(report.accepted, vec![vid(1, 0), vid(1, 1)]);
    let skipped: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
    assert_eq!(skipped, vec![1, 3]);

    let block = l.block(BlockKey(1)).unwrap();
    assert_eq!(block.vertices[0].address, "alice");
    assert_eq!(block.vertices[1].address, "bob");
}

#[test]
fn e2e_block_keys_are_dense() {
    let l = ledger();
    let mut keys = Vec::new();
    keys.push(l.add_transactions(&["A:0"]).unwrap().block);
    keys.push(l.add_transactions::<&str>(&[]).unwrap().block);
    keys.push(l.add_transactions(&["2:0"]).unwrap().block);
    keys.push(l.add_transactions(&["garbage"]).unwrap().block);
    keys.push(l.add_transactions(&["2:0", "4:0"]).unwrap().block);

    assert_eq!(keys, (0..5).map(BlockKey).collect::<Vec<_>>());
    assert_eq!(l.block_count(), 5);
}

#[test]
fn e2e_unknown_transaction_is_skipped() {
    let l = ledger();
    let report = l.add_transactions(&["A:0"]).unwrap();

    assert!(report.accepted.is_empty());
    assert_eq!(
        report.rejected[0].reason,
        IngestError::Lookup(LookupError::UnknownTransaction("A".into()))
    );
    assert!(l.block(BlockKey(0)).unwrap().vertices.is_empty());
    assert_eq!(l.status().transfers, 0);
}

#[test]
fn e2e_genesis_funds_later_blocks() {
    let l = ledger_with_genesis(&["alice"]);
    l.add_transactions(&["0:0"]).unwrap();
    l.add_transactions(&["1:0"]).unwrap();

    assert_eq!(l.block(BlockKey(2)).unwrap().vertices[0].address, "alice");
    assert_eq!(l.count_cycles_in_range(0, 2, 10), 0);
}

#[test]
fn e2e_back_reference_after_skipped_descriptor() {
    let l = ledger_with_genesis(&["alice", "bob"]);
    let report = l.add_transactions(&["nope:0", "0:0", "0:1", "1:1"]).unwrap();
    assert_eq!(report.accepted, vec![vid(1, 0), vid(1, 1), vid(1, 2)]);

    let block = l.block(BlockKey(1)).unwrap();
    let owners: Vec<&str> = block.vertices.iter().map(|v| v.address.as_str()).collect();
    assert_eq!(owners, ["alice", "bob", "bob"]);

    // A later block naming the same output sees the same owner.
    l.add_transactions(&["1:1"]).unwrap();
    assert_eq!(l.block(BlockKey(2)).unwrap().vertices[0].address, "bob");

    let l = ledger_with_genesis(&["alice"]);
    let report = l.add_transactions(&["nope:0", "0:0", "1:0"]).unwrap();
    assert_eq!(report.accepted, vec![vid(1, 0), vid(1, 1)]);
    assert_eq!(l.block(BlockKey(1)).unwrap().vertices[1].address, "alice");
}

// ======================================================================
// Cycle counting
// ======================================================================

#[test]
fn e2e_two_cycle_counts_once_per_member() {
    let l = ledger();
    l.add_transactions(&["0:1", "0:0"]).unwrap();

    assert_eq!(l.count_cycles_in_range(0, 0, 2), 2);
    assert_eq!(l.count_cycles_in_range(0, 0, 1), 0);
}

#[test]
fn e2e_max_length_zero_counts_nothing() {
    let l = ledger();
    l.add_transactions(&["0:0"]).unwrap();
    l.add_transactions(&["1:1", "1:0"]).unwrap();

    assert_eq!(l.count_cycles_in_range(0, 1, 0), 0);
    assert_eq!(l.count_cycles_in_range(0, 1, 2), 3);
}

#[test]
fn e2e_reversed_range_counts_nothing() {
    let l = ledger();
    l.add_transactions(&["0:1", "0:0"]).unwrap();
    assert_eq!(l.count_cycles_in_range(1, 0, 5), 0);
}

#[test]
fn e2e_queries_are_idempotent() {
    let store = store_from(&[], &[ring(0, 3), ring(1, 2)]);
    let first = count_cycles_in_range(&store, 0, 1, 3);
    let second = count_cycles_in_range(&store, 0, 1, 3);
    assert_eq!(first, 5);
    assert_eq!(first, second);
}

#[test]
fn e2e_rings_by_length() {
    let store = store_from(&[], &[ring(0, 2), ring(1, 3), ring(2, 4)]);

    assert_eq!(count_cycles_in_range(&store, 0, 2, 1), 0);
    assert_eq!(count_cycles_in_range(&store, 0, 2, 2), 2);
    assert_eq!(count_cycles_in_range(&store, 0, 2, 3), 5);
    assert_eq!(count_cycles_in_range(&store, 0, 2, 4), 9);
    assert_eq!(count_cycles_in_range(&store, 1, 1, 4), 3);
}

#[test]
fn e2e_tail_off_a_loop_adds_no_cycles() {
    let store = store_from(&[], &[vec!["0:1".into(), "0:0".into(), "0:1".into()]]);
    assert_eq!(store.spenders(&vid(0, 1)), &[vid(0, 0), vid(0, 2)]);
    assert_eq!(count_cycles_in_range(&store, 0, 0, 5), 2);
}

#[test]
fn e2e_range_beyond_tip_is_clamped() {
    let l = ledger_with_genesis(&["alice"]);
    l.add_transactions(&ring(1, 2)).unwrap();
    assert_eq!(l.count_cycles_in_range(-10, 1_000, 2), 2);
    assert_eq!(l.count_cycles_in_range(2, 1_000, 2), 0);
}

#[test]
fn e2e_invalid_query_parameter() {
    let l = ledger();
    let err = l.count_cycles_from_params(Some("0"), Some("1"), Some("two")).unwrap_err();
    assert!(matches!(
        err,
        LoopflowError::Query(QueryError::InvalidParameter { name: "maxCycleLength" })
    ));
    assert_eq!(err.to_string(), "Invalid maxCycleLength value");
}

// ======================================================================
// Concurrency
// ======================================================================

#[test]
fn e2e_concurrent_ingest_and_query() {
    let l = ledger();
    l.add_transactions(&ring(0, 2)).unwrap();

    let writers: Vec<_> = (0..4)
        .map(|_| {
            let l = l.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    let key = l.block_count();
                    // Key may be stale by the time the write lock is taken;
                    // either way the batch is ingested under the next key.
                    l.add_transactions(&[format!("{key}:0")]).unwrap();
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let l = l.clone();
            thread::spawn(move || {
                for _ in 0..20 {
                    assert_eq!(l.count_cycles_in_range(0, 0, 2), 2);
                }
            })
        })
        .collect();

    for h in writers.into_iter().chain(readers) {
        h.join().unwrap();
    }
    assert_eq!(l.block_count(), 81);
    for key in 0..81 {
        assert_eq!(l.block(BlockKey(key)).unwrap().key, BlockKey(key));
    }
}

// ======================================================================
// Properties
// ======================================================================

fn descriptor() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => (0u64..6, 0u64..4).prop_map(|(t, i)| format!("{t}:{i}")),
        1 => "[a-z:]{0,5}",
    ]
}

proptest! {
    #[test]
    fn every_descriptor_is_accepted_or_rejected(
        batches in prop::collection::vec(prop::collection::vec(descriptor(), 0..6), 1..6),
    ) {
        let mut store = TransactionStore::new();
        for (key, batch) in batches.iter().enumerate() {
            let report = add_transactions(&mut store, batch, MINER).unwrap();
            prop_assert_eq!(report.block, BlockKey(key as u64));
            prop_assert_eq!(report.accepted.len() + report.rejected.len(), batch.len());
        }
        prop_assert_eq!(store.block_count(), batches.len() as u64);
    }

    #[test]
    fn count_grows_with_max_length(
        batches in prop::collection::vec(prop::collection::vec(descriptor(), 0..6), 1..5),
        max_len in 0i64..6,
    ) {
        let store = store_from(&["x", "y"], &batches);
        let last = store.block_count() as i64 - 1;
        let shorter = count_cycles_in_range(&store, 0, last, max_len);
        let longer = count_cycles_in_range(&store, 0, last, max_len + 1);
        prop_assert!(shorter <= longer);
    }
}
