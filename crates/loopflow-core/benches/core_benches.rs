//! Criterion benchmarks for loopflow-core critical operations.
//!
//! Covers: descriptor ingestion and bounded cycle counting on ring-shaped
//! and densely connected blocks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use loopflow_core::genesis::mint_genesis;
use loopflow_core::ingest::add_transactions;
use loopflow_core::store::TransactionStore;
use loopflow_core::types::{Block, BlockKey, Transfer, Vertex, VertexId};
use loopflow_core::count_cycles_in_range;

/// A block whose `n` outputs fund each other in a single ring.
fn ring_descriptors(key: u64, n: u64) -> Vec<String> {
    (0..n).map(|i| format!("{key}:{}", (i + n - 1) % n)).collect()
}

/// One block of `n` same-address outputs where every output funds every other.
fn complete_block(n: u64) -> TransactionStore {
    let key = BlockKey(0);
    let block = Block {
        key,
        vertices: (0..n).map(|i| Vertex::new(VertexId::new(key, i), "dense")).collect(),
    };
    let transfers = (0..n)
        .flat_map(|from| {
            (0..n)
                .filter(move |&to| to != from)
                .map(move |to| Transfer {
                    from: VertexId::new(key, from),
                    to: VertexId::new(key, to),
                })
        })
        .collect();
    let mut store = TransactionStore::new();
    store.append_block(block, transfers).expect("sequential key");
    store
}

fn bench_ingest(c: &mut Criterion) {
    let descriptors: Vec<String> = (0..1_000).map(|i| format!("0:{}", i % 16)).collect();

    c.bench_function("add_transactions_1000_prior_refs", |b| {
        b.iter(|| {
            let mut store = TransactionStore::new();
            let genesis: Vec<String> = (0..16).map(|i| format!("addr{i}")).collect();
            mint_genesis(&mut store, &genesis).unwrap();
            add_transactions(&mut store, black_box(&descriptors), "miner").unwrap()
        })
    });

    let ring = ring_descriptors(0, 1_000);
    c.bench_function("add_transactions_1000_ring", |b| {
        b.iter(|| {
            let mut store = TransactionStore::new();
            add_transactions(&mut store, black_box(&ring), "miner").unwrap()
        })
    });
}

fn bench_cycles(c: &mut Criterion) {
    let mut rings = TransactionStore::new();
    for key in 0..100 {
        add_transactions(&mut rings, &ring_descriptors(key, 8), "miner").unwrap();
    }
    c.bench_function("count_cycles_100_rings_of_8", |b| {
        b.iter(|| count_cycles_in_range(black_box(&rings), 0, 99, 8))
    });

    let dense = complete_block(7);
    c.bench_function("count_cycles_complete_7_len_5", |b| {
        b.iter(|| count_cycles_in_range(black_box(&dense), 0, 0, 5))
    });
}

criterion_group!(benches, bench_ingest, bench_cycles);
criterion_main!(benches);
