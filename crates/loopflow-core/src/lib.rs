//! # loopflow-core
//! Value-flow graph over synthetic blocks and address-local cycle counting.
//!
//! - [`store::TransactionStore`] — append-only blocks, outputs and transfers
//! - [`ingest`] — descriptor batches into blocks
//! - [`cycles`] — bounded DFS counting cycles confined to one address
//! - [`genesis`] — optional block 0 allocation
//! - [`traits::OutputGraph`] — read-only graph view the search runs against

pub mod constants;
pub mod cycles;
pub mod error;
pub mod genesis;
pub mod ingest;
pub mod store;
pub mod traits;
pub mod types;

pub use cycles::{count_cycles_in_range, CycleQuery};
pub use ingest::{add_transactions, IngestReport};
pub use store::TransactionStore;
