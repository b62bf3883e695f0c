//! End-to-end test suite for Loopflow.
//!
//! Drives the store, the shared ledger and the HTTP gateway through the
//! scenarios a client sees: batch ingestion, skipped descriptors, dense
//! block keys and cycle queries over block ranges.

pub mod helpers;
