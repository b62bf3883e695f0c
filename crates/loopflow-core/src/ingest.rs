//! Ingestion: turning descriptor batches into blocks.
//!
//! Each descriptor `"<txid>:<index>"` names the output funding one new
//! output. The new output inherits the funding output's address and a
//! [`Transfer`] from the funding output to the new one is recorded.
//!
//! Resolution rules, in order:
//! 1. A descriptor that does not parse is skipped.
//! 2. Any txid other than the new block's key resolves through
//!    [`OutputGraph::lookup_output`]. An unknown txid or out-of-range index
//!    skips the descriptor.
//! 3. A txid equal to the new block's key names the output at that position
//!    of the new block itself, exactly as `lookup_output` would once the
//!    block is stored. An output earlier in the batch is a plain
//!    back-reference. A position the batch never reaches skips the
//!    descriptor.
//! 4. Chains of in-block references are followed until they reach a prior
//!    output. A chain that closes on itself is self-funded and owned by the
//!    block's coinbase address.
//!
//! Accepted outputs get dense positions in descriptor order. A batch with no
//! accepted descriptor still produces an (empty) block.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::constants::BATCH_SEPARATOR;
use crate::error::{IngestError, LookupError, StoreError};
use crate::store::TransactionStore;
use crate::traits::OutputGraph;
use crate::types::{Block, BlockKey, OutputRef, Transfer, Vertex, VertexId};

/// A descriptor that did not become an output, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDescriptor {
    /// Position of the descriptor in the submitted batch.
    pub index: usize,
    /// The descriptor as submitted.
    pub descriptor: String,
    pub reason: IngestError,
}

/// A block ready to be appended, with its transfers.
#[derive(Debug, Clone)]
pub struct AssembledBlock {
    pub block: Block,
    pub transfers: Vec<Transfer>,
    pub rejected: Vec<RejectedDescriptor>,
}

/// Outcome of one ingestion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Key assigned to the new block.
    pub block: BlockKey,
    /// Ids of the minted outputs, in block order.
    pub accepted: Vec<VertexId>,
    /// Descriptors that were skipped, in batch order.
    pub rejected: Vec<RejectedDescriptor>,
}

/// Split the comma-separated `transactions` wire field into descriptors.
///
/// An empty field yields a single empty descriptor, which is then rejected
/// as malformed.
pub fn split_descriptors(field: &str) -> Vec<&str> {
    field.split(BATCH_SEPARATOR).collect()
}

/// Where a descriptor draws its funds from.
#[derive(Debug, Clone)]
enum Funding {
    /// An output of an earlier block.
    Prior { id: VertexId, address: String },
    /// The output at this position of the block being assembled.
    InBlock(u64),
}

struct Candidate<'a> {
    index: usize,
    raw: &'a str,
    funding: Result<Funding, IngestError>,
}

/// Resolve `descriptors` against `graph` into the next block.
///
/// Does not modify anything: the caller appends the result. `coinbase` owns
/// any self-funded outputs.
pub fn assemble_block<G, S>(graph: &G, descriptors: &[S], coinbase: &str) -> AssembledBlock
where
    G: OutputGraph + ?Sized,
    S: AsRef<str>,
{
    let key = BlockKey(graph.block_count());
    let own_txid = key.txid();
    let mut rejected = Vec::new();
    let mut reject = |candidate: &Candidate<'_>, reason: IngestError| {
        rejected.push(RejectedDescriptor {
            index: candidate.index,
            descriptor: candidate.raw.to_string(),
            reason,
        })
    };

    let candidates: Vec<Candidate<'_>> = descriptors
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let raw: &str = raw.as_ref();
            let funding = raw
                .parse::<OutputRef>()
                .map_err(IngestError::from)
                .and_then(|output| {
                    if output.txid == own_txid {
                        Ok(Funding::InBlock(output.index))
                    } else {
                        graph
                            .lookup_output(&output.txid, output.index)
                            .map(|v| Funding::Prior {
                                id: v.id,
                                address: v.address.clone(),
                            })
                            .map_err(IngestError::from)
                    }
                });
            Candidate { index, raw, funding }
        })
        .collect();

    let mut viable = Vec::new();
    for (i, candidate) in candidates.iter().enumerate() {
        match &candidate.funding {
            Ok(_) => viable.push(i),
            Err(reason) => reject(candidate, reason.clone()),
        }
    }

    let (slots, dropped) = lay_out(&candidates, viable, &own_txid);
    for (i, reason) in dropped {
        reject(&candidates[i], reason);
    }

    let fundings: Vec<&Funding> = slots
        .iter()
        .filter_map(|&i| candidates[i].funding.as_ref().ok())
        .collect();
    let owners = resolve_owners(&fundings, coinbase);

    let mut block = Block::empty(key);
    let mut transfers = Vec::new();
    for (position, (funding, address)) in fundings.iter().zip(owners).enumerate() {
        let id = VertexId::new(key, position as u64);
        let from = match funding {
            Funding::Prior { id, .. } => *id,
            Funding::InBlock(target) => VertexId::new(key, *target),
        };
        transfers.push(Transfer { from, to: id });
        block.vertices.push(Vertex::new(id, address));
    }

    rejected.sort_by_key(|r| r.index);
    for r in &rejected {
        warn!(block = %key, descriptor = %r.descriptor, error = %r.reason, "skipping transaction");
    }

    AssembledBlock {
        block,
        transfers,
        rejected,
    }
}

/// Assign block positions to the `viable` candidates.
///
/// An in-block reference must name a position the finished block has.
/// Dropping a reference shortens the block, which can strand another one,
/// so the layout is repeated until every in-block reference lands. Returns
/// the candidate index at each position and the dropped candidates.
fn lay_out(
    candidates: &[Candidate<'_>],
    mut slots: Vec<usize>,
    own_txid: &str,
) -> (Vec<usize>, Vec<(usize, IngestError)>) {
    let mut dropped = HashMap::new();
    loop {
        let len = slots.len();
        let stranded: Vec<(usize, u64)> = slots
            .iter()
            .filter_map(|&i| match candidates[i].funding {
                Ok(Funding::InBlock(target)) if target >= len as u64 => Some((i, target)),
                _ => None,
            })
            .collect();
        if stranded.is_empty() {
            return (slots, dropped.into_iter().collect());
        }
        for (i, target) in stranded {
            let reason = LookupError::OutputOutOfRange {
                txid: own_txid.to_string(),
                index: target,
                len,
            };
            dropped.insert(i, IngestError::from(reason));
        }
        slots.retain(|i| !dropped.contains_key(i));
    }
}

#[derive(Debug, Clone)]
enum Owner {
    Pending,
    Visiting,
    Owned(String),
}

/// Follow in-block funding chains and settle the owner of every position.
fn resolve_owners(fundings: &[&Funding], coinbase: &str) -> Vec<String> {
    let mut owners = vec![Owner::Pending; fundings.len()];

    for start in 0..fundings.len() {
        let mut path = Vec::new();
        let mut current = start;
        let address = loop {
            match &owners[current] {
                Owner::Pending => {
                    owners[current] = Owner::Visiting;
                    path.push(current);
                    match fundings[current] {
                        Funding::Prior { address, .. } => break address.clone(),
                        Funding::InBlock(target) => current = *target as usize,
                    }
                }
                // Closed a loop inside this walk: self-funded.
                Owner::Visiting => break coinbase.to_string(),
                Owner::Owned(address) => break address.clone(),
            }
        };
        for node in path {
            owners[node] = Owner::Owned(address.clone());
        }
    }

    owners
        .into_iter()
        .map(|owner| match owner {
            Owner::Owned(address) => address,
            Owner::Pending | Owner::Visiting => coinbase.to_string(),
        })
        .collect()
}

/// Assemble the next block from `descriptors` and append it to `store`.
pub fn add_transactions<S: AsRef<str>>(
    store: &mut TransactionStore,
    descriptors: &[S],
    coinbase: &str,
) -> Result<IngestReport, StoreError> {
    let AssembledBlock {
        block,
        transfers,
        rejected,
    } = assemble_block(&*store, descriptors, coinbase);

    let key = block.key;
    let accepted: Vec<VertexId> = block.vertices.iter().map(|v| v.id).collect();
    store.append_block(block, transfers)?;

    info!(
        block = %key,
        accepted = accepted.len(),
        rejected = rejected.len(),
        "mined block"
    );

    Ok(IngestReport {
        block: key,
        accepted,
        rejected,
    })
}
