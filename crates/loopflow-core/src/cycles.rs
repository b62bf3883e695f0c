//! Address-local cycle counting.
//!
//! For every output minted in a block range, a depth-bounded DFS follows
//! transfers whose target shares the root's address and counts each return
//! to the root. A cycle of length `L` is therefore counted once per starting
//! output in range, and only when `L <= max_cycle_length`.
//!
//! The search keeps an on-path set per root (not a global visited set), so an
//! output can take part in cycles from several roots while a single root's
//! search never loops. Cost is exponential in fan-out, bounded by
//! `max_cycle_length`; this is meant for small address graphs.

use std::collections::HashSet;

use crate::error::QueryError;
use crate::traits::OutputGraph;
use crate::types::{BlockKey, Vertex, VertexId};

/// A validated cycle-count request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleQuery {
    /// First block key scanned (inclusive).
    pub from_block: i64,
    /// Last block key scanned (inclusive).
    pub to_block: i64,
    /// Longest cycle still counted.
    pub max_cycle_length: i64,
}

impl CycleQuery {
    pub fn new(from_block: i64, to_block: i64, max_cycle_length: i64) -> Self {
        Self {
            from_block,
            to_block,
            max_cycle_length,
        }
    }

    /// Parse the three raw request parameters. Each is required.
    pub fn from_params(
        from_block: Option<&str>,
        to_block: Option<&str>,
        max_cycle_length: Option<&str>,
    ) -> Result<Self, QueryError> {
        Ok(Self {
            from_block: parse_param("fromBlock", from_block)?,
            to_block: parse_param("toBlock", to_block)?,
            max_cycle_length: parse_param("maxCycleLength", max_cycle_length)?,
        })
    }

    /// Run the query against `graph`.
    pub fn run<G: OutputGraph + ?Sized>(&self, graph: &G) -> u64 {
        count_cycles_in_range(graph, self.from_block, self.to_block, self.max_cycle_length)
    }
}

fn parse_param(name: &'static str, value: Option<&str>) -> Result<i64, QueryError> {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .ok_or(QueryError::InvalidParameter { name })
}

/// Count address-local cycles rooted at outputs of blocks `from_block..=to_block`.
///
/// Missing block keys are skipped; `from_block > to_block` yields 0.
pub fn count_cycles_in_range<G: OutputGraph + ?Sized>(
    graph: &G,
    from_block: i64,
    to_block: i64,
    max_cycle_length: i64,
) -> u64 {
    let Some(last) = graph.block_count().checked_sub(1) else {
        return 0;
    };
    if from_block > to_block || to_block < 0 || max_cycle_length < 1 {
        return 0;
    }
    let first = from_block.max(0) as u64;
    let last = last.min(to_block as u64);
    let max_len = max_cycle_length as u64;

    let mut count = 0;
    for key in first..=last {
        let Some(block) = graph.block(BlockKey(key)) else {
            continue;
        };
        for vertex in &block.vertices {
            count += count_cycles_from(graph, vertex, max_len);
        }
    }
    count
}

struct Frame {
    id: VertexId,
    depth: u64,
    next: usize,
}

/// Count cycles of length `1..=max_len` that start and end at `root`.
pub fn count_cycles_from<G: OutputGraph + ?Sized>(graph: &G, root: &Vertex, max_len: u64) -> u64 {
    let mut count = 0;
    let mut on_path = HashSet::from([root.id]);
    let mut stack = vec![Frame {
        id: root.id,
        depth: 0,
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let successors = graph.spenders(&frame.id);
        let depth = frame.depth + 1;
        if depth > max_len || frame.next >= successors.len() {
            on_path.remove(&frame.id);
            stack.pop();
            continue;
        }

        let next = successors[frame.next];
        frame.next += 1;

        let Some(vertex) = graph.vertex(&next) else {
            continue;
        };
        if vertex.address != root.address {
            continue;
        }
        if next == root.id {
            count += 1;
        } else if on_path.insert(next) {
            stack.push(Frame {
                id: next,
                depth,
                next: 0,
            });
        }
    }

    count
}
