//! Core value types: block keys, vertex ids, vertices, blocks and transfers.
//!
//! A vertex is one transaction output. Its id is the key of the block that
//! minted it plus its position in that block, rendered `"<block>:<position>"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::DESCRIPTOR_SEPARATOR;
use crate::error::DescriptorError;

/// Key of a block: the store's block count at the time the block was appended.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(transparent)]
pub struct BlockKey(pub u64);

impl BlockKey {
    /// The first block ever appended.
    pub const GENESIS: Self = Self(0);

    /// The key following this one.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Transaction id under which this block's outputs are referenced.
    pub fn txid(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for BlockKey {
    fn from(key: u64) -> Self {
        Self(key)
    }
}

/// Identifier of one output: `(block, position)`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId {
    /// Block that minted the output.
    pub block: BlockKey,
    /// Position of the output within its block.
    pub position: u64,
}

impl VertexId {
    pub fn new(block: BlockKey, position: u64) -> Self {
        Self { block, position }
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DESCRIPTOR_SEPARATOR}{}", self.block, self.position)
    }
}

impl FromStr for VertexId {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DescriptorError::InvalidVertexId(s.to_string());
        let (block, position) = s.split_once(DESCRIPTOR_SEPARATOR).ok_or_else(invalid)?;
        let block = block.parse::<u64>().map_err(|_| invalid())?;
        let position = position.parse::<u64>().map_err(|_| invalid())?;
        Ok(Self::new(BlockKey(block), position))
    }
}

/// One transaction output, owned by `address`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Vertex {
    pub id: VertexId,
    pub address: String,
}

impl Vertex {
    pub fn new(id: VertexId, address: impl Into<String>) -> Self {
        Self {
            id,
            address: address.into(),
        }
    }
}

/// An ordered batch of vertices minted by one ingestion call.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub key: BlockKey,
    pub vertices: Vec<Vertex>,
}

impl Block {
    /// Create an empty block under `key`.
    pub fn empty(key: BlockKey) -> Self {
        Self {
            key,
            vertices: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Output at `index`, if in range.
    pub fn output(&self, index: u64) -> Option<&Vertex> {
        usize::try_from(index).ok().and_then(|i| self.vertices.get(i))
    }
}

/// Value-flow edge: output `from` funds output `to`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transfer {
    pub from: VertexId,
    pub to: VertexId,
}

/// Parsed descriptor: output `index` of transaction `txid`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OutputRef {
    /// Referenced transaction id, as supplied by the caller.
    pub txid: String,
    /// Output index within the referenced transaction.
    pub index: u64,
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{DESCRIPTOR_SEPARATOR}{}", self.txid, self.index)
    }
}

impl FromStr for OutputRef {
    type Err = DescriptorError;

    /// Parse `"<txid>:<index>"`. Surrounding whitespace is ignored.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let fields: Vec<&str> = trimmed.split(DESCRIPTOR_SEPARATOR).collect();
        let [txid, index] = fields.as_slice() else {
            return Err(DescriptorError::WrongFieldCount {
                raw: raw.to_string(),
                fields: fields.len(),
            });
        };
        let index = index
            .parse::<u64>()
            .map_err(|_| DescriptorError::InvalidOutputIndex(index.to_string()))?;
        Ok(Self {
            txid: txid.to_string(),
            index,
        })
    }
}
