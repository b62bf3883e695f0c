//! Error types for Loopflow.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("invalid transaction format: {raw:?} has {fields} field(s), expected 2")] WrongFieldCount { raw: String, fields: usize },
    #[error("invalid transaction output index: {0:?}")] InvalidOutputIndex(String),
    #[error("invalid vertex id: {0:?}")] InvalidVertexId(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown transaction: {0}")] UnknownTransaction(String),
    #[error("output index out of range: {txid}:{index} (transaction has {len} output(s))")] OutputOutOfRange { txid: String, index: u64, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error(transparent)] Descriptor(#[from] DescriptorError),
    #[error(transparent)] Lookup(#[from] LookupError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("non-sequential block: expected key {expected}, got {got}")] NonSequentialBlock { expected: u64, got: u64 },
    #[error("transfer references unknown vertex: {0}")] DanglingTransfer(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid {name} value")] InvalidParameter { name: &'static str },
}

#[derive(Error, Debug)]
pub enum LoopflowError {
    #[error(transparent)] Ingest(#[from] IngestError),
    #[error(transparent)] Store(#[from] StoreError),
    #[error(transparent)] Query(#[from] QueryError),
}
