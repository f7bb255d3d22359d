use thiserror::Error;

use crate::datastructures::Id;

#[derive(Error, Debug)]
pub enum CorrelateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON on line {line}: {source}")]
    MalformedJson {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown element type '{kind}' on line {line}")]
    UnknownElementType { line: usize, kind: String },

    #[error("Invalid identifier '{raw}' on line {line}")]
    InvalidId { line: usize, raw: String },

    #[error("Malformed {label} payload on line {line}: {reason}")]
    MalformedPayload {
        line: usize,
        label: String,
        reason: String,
    },

    #[error("Element on line {line} references unknown {expected} {id}")]
    UnknownReference {
        line: usize,
        id: Id,
        expected: &'static str,
    },

    #[error("Document on line {line} appears before the metaData vertex")]
    MissingMetaData { line: usize },

    #[error("Cyclic next chain through element {id}")]
    NextCycle { id: Id },

    #[error("Failed to list repository children: {reason}")]
    ChildrenSource { reason: String },

    #[error("Failed to build bloom filter: {reason}")]
    BloomFilter { reason: String },

    #[error("Dangling {kind} reference {id} in correlated state")]
    DanglingReference { kind: &'static str, id: Id },
}

pub type CorrelateResult<T> = Result<T, CorrelateError>;
