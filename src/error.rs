//! Error types
//!
//! Selector compilation failures are returned to the caller. Evaluation
//! failures are produced by the evaluator but the query session swallows
//! them, logging and degrading to partial results.

use std::path::PathBuf;

use thiserror::Error;

use crate::index::NodeAddress;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A query was issued before any document was bound to the session.
    #[error("no document loaded")]
    DocumentNotLoaded,

    /// The selector is malformed or uses an unsupported construct.
    #[error("failed to compile XPath expression `{expression}`: {reason}")]
    QueryCompilation { expression: String, reason: String },

    /// Navigation failed while iterating matches.
    #[error("failed to evaluate XPath expression `{expression}`: {reason}")]
    Evaluation { expression: String, reason: String },

    /// A node address that does not resolve to a readable element.
    #[error("invalid node {address}: {reason}")]
    InvalidNode { address: NodeAddress, reason: String },

    #[error("failed to parse XML document: {0}")]
    Parse(#[from] ParseError),

    #[error("failed to read XML file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported encoding `{0}`")]
    UnsupportedEncoding(String),

    #[error("invalid parser configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn compilation(expression: &str, reason: impl Into<String>) -> Self {
        Error::QueryCompilation {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn evaluation(expression: &str, reason: impl Into<String>) -> Self {
        Error::Evaluation {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_node(address: NodeAddress, reason: impl Into<String>) -> Self {
        Error::InvalidNode {
            address,
            reason: reason.into(),
        }
    }

    /// True for failures that the query session degrades to empty results.
    pub fn is_fail_soft(&self) -> bool {
        matches!(self, Error::DocumentNotLoaded | Error::Evaluation { .. } | Error::InvalidNode { .. })
    }
}

/// A well-formedness violation, located by byte offset into the decoded input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}
