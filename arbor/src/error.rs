//! Error types

use crate::node::NodeKey;
use crate::source::FetchError;

/// Errors produced by the tree engine.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// An index path points past the end of a children array, or descends
    /// into a node that has no children array at all.
    #[error("index path {path:?} is out of range at step {step}{}", describe_len(.len))]
    OutOfRange {
        /// The full path that was being resolved.
        path: Vec<usize>,
        /// Position within `path` where resolution failed.
        step: usize,
        /// Length of the children array at that step, `None` if absent.
        len: Option<usize>,
    },

    /// A lazy children fetch failed.
    #[error("children fetch for node {key} failed: {source}")]
    LazyFetchFailed {
        /// The node whose children were requested.
        key: NodeKey,
        /// The error returned by the children source.
        #[source]
        source: FetchError,
    },

    /// The node addressed by a key is no longer in the data.
    #[error("node {key} not found")]
    NodeNotFound {
        /// The key that failed to resolve.
        key: NodeKey,
    },

    /// Fetched children were delivered for a node that is not a JSON object.
    #[error("node {key} cannot hold children")]
    NotAnObject {
        /// The node whose children were requested.
        key: NodeKey,
    },

    /// Options JSON had the wrong shape.
    #[error("invalid tree options: {0}")]
    Options(#[from] serde_json::Error),
}

fn describe_len(len: &Option<usize>) -> String {
    match len {
        Some(len) => format!(" (children length {len})"),
        None => " (node has no children)".to_string(),
    }
}

impl TreeError {
    /// Creates an out-of-range error.
    pub fn out_of_range(path: &[usize], step: usize, len: Option<usize>) -> Self {
        Self::OutOfRange {
            path: path.to_vec(),
            step,
            len,
        }
    }

    /// Returns `true` if this is an addressing failure.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    /// Returns the fetch error if this error came from a children source.
    pub fn fetch_error(&self) -> Option<&FetchError> {
        match self {
            Self::LazyFetchFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
