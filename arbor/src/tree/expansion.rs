//! Expand/collapse state machine.

use crate::config::TreeOptions;
use crate::error::TreeError;
use crate::source::FetchError;

use super::pagination;

/// Expansion state of one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Expansion {
    #[default]
    Collapsed,
    Expanded,
}

impl Expansion {
    /// Initial state of a node at `depth`, being child `index` of its parent.
    ///
    /// `expandAll` wins; otherwise `expandFirst` opens only the first
    /// top-level node.
    pub fn initial(options: &TreeOptions, depth: usize, index: usize) -> Self {
        if options.expand_all || (options.expand_first && depth == 0 && index == 0) {
            Self::Expanded
        } else {
            Self::Collapsed
        }
    }

    pub fn is_expanded(self) -> bool {
        self == Self::Expanded
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Collapsed => Self::Expanded,
            Self::Expanded => Self::Collapsed,
        }
    }
}

/// Per-node state owned by the tree, never written into node data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NodeState {
    pub expansion: Expansion,
    /// Pagination cursor: how many children may be materialized.
    pub cursor: usize,
    /// Last fetch failure, cleared when the node is collapsed.
    pub failed: Option<FetchError>,
    /// A fetch completed while the node was expanded. No further request is
    /// issued until it collapses.
    pub settled: bool,
}

impl NodeState {
    pub fn new(expansion: Expansion, page_size: Option<usize>) -> Self {
        Self {
            expansion,
            cursor: pagination::initial_cursor(page_size),
            failed: None,
            settled: false,
        }
    }

    /// State of the hidden root container, which is always expanded.
    pub fn root(page_size: Option<usize>) -> Self {
        Self::new(Expansion::Expanded, page_size)
    }

    pub fn is_expanded(&self) -> bool {
        self.expansion.is_expanded()
    }

    /// Flips the expansion and returns the new state.
    pub fn toggle(&mut self) -> Expansion {
        self.expansion = self.expansion.toggled();
        if !self.expansion.is_expanded() {
            self.failed = None;
            self.settled = false;
        }
        self.expansion
    }

    /// Records the outcome of a fetch for this node.
    ///
    /// Ignored while collapsed: the expansion that asked for it has ended.
    pub fn settle(&mut self, outcome: &Result<usize, TreeError>) {
        if !self.is_expanded() {
            return;
        }
        self.settled = true;
        self.failed = match outcome {
            Ok(_) => None,
            Err(err) => Some(
                err.fetch_error()
                    .cloned()
                    .unwrap_or_else(|| FetchError::new(err.to_string())),
            ),
        };
    }
}
