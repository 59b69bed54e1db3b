//! Render pass: turns the tree into rows.
//!
//! The walk is iterative so that arbitrarily deep data cannot exhaust the
//! call stack. Rows come out in display order (pre-order, children after
//! their parent, trailer rows after the last materialized child).

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::action::ActionButton;
use crate::node::{NodeFields, NodeKey, display_value};
use crate::source::FetchError;

use super::expansion::{Expansion, NodeState};
use super::fetch::FetchTask;
use super::pagination::{self, ChildrenStatus};
use super::state::{Tree, TreeInner};

/// A rendered node.
#[derive(Debug, Clone)]
pub struct NodeRow {
    /// Stable identity.
    pub key: NodeKey,
    /// Index path at render time.
    pub path: Vec<usize>,
    /// Children of the root are depth 0.
    pub depth: usize,
    pub label: String,
    /// Raw identity value, if the node has one.
    pub value: Option<Value>,
    pub expanded: bool,
    /// Fold icon when collapsed, unfold icon when expanded.
    pub icon: String,
    pub children: ChildrenStatus,
    pub actions: Vec<ActionButton>,
    pub actions_align_right: bool,
}

impl NodeRow {
    /// Returns `true` if toggling this row cannot reveal anything.
    pub fn is_leaf(&self) -> bool {
        self.children.is_leaf()
    }

    /// Renderer-facing element id, `tree-leaf-<value>`.
    pub fn row_id(&self) -> String {
        let value = self.value.as_ref().map(display_value).unwrap_or_default();
        format!("tree-leaf-{value}")
    }
}

/// One line of rendered output.
#[derive(Debug, Clone)]
pub enum Row {
    Node(NodeRow),
    /// More resident children are hidden behind a "load more" control.
    LoadMore {
        parent: NodeKey,
        depth: usize,
        remaining: usize,
    },
    /// Children of `parent` are being fetched.
    Pending { parent: NodeKey, depth: usize },
    /// Fetching children of `parent` failed.
    Failed {
        parent: NodeKey,
        depth: usize,
        error: FetchError,
    },
}

impl Row {
    /// Indentation depth of the row.
    pub fn depth(&self) -> usize {
        match self {
            Self::Node(row) => row.depth,
            Self::LoadMore { depth, .. } | Self::Pending { depth, .. } | Self::Failed { depth, .. } => {
                *depth
            }
        }
    }

    pub fn as_node(&self) -> Option<&NodeRow> {
        match self {
            Self::Node(row) => Some(row),
            _ => None,
        }
    }
}

/// Output of [`Tree::render`].
#[derive(Debug, Default)]
pub struct RenderPass {
    /// Caption above the rows, if configured and non-empty.
    pub title: Option<String>,
    pub rows: Vec<Row>,
    /// Children requests triggered by this pass.
    pub fetches: Vec<FetchTask>,
}

impl RenderPass {
    /// Iterates over node rows only.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeRow> {
        self.rows.iter().filter_map(Row::as_node)
    }

    /// Finds the row of a node.
    pub fn find(&self, key: &NodeKey) -> Option<&NodeRow> {
        self.nodes().find(|row| row.key == *key)
    }

    /// Finds the row currently at an index path.
    pub fn at_path(&self, path: &[usize]) -> Option<&NodeRow> {
        self.nodes().find(|row| row.path == path)
    }
}

enum Frame<'a> {
    Node {
        node: &'a Value,
        key: NodeKey,
        path: Vec<usize>,
        depth: usize,
    },
    Row(Row),
}

/// Pushes the materialized children of a node, plus a trailing "load more"
/// row, so that they pop in order.
fn push_children<'a>(
    stack: &mut Vec<Frame<'a>>,
    children: &'a [Value],
    shown: usize,
    parent: &NodeKey,
    parent_path: &[usize],
    depth: usize,
    fields: &NodeFields,
) {
    if shown < children.len() {
        stack.push(Frame::Row(Row::LoadMore {
            parent: parent.clone(),
            depth,
            remaining: children.len() - shown,
        }));
    }
    for (index, child) in children[..shown].iter().enumerate().rev() {
        let mut path = Vec::with_capacity(parent_path.len() + 1);
        path.extend_from_slice(parent_path);
        path.push(index);
        stack.push(Frame::Node {
            node: child,
            key: parent.child(fields.segment(child, index)),
            path,
            depth,
        });
    }
}

/// A row whose label and actions are not resolved yet.
enum Draft<'a> {
    Node {
        node: &'a Value,
        key: NodeKey,
        path: Vec<usize>,
        depth: usize,
        expanded: bool,
        children: ChildrenStatus,
    },
    Row(Row),
}

impl Tree {
    /// Renders every visible node.
    ///
    /// Creates state for newly mounted nodes, drops state for nodes that are
    /// no longer visible, and issues a children request for every expanded
    /// node whose children are missing and not already requested.
    ///
    /// Labels and actions are resolved after the tree lock is released, so
    /// those callbacks may read the tree.
    pub fn render(&self) -> RenderPass {
        let mut guard = self.write();
        let config = Arc::clone(&guard.config);
        let options = config.options();
        let fields = config.fields();
        let page_size = options.page_size();
        let source = config.children_source();

        let snapshot = Arc::clone(&guard.root);
        let root: &Value = &snapshot;
        let TreeInner { nodes, pending, .. } = &mut *guard;

        let mut fetches = Vec::new();
        let mut drafts = Vec::new();
        let mut mounted = HashSet::new();
        let mut stack = Vec::new();

        let root_key = NodeKey::root();
        let root_state = nodes
            .entry(root_key.clone())
            .or_insert_with(|| NodeState::root(page_size));
        if let Some(children) = fields.children(root) {
            let shown = pagination::shown(root_state.cursor, children.len());
            push_children(&mut stack, children, shown, &root_key, &[], 0, fields);
        }
        mounted.insert(root_key);

        while let Some(frame) = stack.pop() {
            let (node, key, path, depth) = match frame {
                Frame::Row(row) => {
                    drafts.push(Draft::Row(row));
                    continue;
                }
                Frame::Node {
                    node,
                    key,
                    path,
                    depth,
                } => (node, key, path, depth),
            };

            let index = path.last().copied().unwrap_or(0);
            let state = nodes.entry(key.clone()).or_insert_with(|| {
                NodeState::new(Expansion::initial(options, depth, index), page_size)
            });
            let expanded = state.is_expanded();
            let children = fields.children(node);

            if expanded
                && children.is_none()
                && !state.settled
                && let Some(source) = source
                && let Some(task) = FetchTask::issue(self, pending, source, &key, node, depth)
            {
                fetches.push(task);
            }

            let status = pagination::children_status(
                children,
                source.is_some(),
                pending.contains(&key),
                state.failed.as_ref(),
                state.cursor,
            );

            if expanded {
                match (&status, children) {
                    (ChildrenStatus::Resident { shown, .. }, Some(children)) => {
                        push_children(&mut stack, children, *shown, &key, &path, depth + 1, fields);
                    }
                    (ChildrenStatus::Pending, _) => stack.push(Frame::Row(Row::Pending {
                        parent: key.clone(),
                        depth: depth + 1,
                    })),
                    (ChildrenStatus::Failed(error), _) => stack.push(Frame::Row(Row::Failed {
                        parent: key.clone(),
                        depth: depth + 1,
                        error: error.clone(),
                    })),
                    _ => {}
                }
            }

            mounted.insert(key.clone());
            drafts.push(Draft::Node {
                node,
                key,
                path,
                depth,
                expanded,
                children: status,
            });
        }

        nodes.retain(|key, _| mounted.contains(key));
        let mounted_len = nodes.len();
        drop(guard);

        let rows: Vec<Row> = drafts
            .into_iter()
            .map(|draft| match draft {
                Draft::Node {
                    node,
                    key,
                    path,
                    depth,
                    expanded,
                    children,
                } => Row::Node(NodeRow {
                    label: config.label(node),
                    value: fields.value(node).cloned(),
                    icon: config.icon(expanded).to_string(),
                    actions: config
                        .actions(node, depth, expanded)
                        .iter()
                        .enumerate()
                        .filter_map(|(i, action)| action.to_button(i, options.actions_align_right))
                        .collect(),
                    key,
                    path,
                    depth,
                    expanded,
                    children,
                    actions_align_right: options.actions_align_right,
                }),
                Draft::Row(row) => row,
            })
            .collect();

        log::trace!(
            "Rendered {} rows, {} mounted nodes, {} new fetches",
            rows.len(),
            mounted_len,
            fetches.len()
        );
        RenderPass {
            title: options.title.clone().filter(|t| !t.is_empty()),
            rows,
            fetches,
        }
    }
}
