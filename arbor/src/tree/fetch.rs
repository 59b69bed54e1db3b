//! Lazy children fetches.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::TreeError;
use crate::node::NodeKey;
use crate::path;
use crate::source::{ChildrenSource, FetchResult};

use super::state::{Tree, TreeInner};

/// A children request that has been issued but not yet run.
///
/// The tree never drives futures itself. Await [`FetchTask::run`] or hand it
/// to an executor; the node stays pending until it completes.
///
/// ```ignore
/// for task in tree.render().fetches {
///     tokio::spawn(task.run());
/// }
/// ```
pub struct FetchTask {
    tree: Tree,
    key: NodeKey,
    node: Value,
    depth: usize,
    source: Arc<dyn ChildrenSource>,
}

impl fmt::Debug for FetchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchTask")
            .field("tree", &self.tree.id())
            .field("key", &self.key)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl FetchTask {
    /// Issues a request for `key` unless one is already in flight.
    pub(super) fn issue(
        tree: &Tree,
        pending: &mut HashSet<NodeKey>,
        source: &Arc<dyn ChildrenSource>,
        key: &NodeKey,
        node: &Value,
        depth: usize,
    ) -> Option<Self> {
        if !pending.insert(key.clone()) {
            return None;
        }
        log::debug!("Requesting children of {} at depth {}", key, depth);
        Some(Self {
            tree: tree.clone(),
            key: key.clone(),
            node: node.clone(),
            depth,
            source: Arc::clone(source),
        })
    }

    /// The node whose children are requested.
    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Depth of that node.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Snapshot of the node taken when the request was issued.
    pub fn node(&self) -> &Value {
        &self.node
    }

    /// Runs the request and merges the result into the tree.
    ///
    /// Returns the number of children written. Failures are also passed to
    /// the configured error handler.
    pub async fn run(self) -> Result<usize, TreeError> {
        let Self {
            tree,
            key,
            node,
            depth,
            source,
        } = self;
        let result = source.request_children(node, depth).await;
        tree.complete_fetch(&key, result)
    }
}

impl Tree {
    /// Applies the outcome of a children request for `key`.
    ///
    /// Any outcome settles the node for its current expansion, so a result
    /// that cannot be merged is not requested again on the next render.
    pub(super) fn complete_fetch(&self, key: &NodeKey, result: FetchResult) -> Result<usize, TreeError> {
        let (config, outcome) = {
            let mut guard = self.write();
            guard.pending.remove(key);
            let config = Arc::clone(&guard.config);
            let outcome = match result {
                Ok(children) => merge_children(&mut guard, key, children.unwrap_or_default()),
                Err(source) => Err(TreeError::LazyFetchFailed {
                    key: key.clone(),
                    source,
                }),
            };
            if let Some(state) = guard.nodes.get_mut(key) {
                state.settle(&outcome);
            }
            (config, outcome)
        };
        self.mark_dirty();

        match &outcome {
            Ok(count) => log::debug!("Loaded {} children for {}", count, key),
            Err(err @ (TreeError::LazyFetchFailed { .. } | TreeError::NotAnObject { .. })) => {
                log::warn!("{}", err);
                config.report_error(err);
            }
            Err(err) => log::warn!("Dropping children for {}: {}", key, err),
        }
        outcome
    }
}

/// Writes `children` into the node at `key`. Writing the children the node
/// already has changes nothing.
fn merge_children(
    inner: &mut TreeInner,
    key: &NodeKey,
    children: Vec<Value>,
) -> Result<usize, TreeError> {
    let config = Arc::clone(&inner.config);
    let fields = config.fields();
    let path = key
        .locate(&inner.root, fields)
        .ok_or_else(|| TreeError::NodeNotFound { key: key.clone() })?;

    let count = children.len();
    let unchanged = path::resolve(&inner.root, &path, &fields.children)
        .is_ok_and(|node| fields.children(node) == Some(&children));
    if unchanged {
        return Ok(count);
    }

    let root = Arc::make_mut(&mut inner.root);
    let node = path::resolve_mut(root, &path, &fields.children)?;
    if !fields.set_children(node, children) {
        return Err(TreeError::NotAnObject { key: key.clone() });
    }
    Ok(count)
}
