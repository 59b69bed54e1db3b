//! Tree state.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::config::TreeConfig;
use crate::error::TreeError;
use crate::node::NodeKey;
use crate::path;

use super::expansion::{Expansion, NodeState};
use super::pagination;

/// Unique identifier for a Tree instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TreeId(usize);

impl TreeId {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        Self(COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

/// Internal state for a Tree.
#[derive(Debug)]
pub(super) struct TreeInner {
    /// Caller data. The root itself is a container; its children are the
    /// top-level rows. Shared with render passes in flight, so writers go
    /// through `Arc::make_mut`.
    pub root: Arc<Value>,
    /// Shared configuration.
    pub config: Arc<TreeConfig>,
    /// State of mounted nodes.
    pub nodes: HashMap<NodeKey, NodeState>,
    /// Nodes with a children request in flight.
    pub pending: HashSet<NodeKey>,
}

impl TreeInner {
    fn new(root: Value, config: Arc<TreeConfig>) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            NodeKey::root(),
            NodeState::root(config.options().page_size()),
        );
        Self {
            root: Arc::new(root),
            config,
            nodes,
            pending: HashSet::new(),
        }
    }

    /// Drops the state of everything below `key`.
    pub fn unmount_descendants(&mut self, key: &NodeKey) {
        self.nodes.retain(|k, _| !k.is_descendant_of(key));
    }

    /// Expansion of `key`, falling back to its initial resolution when it
    /// has no state yet.
    pub fn expansion_of(&self, key: &NodeKey, index: usize) -> Expansion {
        match (self.nodes.get(key), key.depth()) {
            (Some(state), _) => state.expansion,
            (None, Some(depth)) => Expansion::initial(self.config.options(), depth, index),
            (None, None) => Expansion::Expanded,
        }
    }

    /// Returns `true` if the node at `path` would be rendered: every
    /// ancestor is expanded and the node falls inside each parent's window.
    pub fn is_mounted(&self, key: &NodeKey, path: &[usize]) -> bool {
        let page_size = self.config.options().page_size();
        (0..path.len()).all(|level| {
            let parent = key.prefix(level);
            let parent_index = level.checked_sub(1).map_or(0, |i| path[i]);
            if !self.expansion_of(&parent, parent_index).is_expanded() {
                return false;
            }
            let cursor = self
                .nodes
                .get(&parent)
                .map_or_else(|| pagination::initial_cursor(page_size), |s| s.cursor);
            path[level] < cursor
        })
    }

    /// Returns the state of a mounted node, creating it on first use.
    pub fn state_mut(&mut self, key: &NodeKey, index: usize) -> &mut NodeState {
        let expansion = self.expansion_of(key, index);
        let page_size = self.config.options().page_size();
        self.nodes
            .entry(key.clone())
            .or_insert_with(|| NodeState::new(expansion, page_size))
    }
}

/// An expandable/collapsible tree over dynamic node data.
///
/// `Tree` owns:
/// - the caller's root node (a `serde_json::Value`)
/// - the shared [`TreeConfig`]
/// - expand/collapse state and pagination cursors per mounted node
/// - the set of in-flight children requests
///
/// Cloning a `Tree` yields another handle to the same state.
///
/// # Example
///
/// ```
/// use arbor::config::TreeConfig;
/// use arbor::tree::Tree;
/// use serde_json::json;
///
/// let tree = Tree::new(
///     json!({"children": [{"label": "src", "value": "src", "children": [{"label": "lib.rs"}]}]}),
///     TreeConfig::default().with_expand_first(true),
/// );
/// let pass = tree.render();
/// assert_eq!(pass.rows.len(), 2);
/// ```
#[derive(Debug)]
pub struct Tree {
    /// Unique identifier.
    id: TreeId,
    /// Internal state.
    pub(super) inner: Arc<RwLock<TreeInner>>,
    /// Dirty flag for re-render.
    pub(super) dirty: Arc<AtomicBool>,
}

impl Tree {
    /// Create a tree over `root` with the given configuration.
    pub fn new(root: Value, config: TreeConfig) -> Self {
        Self {
            id: TreeId::new(),
            inner: Arc::new(RwLock::new(TreeInner::new(root, Arc::new(config)))),
            dirty: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Get the unique ID.
    pub fn id(&self) -> TreeId {
        self.id
    }

    pub(super) fn read(&self) -> RwLockReadGuard<'_, TreeInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn write(&self) -> RwLockWriteGuard<'_, TreeInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn mark_dirty(&self) {
        self.dirty.store(true, Ordering::SeqCst);
    }

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------

    /// The configuration every node resolves against.
    pub fn config(&self) -> Arc<TreeConfig> {
        Arc::clone(&self.read().config)
    }

    /// Replace the configuration. Every node picks it up on the next render.
    pub fn set_config(&self, config: TreeConfig) {
        self.write().config = Arc::new(config);
        self.mark_dirty();
    }

    // -------------------------------------------------------------------------
    // Data access
    // -------------------------------------------------------------------------

    /// Get a copy of the root data.
    pub fn data(&self) -> Value {
        Value::clone(&self.read().root)
    }

    /// Replace the root data.
    ///
    /// State is keyed by node identity, so nodes that keep their values keep
    /// their expansion and cursors.
    pub fn set_data(&self, root: Value) {
        self.write().root = Arc::new(root);
        self.mark_dirty();
    }

    /// Get a copy of the node at an index path.
    pub fn node_at(&self, path: &[usize]) -> Result<Value, TreeError> {
        let guard = self.read();
        let children = &guard.config.fields().children;
        path::resolve(&guard.root, path, children).cloned()
    }

    /// Get the key of the node currently at an index path.
    pub fn key_at(&self, path: &[usize]) -> Result<NodeKey, TreeError> {
        let guard = self.read();
        let fields = guard.config.fields();
        let mut key = NodeKey::root();
        for (depth, &index) in path.iter().enumerate() {
            let node = path::resolve(&guard.root, &path[..=depth], &fields.children)?;
            key = key.child(fields.segment(node, index));
        }
        Ok(key)
    }

    /// Get the index path currently addressing a key.
    pub fn path_of(&self, key: &NodeKey) -> Option<Vec<usize>> {
        let guard = self.read();
        key.locate(&guard.root, guard.config.fields())
    }

    /// Write a children array into the node at an index path.
    ///
    /// This is how callers splice in children they fetched themselves.
    pub fn set_children_at(&self, path: &[usize], children: Vec<Value>) -> Result<(), TreeError> {
        let mut guard = self.write();
        let config = Arc::clone(&guard.config);
        let fields = config.fields();
        let node = path::resolve_mut(Arc::make_mut(&mut guard.root), path, &fields.children)?;
        if !fields.set_children(node, children) {
            log::warn!("Node at {:?} is not an object, children not written", path);
            return Ok(());
        }
        self.mark_dirty();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Node state
    // -------------------------------------------------------------------------

    /// Check if a node is expanded. Nodes without state report their initial
    /// expansion.
    pub fn is_expanded(&self, key: &NodeKey) -> bool {
        let guard = self.read();
        let index = match key.locate(&guard.root, guard.config.fields()) {
            Some(path) => path.last().copied().unwrap_or(0),
            None => return false,
        };
        guard.expansion_of(key, index).is_expanded()
    }

    /// Get the pagination cursor of a mounted node.
    pub fn cursor(&self, key: &NodeKey) -> Option<usize> {
        self.read().nodes.get(key).map(|s| s.cursor)
    }

    /// Check if a children request for `key` is in flight.
    pub fn is_pending(&self, key: &NodeKey) -> bool {
        self.read().pending.contains(key)
    }

    /// Number of nodes with state.
    pub fn mounted_len(&self) -> usize {
        self.read().nodes.len()
    }

    // -------------------------------------------------------------------------
    // Dirty tracking
    // -------------------------------------------------------------------------

    /// Check if the tree has changed.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Clear the dirty flag.
    pub fn clear_dirty(&self) {
        self.dirty.store(false, Ordering::SeqCst);
    }
}

impl Clone for Tree {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            inner: Arc::clone(&self.inner),
            dirty: Arc::clone(&self.dirty),
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(Value::Object(Default::default()), TreeConfig::default())
    }
}
