//! Interaction handling for the Tree.

use std::sync::Arc;

use crate::node::NodeKey;
use crate::path;

use super::fetch::FetchTask;
use super::pagination;
use super::state::Tree;

/// A user interaction with a rendered row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Click on the row itself.
    Toggle(NodeKey),
    /// Click on action button `index` of a row.
    Action { key: NodeKey, index: usize },
    /// Click on the "load more" control below a node's children.
    LoadMore(NodeKey),
}

/// Result of handling an interaction.
#[derive(Debug)]
pub enum EventResult {
    /// Interaction did not apply, try other handlers.
    Ignored,
    /// Interaction was consumed.
    Consumed,
    /// Interaction was consumed and started a children request that the
    /// caller must run.
    Fetch(FetchTask),
}

impl EventResult {
    /// Check if the interaction was handled.
    pub fn is_handled(&self) -> bool {
        !matches!(self, EventResult::Ignored)
    }

    /// Take the triggered fetch, if any.
    pub fn into_fetch(self) -> Option<FetchTask> {
        match self {
            EventResult::Fetch(task) => Some(task),
            _ => None,
        }
    }
}

impl Tree {
    /// Dispatches an interaction.
    pub fn handle(&self, interaction: Interaction) -> EventResult {
        match interaction {
            Interaction::Toggle(key) => self.toggle(&key),
            Interaction::Action { key, index } => self.click_action(&key, index),
            Interaction::LoadMore(key) => self.load_more(&key),
        }
    }

    /// Toggles a visible node between collapsed and expanded.
    ///
    /// Collapsing drops all descendant state. Expanding a node whose children
    /// are missing starts a request, unless one is already in flight.
    pub fn toggle(&self, key: &NodeKey) -> EventResult {
        if key.is_root() {
            return EventResult::Ignored;
        }

        let mut guard = self.write();
        let config = Arc::clone(&guard.config);
        let fields = config.fields();
        let Some(path) = key.locate(&guard.root, fields) else {
            log::debug!("Toggle ignored, {} not in data", key);
            return EventResult::Ignored;
        };
        if !guard.is_mounted(key, &path) {
            log::debug!("Toggle ignored, {} is not visible", key);
            return EventResult::Ignored;
        }

        let index = path.last().copied().unwrap_or(0);
        let expansion = guard.state_mut(key, index).toggle();
        log::debug!("Toggled {} to {:?}", key, expansion);
        self.mark_dirty();

        if !expansion.is_expanded() {
            guard.unmount_descendants(key);
            return EventResult::Consumed;
        }

        let Some(source) = config.children_source() else {
            return EventResult::Consumed;
        };
        let Ok(node) = path::resolve(&guard.root, &path, &fields.children) else {
            return EventResult::Consumed;
        };
        if fields.children(node).is_some() {
            return EventResult::Consumed;
        }

        let node = node.clone();
        let depth = path.len() - 1;
        match FetchTask::issue(self, &mut guard.pending, source, key, &node, depth) {
            Some(task) => EventResult::Fetch(task),
            None => EventResult::Consumed,
        }
    }

    /// Materializes the next page of a node's children.
    ///
    /// Use the root key for the top-level list. Works before the first render
    /// for nodes that start expanded.
    pub fn load_more(&self, key: &NodeKey) -> EventResult {
        let mut guard = self.write();
        let config = Arc::clone(&guard.config);
        let fields = config.fields();
        let Some(path) = key.locate(&guard.root, fields) else {
            return EventResult::Ignored;
        };
        let total = match path::resolve(&guard.root, &path, &fields.children)
            .ok()
            .and_then(|node| fields.children(node))
        {
            Some(children) => children.len(),
            None => return EventResult::Ignored,
        };

        if !guard.is_mounted(key, &path) {
            log::debug!("Load more ignored, {} is not visible", key);
            return EventResult::Ignored;
        }

        let page_size = config.options().page_size();
        let state = guard.state_mut(key, path.last().copied().unwrap_or(0));
        if !state.is_expanded() {
            return EventResult::Ignored;
        }
        let cursor = pagination::advance(state.cursor, page_size, total);
        if pagination::shown(cursor, total) == pagination::shown(state.cursor, total) {
            return EventResult::Ignored;
        }
        state.cursor = cursor;
        log::debug!(
            "Showing {} of {} children of {}",
            pagination::shown(cursor, total),
            total,
            key
        );
        self.mark_dirty();
        EventResult::Consumed
    }

    /// Invokes action `index` of a visible node.
    ///
    /// Never changes the node's expansion. Actions without a visible control
    /// are ignored.
    pub fn click_action(&self, key: &NodeKey, index: usize) -> EventResult {
        let button = {
            let guard = self.read();
            let config = Arc::clone(&guard.config);
            let fields = config.fields();
            let Some(path) = key.locate(&guard.root, fields) else {
                return EventResult::Ignored;
            };
            if key.is_root() || !guard.is_mounted(key, &path) {
                return EventResult::Ignored;
            }
            let Ok(node) = path::resolve(&guard.root, &path, &fields.children) else {
                return EventResult::Ignored;
            };
            let expanded = guard
                .expansion_of(key, path.last().copied().unwrap_or(0))
                .is_expanded();
            let depth = path.len() - 1;
            config
                .actions(node, depth, expanded)
                .get(index)
                .and_then(|action| action.to_button(index, config.options().actions_align_right))
        };

        // Callbacks may call back into the tree, so the lock is released first.
        match button {
            Some(button) => {
                button.click();
                EventResult::Consumed
            }
            None => EventResult::Ignored,
        }
    }
}
