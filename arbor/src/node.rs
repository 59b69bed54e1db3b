//! Dynamic tree node access.
//!
//! Tree nodes are plain `serde_json::Value` objects. Which keys hold the
//! label, the identity value and the children array is decided by
//! [`NodeFields`], so callers can hand over their data as-is.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field-name mapping used to read label, value and children from a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFields {
    /// Key holding the displayable label.
    pub label: String,
    /// Key holding the node identity.
    pub value: String,
    /// Key holding the children array.
    pub children: String,
}

impl Default for NodeFields {
    fn default() -> Self {
        Self {
            label: "label".to_string(),
            value: "value".to_string(),
            children: "children".to_string(),
        }
    }
}

impl NodeFields {
    /// Creates a mapping with custom field names.
    pub fn new(
        label: impl Into<String>,
        value: impl Into<String>,
        children: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            children: children.into(),
        }
    }

    /// Returns the raw label field.
    pub fn label<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        node.get(&self.label)
    }

    /// Returns the label as display text.
    ///
    /// Missing or null labels become an empty string so one malformed node
    /// never breaks a render pass.
    pub fn label_text(&self, node: &Value) -> String {
        self.label(node).map(display_value).unwrap_or_default()
    }

    /// Returns the raw identity field.
    pub fn value<'a>(&self, node: &'a Value) -> Option<&'a Value> {
        node.get(&self.value).filter(|v| !v.is_null())
    }

    /// Returns the children array if it is resident.
    ///
    /// An absent key, `null`, or a non-array value all count as "not resident".
    pub fn children<'a>(&self, node: &'a Value) -> Option<&'a Vec<Value>> {
        node.get(&self.children).and_then(Value::as_array)
    }

    /// Mutable access to a resident children array.
    pub fn children_mut<'a>(&self, node: &'a mut Value) -> Option<&'a mut Vec<Value>> {
        node.get_mut(&self.children).and_then(Value::as_array_mut)
    }

    /// Writes a children array into the node.
    ///
    /// Returns `false` if the node is not an object and nothing was written.
    pub fn set_children(&self, node: &mut Value, children: Vec<Value>) -> bool {
        match node.as_object_mut() {
            Some(map) => {
                map.insert(self.children.clone(), Value::Array(children));
                true
            }
            None => false,
        }
    }

    /// Builds the key segment identifying `node` among its siblings.
    pub fn segment(&self, node: &Value, index: usize) -> KeySegment {
        match self.value(node) {
            Some(Value::String(value)) => KeySegment::Value(value.clone()),
            Some(value) => KeySegment::Literal(value.to_string()),
            None => KeySegment::Position(index),
        }
    }
}

/// Renders a scalar JSON value as plain text.
pub(crate) fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One step of a [`NodeKey`].
///
/// String values and other JSON values are kept apart, so `1` and `"1"` are
/// different siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeySegment {
    /// A string identity value.
    Value(String),
    /// Any other identity value, in its JSON form.
    Literal(String),
    /// The node's position among its siblings, used when it has no value.
    Position(usize),
}

impl fmt::Display for KeySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) | Self::Literal(v) => write!(f, "{v}"),
            Self::Position(i) => write!(f, "#{i}"),
        }
    }
}

/// Stable identity of a node: the identities of every node from the root
/// down to it.
///
/// Keys survive sibling reordering as long as values don't change. Values only
/// need to be unique among siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(Vec<KeySegment>);

impl NodeKey {
    /// The key of the tree root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns the key of a child of this node.
    pub fn child(&self, segment: KeySegment) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(segment);
        Self(segments)
    }

    /// Returns `true` for the root key.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Segments from the root down.
    pub fn segments(&self) -> &[KeySegment] {
        &self.0
    }

    /// Depth of the node, where children of the root are depth 0.
    ///
    /// Returns `None` for the root itself.
    pub fn depth(&self) -> Option<usize> {
        self.0.len().checked_sub(1)
    }

    /// Key of the parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeKey> {
        let (_, head) = self.0.split_last()?;
        Some(Self(head.to_vec()))
    }

    /// The ancestor made of the first `len` segments.
    pub(crate) fn prefix(&self, len: usize) -> NodeKey {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }

    /// Returns `true` if this key lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &NodeKey) -> bool {
        self.0.len() > ancestor.0.len() && self.0.starts_with(&ancestor.0)
    }

    /// Finds the index path currently addressing this key.
    ///
    /// Walks `root` matching one segment per level. Returns `None` when a
    /// segment no longer matches any child.
    pub fn locate(&self, root: &Value, fields: &NodeFields) -> Option<Vec<usize>> {
        let mut path = Vec::with_capacity(self.0.len());
        let mut current = root;
        for segment in &self.0 {
            let children = fields.children(current)?;
            let index = children
                .iter()
                .enumerate()
                .position(|(i, child)| fields.segment(child, i) == *segment)?;
            path.push(index);
            current = &children[index];
        }
        Some(path)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/")?;
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<KeySegment> for NodeKey {
    fn from_iter<I: IntoIterator<Item = KeySegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
