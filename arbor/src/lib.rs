//! Headless tree engine
//!
//! Arbor renders arbitrarily deep JSON-shaped data as an expandable tree:
//! per-node expand/collapse state, paginated and lazily fetched children,
//! per-node action buttons, and index-path addressing. It produces a flat
//! list of rows that any front end can draw.

pub mod action;
pub mod config;
pub mod error;
pub mod node;
pub mod path;
pub mod source;
pub mod tree;

pub use error::TreeError;

pub mod prelude {
    pub use crate::action::{ActionButton, ActionDescriptor, ButtonKind, HintPlacement};
    pub use crate::config::{TreeConfig, TreeOptions};
    pub use crate::error::TreeError;
    pub use crate::node::{KeySegment, NodeFields, NodeKey};
    pub use crate::path::{resolve, resolve_mut};
    pub use crate::source::{ChildrenSource, FetchError, FetchResult, source_fn};
    pub use crate::tree::{
        ChildrenStatus, EventResult, FetchTask, Interaction, NodeRow, RenderPass, Row, Tree,
    };
}
