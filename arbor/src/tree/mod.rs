//! Tree engine: expansion, pagination, lazy loading and rendering.
//!
//! A [`Tree`] holds the caller's data, the shared configuration and the state
//! of every mounted node. [`Tree::render`] flattens the visible part into
//! [`Row`]s; [`Tree::handle`] applies user interactions.
//!
//! # Example
//!
//! ```
//! use arbor::prelude::*;
//! use serde_json::json;
//!
//! let data = json!({"children": [
//!     {"label": "Engineering", "value": "eng", "children": [
//!         {"label": "Platform", "value": "platform"},
//!         {"label": "Product", "value": "product"}
//!     ]},
//!     {"label": "Sales", "value": "sales"}
//! ]});
//!
//! let tree = Tree::new(data, TreeConfig::default());
//! let pass = tree.render();
//! assert_eq!(pass.rows.len(), 2);
//!
//! let eng = tree.key_at(&[0]).unwrap();
//! tree.handle(Interaction::Toggle(eng));
//! assert_eq!(tree.render().rows.len(), 4);
//! ```

mod branch;
mod events;
mod expansion;
mod fetch;
mod pagination;
mod state;

pub use branch::{NodeRow, RenderPass, Row};
pub use events::{EventResult, Interaction};
pub use expansion::Expansion;
pub use fetch::FetchTask;
pub use pagination::ChildrenStatus;
pub use state::{Tree, TreeId};
