//! Tree configuration.
//!
//! A [`TreeConfig`] is built once per tree and shared with every node through
//! an `Arc`. Plain options live in [`TreeOptions`], which can be loaded from
//! JSON; callbacks are attached in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::action::ActionDescriptor;
use crate::error::TreeError;
use crate::node::NodeFields;
use crate::source::ChildrenSource;

/// Custom label renderer. Returning `None` falls back to the label field.
pub type LabelRenderer = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Actions provider, called with the node, its depth and whether it is
/// expanded.
pub type ActionsProvider =
    Arc<dyn Fn(&Value, usize, bool) -> Option<Vec<ActionDescriptor>> + Send + Sync>;

/// Receives errors surfaced by lazy fetches.
pub type ErrorHandler = Arc<dyn Fn(&TreeError) + Send + Sync>;

/// Keys that name callbacks; they carry no function when read from JSON.
const CALLBACK_KEYS: [&str; 3] = ["getActionsData", "renderLabel", "requestChildrenData"];

/// Serializable tree options.
///
/// Keys are camelCase so option files stay compatible with existing
/// front-end configurations. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeOptions {
    /// Key holding the node label.
    ///
    /// Default: `"label"`
    pub label_name: String,

    /// Key holding the node identity.
    ///
    /// Default: `"value"`
    pub value_name: String,

    /// Key holding the children array.
    ///
    /// Default: `"children"`
    pub children_name: String,

    /// Children materialized per page. Zero or negative shows every child.
    ///
    /// Default: 20
    pub children_count_per_page: i64,

    /// Render action buttons on the right edge of the row.
    pub actions_align_right: bool,

    /// Start with the first top-level node expanded.
    pub expand_first: bool,

    /// Start with every node expanded.
    pub expand_all: bool,

    /// Render action buttons at all.
    ///
    /// Default: true
    pub show_actions: bool,

    /// Icon handle for collapsed nodes.
    pub fold_icon: String,

    /// Icon handle for expanded nodes.
    pub unfold_icon: String,

    /// Optional caption shown above the tree.
    pub title: Option<String>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            label_name: "label".to_string(),
            value_name: "value".to_string(),
            children_name: "children".to_string(),
            children_count_per_page: 20,
            actions_align_right: false,
            expand_first: false,
            expand_all: false,
            show_actions: true,
            fold_icon: "⊕".to_string(),
            unfold_icon: "⊖".to_string(),
            title: None,
        }
    }
}

impl TreeOptions {
    /// Reads options from a JSON object.
    ///
    /// Callback keys cannot hold functions in JSON; they are logged and
    /// treated as not configured.
    pub fn from_json(value: Value) -> Result<Self, TreeError> {
        let value = match value {
            Value::Object(mut map) => {
                for key in CALLBACK_KEYS {
                    if map.remove(key).is_some() {
                        log::warn!("Ignoring non-function tree option '{}'", key);
                    }
                }
                Value::Object(map)
            }
            other => other,
        };
        Ok(serde_json::from_value(value)?)
    }

    /// Page window, or `None` when every child is shown at once.
    pub fn page_size(&self) -> Option<usize> {
        usize::try_from(self.children_count_per_page)
            .ok()
            .filter(|n| *n > 0)
    }

    /// Field-name mapping derived from the `*Name` options.
    pub fn fields(&self) -> NodeFields {
        NodeFields::new(&self.label_name, &self.value_name, &self.children_name)
    }
}

/// Tree-wide configuration: options plus callbacks.
///
/// # Example
///
/// ```
/// use arbor::config::TreeConfig;
/// use arbor::action::ActionDescriptor;
///
/// let config = TreeConfig::default()
///     .with_page_size(50)
///     .with_expand_first(true)
///     .with_actions(|_node, depth, _expanded| {
///         (depth == 0).then(|| vec![ActionDescriptor::new().text("Add")])
///     });
/// assert_eq!(config.options().page_size(), Some(50));
/// ```
#[derive(Clone, Default)]
pub struct TreeConfig {
    options: TreeOptions,
    fields: NodeFields,
    render_label: Option<LabelRenderer>,
    actions: Option<ActionsProvider>,
    children_source: Option<Arc<dyn ChildrenSource>>,
    on_error: Option<ErrorHandler>,
}

impl fmt::Debug for TreeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeConfig")
            .field("options", &self.options)
            .field("render_label", &self.render_label.is_some())
            .field("actions", &self.actions.is_some())
            .field("children_source", &self.children_source.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl TreeConfig {
    /// Creates a config with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config from loaded options.
    pub fn from_options(options: TreeOptions) -> Self {
        Self {
            fields: options.fields(),
            options,
            ..Self::default()
        }
    }

    /// Returns the plain options.
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Returns the field-name mapping.
    pub fn fields(&self) -> &NodeFields {
        &self.fields
    }

    /// Returns the children source, if lazy loading is enabled.
    pub fn children_source(&self) -> Option<&Arc<dyn ChildrenSource>> {
        self.children_source.as_ref()
    }

    /// Returns `true` when a children source is configured.
    pub fn is_lazy(&self) -> bool {
        self.children_source.is_some()
    }

    /// Replaces the options, keeping callbacks.
    pub fn with_options(mut self, options: TreeOptions) -> Self {
        self.fields = options.fields();
        self.options = options;
        self
    }

    /// Sets the field names for label, value and children.
    pub fn with_field_names(
        mut self,
        label: impl Into<String>,
        value: impl Into<String>,
        children: impl Into<String>,
    ) -> Self {
        self.options.label_name = label.into();
        self.options.value_name = value.into();
        self.options.children_name = children.into();
        self.fields = self.options.fields();
        self
    }

    /// Sets the pagination window. Zero or negative disables pagination.
    pub fn with_page_size(mut self, count: i64) -> Self {
        self.options.children_count_per_page = count;
        self
    }

    pub fn with_actions_align_right(mut self, align_right: bool) -> Self {
        self.options.actions_align_right = align_right;
        self
    }

    pub fn with_expand_first(mut self, expand_first: bool) -> Self {
        self.options.expand_first = expand_first;
        self
    }

    pub fn with_expand_all(mut self, expand_all: bool) -> Self {
        self.options.expand_all = expand_all;
        self
    }

    pub fn with_show_actions(mut self, show_actions: bool) -> Self {
        self.options.show_actions = show_actions;
        self
    }

    pub fn with_icons(mut self, fold: impl Into<String>, unfold: impl Into<String>) -> Self {
        self.options.fold_icon = fold.into();
        self.options.unfold_icon = unfold.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.options.title = Some(title.into());
        self
    }

    /// Sets a custom label renderer.
    pub fn with_label_renderer(
        mut self,
        f: impl Fn(&Value) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.render_label = Some(Arc::new(f));
        self
    }

    /// Sets the actions provider.
    pub fn with_actions(
        mut self,
        f: impl Fn(&Value, usize, bool) -> Option<Vec<ActionDescriptor>> + Send + Sync + 'static,
    ) -> Self {
        self.actions = Some(Arc::new(f));
        self
    }

    /// Enables lazy loading through `source`.
    pub fn with_children_source(mut self, source: impl ChildrenSource + 'static) -> Self {
        self.children_source = Some(Arc::new(source));
        self
    }

    /// Sets the handler that receives lazy fetch errors.
    pub fn with_error_handler(mut self, f: impl Fn(&TreeError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Resolves the display label of `node`.
    pub fn label(&self, node: &Value) -> String {
        self.render_label
            .as_ref()
            .and_then(|render| render(node))
            .unwrap_or_else(|| self.fields.label_text(node))
    }

    /// Resolves the action descriptors of `node`.
    pub fn actions(&self, node: &Value, depth: usize, expanded: bool) -> Vec<ActionDescriptor> {
        if !self.options.show_actions {
            return Vec::new();
        }
        self.actions
            .as_ref()
            .and_then(|provider| provider(node, depth, expanded))
            .unwrap_or_default()
    }

    /// Icon handle for a row in the given state.
    pub fn icon(&self, expanded: bool) -> &str {
        if expanded {
            &self.options.unfold_icon
        } else {
            &self.options.fold_icon
        }
    }

    pub(crate) fn report_error(&self, err: &TreeError) {
        if let Some(on_error) = &self.on_error {
            on_error(err);
        }
    }
}
