//! Per-node action buttons.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

/// Callback invoked when an action button is clicked.
pub type ActionCallback = Arc<dyn Fn() + Send + Sync>;

/// Description of one action returned by the actions provider.
///
/// A descriptor renders only if it has an icon or a text. `style` and `extra`
/// are opaque to the engine and handed to the renderer.
#[derive(Clone, Default)]
pub struct ActionDescriptor {
    pub icon: Option<String>,
    pub text: Option<String>,
    pub hint: Option<String>,
    pub on_click: Option<ActionCallback>,
    pub style: Map<String, Value>,
    pub extra: Map<String, Value>,
}

impl fmt::Debug for ActionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDescriptor")
            .field("icon", &self.icon)
            .field("text", &self.text)
            .field("hint", &self.hint)
            .field("on_click", &self.on_click.is_some())
            .field("style", &self.style)
            .field("extra", &self.extra)
            .finish()
    }
}

impl ActionDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn on_click(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_click = Some(Arc::new(f));
        self
    }

    pub fn style(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.style.insert(key.into(), value.into());
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Turns the descriptor into a button, or `None` when there is nothing
    /// to show.
    pub fn to_button(&self, index: usize, align_right: bool) -> Option<ActionButton> {
        let kind = match (&self.text, &self.icon) {
            (Some(text), icon) if !text.is_empty() => ButtonKind::Text {
                text: text.clone(),
                icon: icon.clone(),
            },
            (_, Some(icon)) if !icon.is_empty() => ButtonKind::Icon(icon.clone()),
            _ => return None,
        };

        let mut style = Map::new();
        style.insert("marginLeft".to_string(), Value::from(16));
        style.extend(self.style.iter().map(|(k, v)| (k.clone(), v.clone())));

        Some(ActionButton {
            index,
            kind,
            hint: self.hint.clone().filter(|h| !h.is_empty()),
            hint_placement: if align_right {
                HintPlacement::Left
            } else {
                HintPlacement::Right
            },
            style,
            extra: self.extra.clone(),
            on_click: self.on_click.clone(),
        })
    }
}

/// What a button shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonKind {
    /// A text button, optionally prefixed by a small icon.
    Text { text: String, icon: Option<String> },
    /// An icon-only button.
    Icon(String),
}

/// Side of the button the hint tooltip opens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintPlacement {
    Left,
    Right,
}

/// A visible action control on a row.
#[derive(Clone)]
pub struct ActionButton {
    /// Index of the descriptor this button came from.
    pub index: usize,
    pub kind: ButtonKind,
    pub hint: Option<String>,
    pub hint_placement: HintPlacement,
    /// Caller style merged over the default left margin.
    pub style: Map<String, Value>,
    pub extra: Map<String, Value>,
    on_click: Option<ActionCallback>,
}

impl fmt::Debug for ActionButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionButton")
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("hint", &self.hint)
            .field("hint_placement", &self.hint_placement)
            .finish_non_exhaustive()
    }
}

impl ActionButton {
    /// Invokes the click callback, if any.
    pub fn click(&self) {
        if let Some(on_click) = &self.on_click {
            on_click();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_empty_descriptor_has_no_button() {
        assert!(ActionDescriptor::new().hint("nothing").to_button(0, false).is_none());
        assert!(ActionDescriptor::new().text("").icon("").to_button(0, false).is_none());
    }

    #[test]
    fn test_text_wins_over_icon() {
        let button = ActionDescriptor::new()
            .icon("+")
            .text("Add")
            .to_button(2, false)
            .unwrap();
        assert_eq!(button.index, 2);
        assert_eq!(
            button.kind,
            ButtonKind::Text {
                text: "Add".into(),
                icon: Some("+".into())
            }
        );
    }

    #[test]
    fn test_icon_only() {
        let button = ActionDescriptor::new().icon("x").to_button(0, true).unwrap();
        assert_eq!(button.kind, ButtonKind::Icon("x".into()));
        assert_eq!(button.hint_placement, HintPlacement::Left);
    }

    #[test]
    fn test_style_merges_over_default_margin() {
        let button = ActionDescriptor::new()
            .text("Go")
            .style("color", "red")
            .to_button(0, false)
            .unwrap();
        assert_eq!(button.style["marginLeft"], 16);
        assert_eq!(button.style["color"], "red");

        let button = ActionDescriptor::new()
            .text("Go")
            .style("marginLeft", 4)
            .to_button(0, false)
            .unwrap();
        assert_eq!(button.style["marginLeft"], 4);
    }

    #[test]
    fn test_click_invokes_callback() {
        let clicks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&clicks);
        let button = ActionDescriptor::new()
            .text("Count")
            .on_click(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .to_button(0, false)
            .unwrap();
        button.click();
        button.click();
        assert_eq!(clicks.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_click_without_callback_is_noop() {
        let button = ActionDescriptor::new().icon("i").to_button(0, false).unwrap();
        button.click();
    }
}
