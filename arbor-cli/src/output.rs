//! Plain text rendering of a [`RenderPass`].

use std::io::{self, Write};

use arbor::prelude::*;
use unicode_width::UnicodeWidthStr;

const INDENT: &str = "  ";
const LEAF_MARKER: &str = "·";

/// Text layout settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStyle {
    /// Prefix rows with their index path.
    pub paths: bool,
}

fn format_path(path: &[usize]) -> String {
    let parts: Vec<String> = path.iter().map(ToString::to_string).collect();
    format!("/{}", parts.join("/"))
}

fn format_button(button: &ActionButton) -> String {
    let face = match &button.kind {
        ButtonKind::Text {
            text,
            icon: Some(icon),
        } => format!("{icon} {text}"),
        ButtonKind::Text { text, icon: None } => text.clone(),
        ButtonKind::Icon(icon) => icon.clone(),
    };
    match (&button.hint, button.hint_placement) {
        (Some(hint), HintPlacement::Left) => format!("({hint}) [{face}]"),
        (Some(hint), HintPlacement::Right) => format!("[{face}] ({hint})"),
        (None, _) => format!("[{face}]"),
    }
}

/// Left part of a row: path, indentation, marker and label.
fn row_head(row: &Row, style: TextStyle) -> String {
    let indent = INDENT.repeat(row.depth());
    match row {
        Row::Node(node) => {
            let marker = if node.is_leaf() {
                LEAF_MARKER
            } else {
                node.icon.as_str()
            };
            let prefix = if style.paths {
                format!("{:<10} ", format_path(&node.path))
            } else {
                String::new()
            };
            format!("{prefix}{indent}{marker} {}", node.label)
        }
        Row::LoadMore { remaining, .. } => {
            let pad = if style.paths { " ".repeat(11) } else { String::new() };
            format!("{pad}{indent}… {remaining} more")
        }
        Row::Pending { .. } => {
            let pad = if style.paths { " ".repeat(11) } else { String::new() };
            format!("{pad}{indent}loading…")
        }
        Row::Failed { error, .. } => {
            let pad = if style.paths { " ".repeat(11) } else { String::new() };
            format!("{pad}{indent}! {error}")
        }
    }
}

/// Writes every row of `pass`, one per line.
///
/// Right-aligned actions are padded into a common display column.
pub fn write_pass(out: &mut impl Write, pass: &RenderPass, style: TextStyle) -> io::Result<()> {
    if let Some(title) = &pass.title {
        writeln!(out, "{title}")?;
    }

    let heads: Vec<String> = pass.rows.iter().map(|row| row_head(row, style)).collect();
    let column = heads.iter().map(|head| head.width()).max().unwrap_or(0);

    for (row, head) in pass.rows.iter().zip(&heads) {
        let Some(node) = row.as_node().filter(|node| !node.actions.is_empty()) else {
            writeln!(out, "{head}")?;
            continue;
        };
        let buttons: Vec<String> = node.actions.iter().map(format_button).collect();
        if node.actions_align_right {
            let pad = column - head.width();
            writeln!(out, "{head}{}  {}", " ".repeat(pad), buttons.join(" "))?;
        } else {
            writeln!(out, "{head}  {}", buttons.join(" "))?;
        }
    }
    Ok(())
}
