//! Render a JSON tree from a file.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arbor::prelude::*;
use clap::Args;
use serde_json::Value;

use super::view::ViewArgs;
use crate::output::{self, TextStyle};

/// Show command
#[derive(Args, Debug)]
pub struct ShowCommand {
    /// JSON file whose root holds the top-level children
    pub file: PathBuf,

    #[command(flatten)]
    pub view: ViewArgs,
}

/// Reads a JSON document.
pub async fn load_json(path: &Path) -> Result<Value> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Handle show command execution
pub async fn handle_show_command(cmd: ShowCommand) -> Result<()> {
    let root = load_json(&cmd.file).await?;
    let tree = Tree::new(root, cmd.view.config().await?);
    let pass = cmd.view.drive(&tree).await?;

    let mut out = io::stdout().lock();
    output::write_pass(
        &mut out,
        &pass,
        TextStyle {
            paths: cmd.view.paths,
        },
    )?;
    out.flush()?;
    Ok(())
}
