//! Print the node at an index path.

use std::path::PathBuf;

use anyhow::{Context, Result};
use arbor::prelude::*;
use clap::Args;

use super::show::load_json;
use super::view::load_options;

/// Resolve command
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// JSON file whose root holds the top-level children
    pub file: PathBuf,

    /// Child indexes from the root, e.g. `0 2 1`
    pub index: Vec<usize>,

    /// JSON file with tree options, for a custom children field name
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,
}

/// Handle resolve command execution
pub async fn handle_resolve_command(cmd: ResolveCommand) -> Result<()> {
    let root = load_json(&cmd.file).await?;
    let children_name = match &cmd.options {
        Some(path) => load_options(path).await?.children_name,
        None => TreeOptions::default().children_name,
    };

    let node = resolve(&root, &cmd.index, &children_name)
        .with_context(|| format!("Cannot resolve {:?} in {}", cmd.index, cmd.file.display()))?;
    println!("{}", serde_json::to_string_pretty(node)?);
    Ok(())
}
