//! Options and interactions shared by the rendering commands.

use std::fmt;
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use arbor::prelude::*;
use clap::Args;
use tokio::task::JoinSet;

/// An index path written as `0/2/1`. The empty string and `/` address the
/// top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPath(pub Vec<usize>);

impl FromStr for IndexPath {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(['/', '.'])
            .filter(|part| !part.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(IndexPath)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "/{}", parts.join("/"))
    }
}

/// View options for commands that render a tree.
#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// JSON file with tree options (camelCase keys)
    #[arg(long, value_name = "FILE")]
    pub options: Option<PathBuf>,

    /// Children shown per page, 0 or less shows all
    #[arg(long, allow_negative_numbers = true)]
    pub page_size: Option<i64>,

    /// Expand every node
    #[arg(long)]
    pub expand_all: bool,

    /// Expand the first top-level node
    #[arg(long)]
    pub expand_first: bool,

    /// Toggle the node at an index path; repeatable, applied in order
    #[arg(long = "toggle", value_name = "PATH")]
    pub toggles: Vec<IndexPath>,

    /// Show one more page below the node at an index path (`/` for the top
    /// level); repeatable, applied after toggles
    #[arg(long = "more", value_name = "PATH")]
    pub more: Vec<IndexPath>,

    /// Prefix every row with its index path
    #[arg(long)]
    pub paths: bool,
}

impl ViewArgs {
    /// Builds the tree configuration: options file first, flags on top.
    pub async fn config(&self) -> Result<TreeConfig> {
        let options = match &self.options {
            Some(path) => load_options(path).await?,
            None => TreeOptions::default(),
        };
        let mut config = TreeConfig::from_options(options)
            .with_error_handler(|err| eprintln!("arbor: {err}"));
        if let Some(page_size) = self.page_size {
            config = config.with_page_size(page_size);
        }
        if self.expand_all {
            config = config.with_expand_all(true);
        }
        if self.expand_first {
            config = config.with_expand_first(true);
        }
        Ok(config)
    }

    /// Applies toggles and page loads, running any fetches they trigger,
    /// and returns the settled render pass.
    pub async fn drive(&self, tree: &Tree) -> Result<RenderPass> {
        settle(tree).await?;

        for path in &self.toggles {
            let key = tree
                .key_at(&path.0)
                .with_context(|| format!("Cannot toggle {path}"))?;
            match tree.handle(Interaction::Toggle(key)) {
                EventResult::Ignored => log::warn!("Toggle {} ignored, node is not visible", path),
                EventResult::Consumed => {}
                EventResult::Fetch(task) => {
                    if let Err(err) = task.run().await {
                        log::debug!("Fetch after toggling {} failed: {}", path, err);
                    }
                }
            }
            settle(tree).await?;
        }

        for path in &self.more {
            let key = tree
                .key_at(&path.0)
                .with_context(|| format!("Cannot load more below {path}"))?;
            if !tree.handle(Interaction::LoadMore(key)).is_handled() {
                log::warn!("Nothing more to load below {}", path);
            }
            settle(tree).await?;
        }

        settle(tree).await
    }
}

/// Reads tree options from a JSON file.
pub async fn load_options(path: &Path) -> Result<TreeOptions> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    let value = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse options file {}", path.display()))?;
    Ok(TreeOptions::from_json(value)?)
}

/// Renders until no render pass issues new fetches, running each round of
/// fetches concurrently.
async fn settle(tree: &Tree) -> Result<RenderPass> {
    loop {
        let pass = tree.render();
        if pass.fetches.is_empty() {
            return Ok(pass);
        }

        let mut tasks = JoinSet::new();
        for task in pass.fetches {
            tasks.spawn(task.run());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = joined? {
                log::debug!("Fetch failed: {}", err);
            }
        }
    }
}
