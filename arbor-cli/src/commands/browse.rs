//! Browse a directory tree, listing each directory when it is first expanded.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use arbor::prelude::*;
use async_trait::async_trait;
use clap::Args;
use serde_json::{Value, json};

use super::view::ViewArgs;
use crate::output::{self, TextStyle};

/// Browse command
#[derive(Args, Debug)]
pub struct BrowseCommand {
    /// Directory to browse
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Include entries whose names start with a dot
    #[arg(short, long)]
    pub all: bool,

    #[command(flatten)]
    pub view: ViewArgs,
}

/// Lists directories on demand.
///
/// Directory nodes carry no children array until they are expanded. Files
/// carry an empty one, so they render as leaves.
#[derive(Debug, Clone, Default)]
pub struct FsSource {
    show_hidden: bool,
}

impl FsSource {
    pub fn new(show_hidden: bool) -> Self {
        Self { show_hidden }
    }

    /// Reads the entries of `dir` as tree nodes, directories first.
    pub async fn list(&self, dir: &Path) -> io::Result<Vec<Value>> {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !self.show_hidden && name.starts_with('.') {
                continue;
            }
            let file_type = entry.file_type().await?;
            let path = entry.path().to_string_lossy().into_owned();
            let node = if file_type.is_dir() {
                json!({"label": name, "value": path, "kind": "dir"})
            } else {
                let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                json!({"label": name, "value": path, "kind": "file", "size": size, "children": []})
            };
            entries.push((file_type.is_dir(), name, node));
        }
        entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        log::debug!("Listed {} entries in {}", entries.len(), dir.display());
        Ok(entries.into_iter().map(|(_, _, node)| node).collect())
    }
}

#[async_trait]
impl ChildrenSource for FsSource {
    async fn request_children(&self, node: Value, _depth: usize) -> FetchResult {
        let dir = node["value"]
            .as_str()
            .ok_or_else(|| FetchError::new("directory node has no path"))?;
        Ok(Some(self.list(Path::new(dir)).await?))
    }
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// Configuration for a directory tree on top of the view options.
fn browse_config(config: TreeConfig, source: FsSource, dir: &Path) -> TreeConfig {
    let config = if config.options().title.is_none() {
        config.with_title(dir.display().to_string())
    } else {
        config
    };
    config
        .with_field_names("label", "value", "children")
        .with_children_source(source)
        .with_label_renderer(|node| {
            let label = node["label"].as_str()?;
            (node["kind"] == "dir").then(|| format!("{label}/"))
        })
        .with_actions(|node, _depth, _expanded| {
            let size = node["size"].as_u64()?;
            Some(vec![ActionDescriptor::new().text(format_size(size)).hint("size")])
        })
}

/// Handle browse command execution
pub async fn handle_browse_command(cmd: BrowseCommand) -> Result<()> {
    let source = FsSource::new(cmd.all);
    let children = source
        .list(&cmd.dir)
        .await
        .with_context(|| format!("Failed to list {}", cmd.dir.display()))?;

    let config = browse_config(cmd.view.config().await?, source, &cmd.dir);
    let tree = Tree::new(json!({"children": children}), config);
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

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("arbor-{}-{}", name, std::process::id()));
        let _ = tokio::fs::remove_dir_all(&dir).await;
        tokio::fs::create_dir_all(dir.join("src/bin")).await.unwrap();
        tokio::fs::write(dir.join("Cargo.toml"), "[package]\n").await.unwrap();
        tokio::fs::write(dir.join(".hidden"), "").await.unwrap();
        tokio::fs::write(dir.join("src/main.rs"), "fn main() {}\n").await.unwrap();
        dir
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(12), "12 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[tokio::test]
    async fn test_list_sorts_directories_first() {
        let dir = scratch_dir("list").await;
        let nodes = FsSource::new(false).list(&dir).await.unwrap();
        let labels: Vec<&str> = nodes.iter().filter_map(|n| n["label"].as_str()).collect();
        assert_eq!(labels, ["src", "Cargo.toml"]);
        assert!(nodes[0].get("children").is_none());
        assert_eq!(nodes[1]["children"], json!([]));
        assert_eq!(nodes[1]["size"], json!(10));

        let all = FsSource::new(true).list(&dir).await.unwrap();
        assert_eq!(all.len(), 3);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_expanding_directory_lists_it() {
        let dir = scratch_dir("expand").await;
        let source = FsSource::new(false);
        let children = source.list(&dir).await.unwrap();
        let tree = Tree::new(
            json!({"children": children}),
            browse_config(TreeConfig::default(), source, &dir),
        );

        let src = tree.key_at(&[0]).unwrap();
        let task = tree.toggle(&src).into_fetch().unwrap();
        assert_eq!(task.run().await.unwrap(), 2);

        let pass = tree.render();
        let labels: Vec<&str> = pass.nodes().map(|row| row.label.as_str()).collect();
        assert_eq!(labels, ["src/", "bin/", "main.rs", "Cargo.toml"]);
        assert_eq!(pass.title.as_deref(), Some(dir.display().to_string().as_str()));
        assert_eq!(pass.at_path(&[0, 1]).unwrap().actions.len(), 1);
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_directory_fails_fetch() {
        let source = FsSource::new(false);
        let err = source
            .request_children(json!({"value": "/definitely/not/here"}), 0)
            .await
            .unwrap_err();
        assert!(!err.message.is_empty());
    }
}
