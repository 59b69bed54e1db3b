//! Command-line front end for arbor
//!
//! Prints JSON trees as indented text, browses directories with lazily
//! loaded subtrees, and resolves index paths.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use simplelog::{Config, LevelFilter, WriteLogger};

mod commands;
mod output;

use commands::{
    browse::{self, BrowseCommand},
    resolve::{self, ResolveCommand},
    show::{self, ShowCommand},
};

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Expand, page and inspect JSON trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a JSON tree
    Show(ShowCommand),

    /// Browse a directory, listing subdirectories on demand
    Browse(BrowseCommand),

    /// Print the node at an index path
    Resolve(ResolveCommand),
}

fn init_logging(verbose: bool, log_file: Option<&PathBuf>) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            WriteLogger::init(level, Config::default(), file)?;
        }
        None => WriteLogger::init(level, Config::default(), std::io::stderr())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_file.as_ref())?;

    match cli.command {
        Commands::Show(cmd) => show::handle_show_command(cmd).await,
        Commands::Browse(cmd) => browse::handle_browse_command(cmd).await,
        Commands::Resolve(cmd) => resolve::handle_resolve_command(cmd).await,
    }
}
