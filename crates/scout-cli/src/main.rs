//! # Scout CLI
//!
//! Command-line interface for the Scout file browser and search tool.
//!
//! ## Commands
//!
//! - `scout index [ROOT]` - Build the in-memory index and report statistics
//! - `scout query <pattern>` - Search for files matching a pattern
//! - `scout browse [ROOT]` - Start an interactive browsing shell
//!
//! ## Example Usage
//!
//! ```bash
//! # Index a project tree and show what was found
//! scout index ~/projects
//!
//! # Search for large CSV files
//! scout query "sales ext:csv size:>1MB" --root ~/data
//!
//! # Browse interactively
//! scout browse ~/projects
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Scout - Browse and search directory trees
#[derive(Parser)]
#[command(name = "scout")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the file index for a directory tree
    Index {
        /// Directory to index (defaults to the configured root)
        root: Option<PathBuf>,
    },

    /// Search for files matching a pattern
    Query {
        /// Search pattern: free text or wildcards plus filters such as ext:pdf
        pattern: String,

        /// Directory to search (defaults to the configured root)
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Walk the directory directly instead of building an index
        #[arg(long)]
        no_index: bool,

        /// Maximum number of results to show
        #[arg(short, long, default_value = "100")]
        limit: usize,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Start an interactive browsing shell
    #[command(alias = "b")]
    Browse {
        /// Directory to start in (defaults to the configured root)
        root: Option<PathBuf>,
    },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration first so its log level can apply
    let config = match &cli.config {
        Some(path) => scout_core::Config::load_from(path)?,
        None => scout_core::Config::load()?,
    };

    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.general.log_level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    match cli.command {
        Commands::Index { root } => commands::index::run(config, root),
        Commands::Query {
            pattern,
            root,
            no_index,
            limit,
            output,
        } => commands::query::run(config, &pattern, root, no_index, limit, output),
        Commands::Browse { root } => commands::browse::run(config, root),
    }
}
