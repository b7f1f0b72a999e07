//! Reaper CLI
//!
//! Command-line tools for inspecting and maintaining a Reaper store file.
//!
//! # Commands
//!
//! - `inspect` - Display store statistics
//! - `categories` - List a user's categories
//! - `feeds` - List a user's feeds, optionally for one category
//! - `later` - List a user's saved articles
//! - `compact` - Rewrite the commit log as a single snapshot
//!
//! Listing never creates namespaces. Opening a store does cut off a torn
//! record at the end of the log.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reaper store maintenance tools.
#[derive(Parser)]
#[command(name = "reaper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store file
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Display store statistics
    Inspect,

    /// List a user's categories
    Categories {
        /// User identifier
        #[arg(short, long)]
        user: String,
    },

    /// List a user's feeds
    Feeds {
        /// User identifier
        #[arg(short, long)]
        user: String,

        /// Only feeds filed under this category id
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List a user's saved articles, newest first
    Later {
        /// User identifier
        #[arg(short, long)]
        user: String,
    },

    /// Rewrite the commit log as a single snapshot
    Compact {
        /// Only report the current log size
        #[arg(short, long)]
        dry_run: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let path = cli.path.ok_or("store path required (--path)")?;
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Inspect => commands::inspect::run(&mut out, &path, cli.format)?,
        Commands::Categories { user } => {
            commands::list::categories(&mut out, &path, &user, cli.format)?;
        }
        Commands::Feeds { user, category } => {
            commands::list::feeds(&mut out, &path, &user, category.as_deref(), cli.format)?;
        }
        Commands::Later { user } => commands::list::later(&mut out, &path, &user, cli.format)?,
        Commands::Compact { dry_run } => {
            commands::compact::run(&mut out, &path, dry_run, cli.format)?;
        }
    }

    Ok(())
}
