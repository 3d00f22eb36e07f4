//! mediapub — publish tagged media files to a hosted repository.
//!
//! # Usage
//!
//! ```text
//! mediapub [--config PATH] [--verbose] add <PATH>... --tags "frog, pond"
//! mediapub list [--json]
//! mediapub sync [--message M]
//! mediapub pr [--title T] [--body B]
//! mediapub publish [--message M] [--title T] [--body B]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{add::AddArgs, list::ListArgs, pr::PrArgs, publish::PublishArgs, sync::SyncArgs};
use mediapub_core::Config;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "mediapub",
    version,
    about = "Relocate, tag and publish media files through pull requests",
    long_about = None,
)]
struct Cli {
    /// Path to mediapub.yaml (default: search the current directory and its ancestors).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log library activity at debug level.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Move media files into the publish directory and record their tags.
    Add(AddArgs),

    /// Show the records in the metadata ledger.
    List(ListArgs),

    /// Commit changed published files and the ledger to the configured branch.
    Sync(SyncArgs),

    /// Open a pull request from the configured branch into the base branch.
    Pr(PrArgs),

    /// Run `sync`, then `pr`.
    Publish(PublishArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Add(args) => args.run(&config),
        Commands::List(args) => args.run(&config),
        Commands::Sync(args) => args.run(&config).map(|_| ()),
        Commands::Pr(args) => args.run(&config),
        Commands::Publish(args) => args.run(&config),
    }
}

fn load_config(explicit: Option<&std::path::Path>) -> Result<Config> {
    match explicit {
        Some(path) => {
            Config::load_at(path).with_context(|| format!("failed to load {}", path.display()))
        }
        None => {
            let cwd = std::env::current_dir().context("could not determine current directory")?;
            Config::discover(&cwd).context("no mediapub.yaml found; pass --config")
        }
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
    tracing::debug!("logging initialised at {default}");
}
