//! `mediapub sync` — commit changed published files to the configured branch.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mediapub_core::{Config, Relocator};
use mediapub_sync::{SyncResult, Synchronizer};

use super::{github_client, today};

/// Arguments for `mediapub sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Commit message (default: "Add media <date>").
    #[arg(long, short)]
    pub message: Option<String>,
}

impl SyncArgs {
    pub fn run(self, config: &Config) -> Result<SyncResult> {
        let client = github_client(config, config.head_owner())?;

        let relocator = Relocator::discover(config.root(), config.publish_parent.as_deref())
            .context("could not locate the publish directory")?;
        let mut staged = relocator
            .published_files()
            .context("failed to list published files")?;
        let ledger = config.ledger_path();
        if ledger.is_file() {
            staged.push(ledger);
        }

        let message = self
            .message
            .unwrap_or_else(|| format!("Add media {}", today()));
        let target = format!("{}/{}:{}", config.head_owner(), config.repo, config.branch);
        let result = Synchronizer::new(&client, config.root())
            .synchronize(&config.branch, &staged, &message)
            .with_context(|| format!("sync to {target} failed"))?;

        match &result {
            SyncResult::NoChanges => {
                println!("{} {target}: no changes ({} file(s) checked)", "·".bright_black(), staged.len())
            }
            SyncResult::Committed(commit) => {
                println!("{} {target}: committed {}", "✓".green(), commit.bold())
            }
        }
        Ok(result)
    }
}
