//! `mediapub publish` — `sync` followed by `pr`.

use anyhow::Result;
use clap::Args;
use mediapub_core::Config;

use super::{pr::PrArgs, sync::SyncArgs};

/// Arguments for `mediapub publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Commit message (default: "Add media <date>").
    #[arg(long, short)]
    pub message: Option<String>,

    /// Pull request title (default: "Add media <date>").
    #[arg(long)]
    pub title: Option<String>,

    /// Pull request body.
    #[arg(long)]
    pub body: Option<String>,
}

impl PublishArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        // A NoChanges pass still proposes: an earlier sync may have left the
        // branch ahead of base.
        SyncArgs {
            message: self.message,
        }
        .run(config)?;
        PrArgs {
            title: self.title,
            body: self.body,
        }
        .run(config)
    }
}
