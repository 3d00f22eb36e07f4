//! `mediapub pr` — propose the configured branch for merging.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mediapub_core::Config;
use mediapub_sync::{PullRequestPublisher, PullRequestResult};

use super::{github_client, today};

/// Arguments for `mediapub pr`.
#[derive(Args, Debug)]
pub struct PrArgs {
    /// Pull request title (default: "Add media <date>").
    #[arg(long)]
    pub title: Option<String>,

    /// Pull request body.
    #[arg(long)]
    pub body: Option<String>,
}

impl PrArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        let client = github_client(config, &config.owner)?;
        let publisher = PullRequestPublisher::new(&client);

        let head = config.head_ref();
        let title = self.title.unwrap_or_else(|| format!("Add media {}", today()));
        let body = self.body.unwrap_or_else(|| {
            format!(
                "New media files and tags from `{}`.",
                config.ledger.display()
            )
        });

        let result = publisher
            .open(&head, &config.base, &title, &body)
            .with_context(|| format!("failed to open a pull request from {head}"))?;
        match result {
            PullRequestResult::Created(pr) => {
                println!("{} opened pull request #{}: {}", "✓".green(), pr.number, pr.url)
            }
            PullRequestResult::DuplicateOrNoDiff { message } => {
                let existing = publisher
                    .find_open(&head, &config.base)
                    .context("failed to look up open pull requests")?;
                match existing {
                    Some(pr) => println!(
                        "{} pull request #{} is already open: {}",
                        "·".bright_black(),
                        pr.number,
                        pr.url
                    ),
                    None => println!("{} nothing to propose: {message}", "·".bright_black()),
                }
            }
        }
        Ok(())
    }
}
