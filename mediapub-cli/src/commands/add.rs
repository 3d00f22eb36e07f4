//! `mediapub add` — relocate media files and record their tags.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use mediapub_core::{media, tags::parse_tags, Config, Ledger, MetadataRecord, Relocator};

/// Arguments for `mediapub add`.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Media files, or directories whose media files are all added.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<PathBuf>,

    /// Comma-separated tags applied to every file, e.g. "frog, pond".
    #[arg(long, short)]
    pub tags: String,
}

impl AddArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        let tags = parse_tags(&self.tags).with_context(|| format!("invalid tags '{}'", self.tags))?;
        let files = expand(&self.paths)?;
        if files.is_empty() {
            bail!("no media files found in the given paths");
        }

        let relocator = Relocator::discover(config.root(), config.publish_parent.as_deref())
            .context("could not locate the publish directory")?;
        let ledger = Ledger::new(config.ledger_path());

        for source in &files {
            let stored = relocator
                .relocate(source)
                .with_context(|| format!("failed to move {}", source.display()))?;
            let record = MetadataRecord::for_stored_file(&stored, tags.clone())?;
            let id = record.id.clone();
            ledger.append(record).with_context(|| {
                format!(
                    "{} was moved to {} but could not be recorded",
                    source.display(),
                    stored.display()
                )
            })?;
            println!("{} {} → {}", "✓".green(), source.display(), id.to_string().bold());
        }

        println!(
            "Added {} file(s) tagged {} to {}",
            files.len(),
            tags.join(", "),
            ledger.path().display()
        );
        Ok(())
    }
}

/// Files stay as given; directories expand to their media files.
fn expand(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            files.extend(media::scan_dir(path)?);
        } else {
            ensure_media_file(path)?;
            files.push(path.clone());
        }
    }
    Ok(files)
}

fn ensure_media_file(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("{} does not exist", path.display());
    }
    if !media::is_media_file(path) {
        bail!(
            "{} is not a media file (expected one of: {})",
            path.display(),
            media::MEDIA_EXTENSIONS.join(", ")
        );
    }
    Ok(())
}
