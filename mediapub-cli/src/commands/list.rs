//! `mediapub list` — show ledger records.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mediapub_core::{Config, Ledger, MetadataRecord};
use tabled::{settings::Style, Table, Tabled};

/// Arguments for `mediapub list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Emit the records as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "id")]
    id: String,
    #[tabled(rename = "ext")]
    extension: String,
    #[tabled(rename = "tags")]
    tags: String,
}

impl From<MetadataRecord> for RecordRow {
    fn from(record: MetadataRecord) -> Self {
        Self {
            id: record.id.0,
            extension: record.extension,
            tags: record.tags.join(", "),
        }
    }
}

impl ListArgs {
    pub fn run(self, config: &Config) -> Result<()> {
        let ledger = Ledger::new(config.ledger_path());
        let records = ledger
            .load()
            .with_context(|| format!("failed to read {}", ledger.path().display()))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&records).context("failed to serialize records")?
            );
            return Ok(());
        }

        if records.is_empty() {
            println!("No records in {}.", ledger.path().display());
            return Ok(());
        }

        println!(
            "{} {} record(s)",
            ledger.path().display().to_string().bold(),
            records.len()
        );
        let mut table = Table::new(records.into_iter().map(RecordRow::from));
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
