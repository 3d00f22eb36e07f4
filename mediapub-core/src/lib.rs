//! mediapub core library — metadata records, the ledger, file relocation.
//!
//! Public API surface:
//! - [`types`]: [`MetadataRecord`] and its id newtype
//! - [`ledger`]: append-only JSON ledger with a scoped file lock
//! - [`relocate`]: publish-directory discovery and collision-free moves
//! - [`tags`]: free-text tag validation
//! - [`media`]: media file discovery
//! - [`config`]: `mediapub.yaml` loading
//! - [`error`]: error enums for all of the above

pub mod config;
pub mod error;
pub mod ledger;
pub mod media;
pub mod relocate;
pub mod tags;
pub mod types;

pub use config::Config;
pub use error::{ConfigError, LedgerError, RelocateError, TagError};
pub use ledger::Ledger;
pub use relocate::Relocator;
pub use types::{MetadataRecord, RecordId};
