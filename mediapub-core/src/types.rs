//! Domain types for the metadata ledger.
//!
//! A [`MetadataRecord`] describes one published media file: the stem of its
//! stored name, the tags attached to it, and its lower-cased extension.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a published file: the stem of its stored file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(pub String);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// MetadataRecord
// ---------------------------------------------------------------------------

/// One ledger entry, serialized as `{"id": ..., "tags": [...], "extension": ...}`.
///
/// Keys this tool does not know are kept in `extra` and written back as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub id: RecordId,
    pub tags: Vec<String>,
    pub extension: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl MetadataRecord {
    pub fn new(id: impl Into<RecordId>, tags: Vec<String>, extension: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tags,
            extension: extension.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Build the record for a file already placed in the publish directory.
    ///
    /// The id is the file stem and the extension is lower-cased; a path with
    /// no stem or no extension yields `MalformedRecord`.
    pub fn for_stored_file(path: &Path, tags: Vec<String>) -> Result<Self, LedgerError> {
        let shown = path.display().to_string();
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LedgerError::malformed(&shown, "stored file has no name"))?;
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| LedgerError::malformed(&shown, "stored file has no extension"))?;
        Ok(Self::new(id, tags, extension))
    }

    /// Check record invariants and that the record round-trips through JSON
    /// unchanged.
    pub fn validate(&self) -> Result<(), LedgerError> {
        let id = &self.id.0;
        if id.trim().is_empty() {
            return Err(LedgerError::malformed(id, "id is empty"));
        }
        if self.tags.is_empty() {
            return Err(LedgerError::malformed(id, "tags are empty"));
        }
        let mut seen = HashSet::new();
        for tag in &self.tags {
            if tag.trim().is_empty() {
                return Err(LedgerError::malformed(id, "tag is blank"));
            }
            if *tag != tag.to_lowercase() {
                return Err(LedgerError::malformed(id, format!("tag '{tag}' is not lower-case")));
            }
            if !seen.insert(tag.as_str()) {
                return Err(LedgerError::malformed(id, format!("tag '{tag}' is duplicated")));
            }
        }
        if self.extension.is_empty() {
            return Err(LedgerError::malformed(id, "extension is missing"));
        }
        if self.extension.starts_with('.') || self.extension != self.extension.to_lowercase() {
            return Err(LedgerError::malformed(
                id,
                format!("extension '{}' must be lower-case without a dot", self.extension),
            ));
        }

        let value = serde_json::to_value(self)
            .map_err(|e| LedgerError::malformed(id, format!("not serializable: {e}")))?;
        let back: MetadataRecord = serde_json::from_value(value)
            .map_err(|e| LedgerError::malformed(id, format!("does not deserialize: {e}")))?;
        if back != *self {
            return Err(LedgerError::malformed(id, "changed during round trip"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
