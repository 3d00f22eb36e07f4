//! Error types for mediapub-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by [`crate::ledger::Ledger`] operations.
///
/// `MalformedRecord` and `MalformedLedger` are always raised before the
/// document on disk is touched.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The candidate record does not survive a round trip through JSON, or
    /// violates a record invariant (empty tags, missing extension, ...).
    #[error("malformed record '{id}': {reason}")]
    MalformedRecord { id: String, reason: String },

    /// The ledger document on disk is not a parseable JSON array of records.
    #[error("malformed ledger at {path}: {source}")]
    MalformedLedger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Another writer holds the ledger lock.
    #[error("ledger is locked by another writer ({path})")]
    Locked { path: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while discovering the publish directory or moving files.
#[derive(Debug, Error)]
pub enum RelocateError {
    /// No `public` directory under the expected parent was found.
    #[error("could not find a '{name}' publish directory under {root}")]
    PublishDirectoryNotFound { root: PathBuf, name: String },

    /// The source file does not exist or is not a regular file.
    #[error("source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// The source file has no extension to carry over.
    #[error("source file has no extension: {path}")]
    MissingExtension { path: PathBuf },

    /// Every generated name was already taken.
    #[error("could not find a free file name in {dir}")]
    NameExhausted { dir: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Rejections produced by [`crate::tags::parse_tags`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("empty text is not allowed")]
    Empty,

    #[error("only letters, spaces, and commas are allowed")]
    InvalidCharacters,

    #[error("accented, hyphenated, or special characters are not allowed")]
    NonAscii,

    #[error("only commas and spaces are not allowed")]
    OnlySeparators,

    #[error("leading, trailing, or consecutive commas are not allowed")]
    MisplacedComma,

    #[error("at least two unique tags of minimum two characters are required")]
    TooFewOrDuplicate,
}

/// Errors raised while loading `mediapub.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No config file at the given path, or in any ancestor when discovering.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// YAML parse error, including missing required keys.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl LedgerError {
    pub(crate) fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        LedgerError::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

pub(crate) fn ledger_io(path: impl Into<PathBuf>, source: std::io::Error) -> LedgerError {
    LedgerError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn relocate_io(path: impl Into<PathBuf>, source: std::io::Error) -> RelocateError {
    RelocateError::Io {
        path: path.into(),
        source,
    }
}
