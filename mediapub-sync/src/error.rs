//! Error types for mediapub-sync.

use std::path::PathBuf;

use thiserror::Error;

use crate::host::{HostError, Step};

/// All errors that can abort a synchronization pass or a pull request call.
///
/// None of these are retried internally. `NonFastForward` is the one a
/// caller can safely answer by starting a fresh pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The bearer token environment variable is unset or empty.
    #[error("missing credential: ${var} is not set")]
    MissingCredential { var: String },

    /// The branch does not exist on the host.
    #[error("branch '{branch}' not found")]
    RefNotFound {
        branch: String,
        #[source]
        source: HostError,
    },

    /// The recursive listing of the branch's tree could not be fetched.
    #[error("could not fetch remote tree: {0}")]
    TreeFetch(#[source] HostError),

    /// A changed file could not be uploaded as a blob.
    #[error("could not upload {path}: {source}")]
    BlobUpload {
        path: String,
        #[source]
        source: HostError,
    },

    /// The branch moved since the pass started; the host refused to
    /// fast-forward it.
    #[error("branch '{branch}' moved during sync; rerun the sync")]
    NonFastForward {
        branch: String,
        #[source]
        source: HostError,
    },

    /// Any other failed hosting API call.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A staged path does not lie under the working tree root.
    #[error("{path} is outside the working tree {root}")]
    PathOutsideRoot { path: PathBuf, root: PathBuf },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// The hosting API step that failed, when the failure came from the host.
    pub fn step(&self) -> Option<Step> {
        self.host_error().map(|e| e.step)
    }

    /// HTTP status of the failed call, when there was a response.
    pub fn status(&self) -> Option<u16> {
        self.host_error().and_then(|e| e.status)
    }

    fn host_error(&self) -> Option<&HostError> {
        match self {
            SyncError::RefNotFound { source, .. }
            | SyncError::BlobUpload { source, .. }
            | SyncError::NonFastForward { source, .. } => Some(source),
            SyncError::TreeFetch(e) | SyncError::Host(e) => Some(e),
            _ => None,
        }
    }
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
