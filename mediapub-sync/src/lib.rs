//! # mediapub-sync
//!
//! Remote tree synchronization and pull request publishing against a
//! GitHub-compatible hosting API.
//!
//! Call [`Synchronizer::synchronize`] to push the changed subset of a set of
//! local files as one commit on a branch, then
//! [`PullRequestPublisher::open`] to propose it.

pub mod error;
pub mod github;
pub mod hashing;
pub mod host;
pub mod pipeline;
pub mod publisher;

pub use error::SyncError;
pub use github::{GithubClient, Token};
pub use host::{GitHost, HostError, PullRequest, RemoteTreeEntry, Step};
pub use pipeline::{SyncResult, Synchronizer};
pub use publisher::{PullRequestPublisher, PullRequestResult};
