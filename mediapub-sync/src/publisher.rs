//! Pull request creation and lookup.

use crate::error::SyncError;
use crate::host::{GitHost, NewPullRequest, PullRequest};

/// Outcome of [`PullRequestPublisher::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullRequestResult {
    Created(PullRequest),
    /// The host answered 422: head and base are identical, or a pull request
    /// for this head already exists. Benign; nothing to do.
    DuplicateOrNoDiff { message: String },
}

/// Opens pull requests against the repository `host` is scoped to.
#[derive(Debug)]
pub struct PullRequestPublisher<H> {
    host: H,
}

impl<H: GitHost> PullRequestPublisher<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }

    /// Issue a single creation request from `head` (`owner:branch` for forks)
    /// into `base`.
    pub fn open(
        &self,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestResult, SyncError> {
        let request = NewPullRequest {
            head,
            base,
            title,
            body,
        };
        match self.host.create_pull_request(&request) {
            Ok(pr) => {
                tracing::info!("opened pull request #{} ({})", pr.number, pr.url);
                Ok(PullRequestResult::Created(pr))
            }
            Err(e) if e.status == Some(422) => {
                tracing::info!("pull request not created: {}", e.message);
                Ok(PullRequestResult::DuplicateOrNoDiff { message: e.message })
            }
            Err(e) => Err(SyncError::Host(e)),
        }
    }

    /// The first open pull request from `head` into `base`, if any.
    pub fn find_open(&self, head: &str, base: &str) -> Result<Option<PullRequest>, SyncError> {
        Ok(self.host.open_pull_requests(head, base)?.into_iter().next())
    }
}
