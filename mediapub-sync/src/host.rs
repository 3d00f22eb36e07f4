//! The hosting API seam.
//!
//! [`GitHost`] is the minimal object-model surface the synchronizer and the
//! publisher need: read one ref, one commit and one recursive tree; write
//! blobs, one tree, one commit; move one ref; open or list pull requests.
//! Every method is a single request/response pair and reports failures as a
//! [`HostError`] carrying the [`Step`] and HTTP status.

use std::fmt;

// ---------------------------------------------------------------------------
// Steps and errors
// ---------------------------------------------------------------------------

/// One discrete hosting API call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    RefLookup,
    CommitLookup,
    TreeListing,
    BlobUpload,
    TreeCreate,
    CommitCreate,
    RefUpdate,
    PullRequestCreate,
    PullRequestLookup,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::RefLookup => "ref lookup",
            Step::CommitLookup => "commit lookup",
            Step::TreeListing => "tree listing",
            Step::BlobUpload => "blob upload",
            Step::TreeCreate => "tree creation",
            Step::CommitCreate => "commit creation",
            Step::RefUpdate => "ref update",
            Step::PullRequestCreate => "pull request creation",
            Step::PullRequestLookup => "pull request lookup",
        };
        f.write_str(name)
    }
}

/// A failed hosting API call. `status` is `None` for transport failures
/// (DNS, TLS, timeouts, unreadable bodies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub step: Step,
    pub status: Option<u16>,
    pub message: String,
}

impl HostError {
    pub fn new(step: Step, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            step,
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} failed (HTTP {status}): {}", self.step, self.message),
            None => write!(f, "{} failed: {}", self.step, self.message),
        }
    }
}

impl std::error::Error for HostError {}

// ---------------------------------------------------------------------------
// Object model
// ---------------------------------------------------------------------------

/// A commit and the root tree it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub sha: String,
    pub tree: String,
}

/// One blob in a recursive tree listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTreeEntry {
    pub path: String,
    pub blob_hash: String,
}

/// Recursive listing of a tree, blobs only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemoteTree {
    pub sha: String,
    pub entries: Vec<RemoteTreeEntry>,
    /// The host cut the listing short; some blobs may be missing.
    pub truncated: bool,
}

/// A regular-file blob to place at `path` in a new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTreeEntry {
    pub path: String,
    pub sha: String,
}

/// Mode of every entry the synchronizer writes.
pub const REGULAR_FILE_MODE: &str = "100644";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPullRequest<'a> {
    pub head: &'a str,
    pub base: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

// ---------------------------------------------------------------------------
// GitHost
// ---------------------------------------------------------------------------

/// Hosting API operations, scoped to one owner/repository pair.
pub trait GitHost {
    /// Commit id `refs/heads/<branch>` points at.
    fn branch_head(&self, branch: &str) -> Result<String, HostError>;

    fn commit(&self, sha: &str) -> Result<CommitInfo, HostError>;

    /// Recursive listing of `tree_sha`, directories excluded.
    fn tree_recursive(&self, tree_sha: &str) -> Result<RemoteTree, HostError>;

    /// Store `content` as a blob and return its id.
    fn create_blob(&self, content: &[u8]) -> Result<String, HostError>;

    /// Create a tree from `base_tree` with `entries` added or replaced.
    fn create_tree(&self, base_tree: &str, entries: &[NewTreeEntry]) -> Result<String, HostError>;

    fn create_commit(&self, message: &str, tree: &str, parent: &str) -> Result<String, HostError>;

    /// Move `refs/heads/<branch>` to `commit`. Never forced: the host must
    /// reject the update when it is not a fast-forward.
    fn update_branch(&self, branch: &str, commit: &str) -> Result<(), HostError>;

    fn create_pull_request(&self, pr: &NewPullRequest<'_>) -> Result<PullRequest, HostError>;

    /// Open pull requests from `head` into `base`.
    fn open_pull_requests(&self, head: &str, base: &str) -> Result<Vec<PullRequest>, HostError>;
}

impl<T: GitHost + ?Sized> GitHost for &T {
    fn branch_head(&self, branch: &str) -> Result<String, HostError> {
        (**self).branch_head(branch)
    }
    fn commit(&self, sha: &str) -> Result<CommitInfo, HostError> {
        (**self).commit(sha)
    }
    fn tree_recursive(&self, tree_sha: &str) -> Result<RemoteTree, HostError> {
        (**self).tree_recursive(tree_sha)
    }
    fn create_blob(&self, content: &[u8]) -> Result<String, HostError> {
        (**self).create_blob(content)
    }
    fn create_tree(&self, base_tree: &str, entries: &[NewTreeEntry]) -> Result<String, HostError> {
        (**self).create_tree(base_tree, entries)
    }
    fn create_commit(&self, message: &str, tree: &str, parent: &str) -> Result<String, HostError> {
        (**self).create_commit(message, tree, parent)
    }
    fn update_branch(&self, branch: &str, commit: &str) -> Result<(), HostError> {
        (**self).update_branch(branch, commit)
    }
    fn create_pull_request(&self, pr: &NewPullRequest<'_>) -> Result<PullRequest, HostError> {
        (**self).create_pull_request(pr)
    }
    fn open_pull_requests(&self, head: &str, base: &str) -> Result<Vec<PullRequest>, HostError> {
        (**self).open_pull_requests(head, base)
    }
}
