//! Blocking GitHub REST client implementing [`GitHost`].
//!
//! All requests go to `{api_url}/repos/{owner}/{repo}/...` with a bearer
//! token, JSON bodies, and the agent-wide timeout. Non-2xx responses become a
//! [`HostError`] whose message is the API's `message` field when present.

use std::fmt;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::error::SyncError;
use crate::host::{
    CommitInfo, GitHost, HostError, NewPullRequest, NewTreeEntry, PullRequest, RemoteTree,
    RemoteTreeEntry, Step, REGULAR_FILE_MODE,
};

pub const USER_AGENT: &str = concat!("mediapub/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// A non-empty bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Read the token from environment variable `var`.
    ///
    /// Unset or blank → `SyncError::MissingCredential`.
    pub fn from_env(var: &str) -> Result<Self, SyncError> {
        match std::env::var(var) {
            Ok(value) if !value.trim().is_empty() => Ok(Self(value.trim().to_string())),
            _ => Err(SyncError::MissingCredential {
                var: var.to_string(),
            }),
        }
    }

    pub fn new(value: impl Into<String>) -> Result<Self, SyncError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(SyncError::MissingCredential {
                var: "token".to_string(),
            });
        }
        Ok(Self(value))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ObjectRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: ObjectRef,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    tree: ObjectRef,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    sha: String,
    #[serde(default)]
    truncated: bool,
    tree: Vec<TreeItem>,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    html_url: String,
}

impl From<PullResponse> for PullRequest {
    fn from(p: PullResponse) -> Self {
        PullRequest {
            number: p.number,
            url: p.html_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// GitHub client scoped to one repository.
pub struct GithubClient {
    agent: ureq::Agent,
    repo_url: String,
    token: Token,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("repo_url", &self.repo_url)
            .finish_non_exhaustive()
    }
}

impl GithubClient {
    pub fn new(api_url: &str, owner: &str, repo: &str, token: Token, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build();
        Self {
            agent,
            repo_url: format!("{}/repos/{owner}/{repo}", api_url.trim_end_matches('/')),
            token,
        }
    }

    pub fn repo_url(&self) -> &str {
        &self.repo_url
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        self.agent
            .request(method, &format!("{}/{path}", self.repo_url))
            .set("Authorization", &format!("Bearer {}", self.token.0))
            .set("Accept", ACCEPT)
            .set("X-GitHub-Api-Version", API_VERSION)
    }

    fn get<T: DeserializeOwned>(&self, step: Step, request: ureq::Request) -> Result<T, HostError> {
        tracing::debug!("{step}: GET {}", request.url());
        read_json(step, check(step, request.call())?)
    }

    fn send<T: DeserializeOwned>(
        &self,
        step: Step,
        request: ureq::Request,
        body: serde_json::Value,
    ) -> Result<T, HostError> {
        tracing::debug!("{step}: {} {}", request.method(), request.url());
        read_json(step, check(step, request.send_json(body))?)
    }
}

fn check(step: Step, result: Result<ureq::Response, ureq::Error>) -> Result<ureq::Response, HostError> {
    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            let message = serde_json::from_str::<ApiMessage>(&body)
                .map(|m| m.message)
                .unwrap_or(body);
            tracing::debug!("{step}: HTTP {status}: {message}");
            Err(HostError::new(step, Some(status), message))
        }
        Err(ureq::Error::Transport(transport)) => {
            Err(HostError::new(step, None, transport.to_string()))
        }
    }
}

fn read_json<T: DeserializeOwned>(step: Step, response: ureq::Response) -> Result<T, HostError> {
    response
        .into_json()
        .map_err(|e| HostError::new(step, None, format!("unreadable response body: {e}")))
}

impl GitHost for GithubClient {
    fn branch_head(&self, branch: &str) -> Result<String, HostError> {
        let step = Step::RefLookup;
        let r: RefResponse = self.get(step, self.request("GET", &format!("git/ref/heads/{branch}")))?;
        Ok(r.object.sha)
    }

    fn commit(&self, sha: &str) -> Result<CommitInfo, HostError> {
        let step = Step::CommitLookup;
        let c: CommitResponse = self.get(step, self.request("GET", &format!("git/commits/{sha}")))?;
        Ok(CommitInfo {
            sha: c.sha,
            tree: c.tree.sha,
        })
    }

    fn tree_recursive(&self, tree_sha: &str) -> Result<RemoteTree, HostError> {
        let step = Step::TreeListing;
        let request = self
            .request("GET", &format!("git/trees/{tree_sha}"))
            .query("recursive", "1");
        let t: TreeResponse = self.get(step, request)?;
        Ok(RemoteTree {
            sha: t.sha,
            truncated: t.truncated,
            entries: t
                .tree
                .into_iter()
                .filter(|item| item.kind == "blob")
                .map(|item| RemoteTreeEntry {
                    path: item.path,
                    blob_hash: item.sha,
                })
                .collect(),
        })
    }

    fn create_blob(&self, content: &[u8]) -> Result<String, HostError> {
        let body = json!({ "content": STANDARD.encode(content), "encoding": "base64" });
        let r: ObjectRef = self.send(Step::BlobUpload, self.request("POST", "git/blobs"), body)?;
        Ok(r.sha)
    }

    fn create_tree(&self, base_tree: &str, entries: &[NewTreeEntry]) -> Result<String, HostError> {
        let tree: Vec<_> = entries
            .iter()
            .map(|e| json!({ "path": e.path, "mode": REGULAR_FILE_MODE, "type": "blob", "sha": e.sha }))
            .collect();
        let body = json!({ "base_tree": base_tree, "tree": tree });
        let r: ObjectRef = self.send(Step::TreeCreate, self.request("POST", "git/trees"), body)?;
        Ok(r.sha)
    }

    fn create_commit(&self, message: &str, tree: &str, parent: &str) -> Result<String, HostError> {
        let body = json!({ "message": message, "tree": tree, "parents": [parent] });
        let r: ObjectRef = self.send(Step::CommitCreate, self.request("POST", "git/commits"), body)?;
        Ok(r.sha)
    }

    fn update_branch(&self, branch: &str, commit: &str) -> Result<(), HostError> {
        let body = json!({ "sha": commit, "force": false });
        let request = self.request("PATCH", &format!("git/refs/heads/{branch}"));
        let _: RefResponse = self.send(Step::RefUpdate, request, body)?;
        Ok(())
    }

    fn create_pull_request(&self, pr: &NewPullRequest<'_>) -> Result<PullRequest, HostError> {
        let body = json!({ "head": pr.head, "base": pr.base, "title": pr.title, "body": pr.body });
        let r: PullResponse = self.send(Step::PullRequestCreate, self.request("POST", "pulls"), body)?;
        Ok(r.into())
    }

    fn open_pull_requests(&self, head: &str, base: &str) -> Result<Vec<PullRequest>, HostError> {
        let request = self
            .request("GET", "pulls")
            .query("head", head)
            .query("base", base)
            .query("state", "open");
        let pulls: Vec<PullResponse> = self.get(Step::PullRequestLookup, request)?;
        Ok(pulls.into_iter().map(PullRequest::from).collect())
    }
}
