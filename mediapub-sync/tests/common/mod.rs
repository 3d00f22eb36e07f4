//! In-memory hosting API used by the pipeline and publisher tests.
//!
//! Objects get sequential ids (`tree-1`, `commit-2`, ...) except blobs, which
//! use the real git blob hash so local and remote hashes line up.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use mediapub_sync::hashing::blob_hash;
use mediapub_sync::host::{
    CommitInfo, GitHost, HostError, NewPullRequest, NewTreeEntry, PullRequest, RemoteTree,
    RemoteTreeEntry, Step,
};

#[derive(Debug, Clone)]
pub struct CommitObject {
    pub tree: String,
    pub parent: Option<String>,
    pub message: String,
}

#[derive(Default)]
struct State {
    refs: HashMap<String, String>,
    commits: HashMap<String, CommitObject>,
    trees: HashMap<String, BTreeMap<String, String>>,
    blobs: HashMap<String, Vec<u8>>,
    pulls: Vec<(String, String, PullRequest)>,
    calls: Vec<Step>,
    failures: HashMap<Step, HostError>,
    race_on_update: bool,
    next_id: u64,
}

impl State {
    fn id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }

    fn add_commit(&mut self, tree: String, parent: Option<String>, message: &str) -> String {
        let id = self.id("commit");
        self.commits.insert(
            id.clone(),
            CommitObject {
                tree,
                parent,
                message: message.to_string(),
            },
        );
        id
    }

    fn descends_from(&self, commit: &str, ancestor: &str) -> bool {
        let mut cursor = Some(commit.to_string());
        while let Some(c) = cursor {
            if c == ancestor {
                return true;
            }
            cursor = self.commits.get(&c).and_then(|o| o.parent.clone());
        }
        false
    }
}

#[derive(Default)]
pub struct MemoryHost {
    state: RefCell<State>,
}

impl MemoryHost {
    /// A repository with one branch whose single commit holds `files`.
    pub fn with_branch(branch: &str, files: &[(&str, &str)]) -> Self {
        let host = MemoryHost::default();
        {
            let mut s = host.state.borrow_mut();
            let mut tree = BTreeMap::new();
            for (path, content) in files {
                let sha = blob_hash(content.as_bytes());
                s.blobs.insert(sha.clone(), content.as_bytes().to_vec());
                tree.insert(path.to_string(), sha);
            }
            let tree_id = s.id("tree");
            s.trees.insert(tree_id.clone(), tree);
            let commit = s.add_commit(tree_id, None, "initial");
            s.refs.insert(branch.to_string(), commit);
        }
        host
    }

    /// Make the next call to `step` fail with `status`.
    pub fn fail_on(&self, step: Step, status: Option<u16>) {
        self.state
            .borrow_mut()
            .failures
            .insert(step, HostError::new(step, status, "injected failure"));
    }

    /// Have another writer push to the branch right before our ref update.
    pub fn race_on_update(&self) {
        self.state.borrow_mut().race_on_update = true;
    }

    pub fn add_pull(&self, head: &str, base: &str, number: u64) {
        self.state.borrow_mut().pulls.push((
            head.to_string(),
            base.to_string(),
            PullRequest {
                number,
                url: format!("https://example.test/pull/{number}"),
            },
        ));
    }

    pub fn head(&self, branch: &str) -> Option<String> {
        self.state.borrow().refs.get(branch).cloned()
    }

    pub fn commit_object(&self, commit: &str) -> CommitObject {
        self.state.borrow().commits[commit].clone()
    }

    /// Path → blob id of the tree `commit` points at.
    pub fn files_at(&self, commit: &str) -> BTreeMap<String, String> {
        let s = self.state.borrow();
        s.trees[&s.commits[commit].tree].clone()
    }

    pub fn reachable(&self, branch: &str, commit: &str) -> bool {
        let s = self.state.borrow();
        s.refs
            .get(branch)
            .is_some_and(|head| s.descends_from(head, commit))
    }

    pub fn calls(&self) -> Vec<Step> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, step: Step) -> usize {
        self.calls().into_iter().filter(|s| *s == step).count()
    }

    /// Calls that create objects or move refs.
    pub fn writes(&self) -> Vec<Step> {
        self.calls()
            .into_iter()
            .filter(|s| {
                matches!(
                    s,
                    Step::BlobUpload | Step::TreeCreate | Step::CommitCreate | Step::RefUpdate
                )
            })
            .collect()
    }

    pub fn reset_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn enter(&self, step: Step) -> Result<(), HostError> {
        let mut s = self.state.borrow_mut();
        s.calls.push(step);
        match s.failures.remove(&step) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn rejected(step: Step, message: &str) -> HostError {
    HostError::new(step, Some(422), message)
}

impl GitHost for MemoryHost {
    fn branch_head(&self, branch: &str) -> Result<String, HostError> {
        self.enter(Step::RefLookup)?;
        self.head(branch)
            .ok_or_else(|| HostError::new(Step::RefLookup, Some(404), "Not Found"))
    }

    fn commit(&self, sha: &str) -> Result<CommitInfo, HostError> {
        self.enter(Step::CommitLookup)?;
        let s = self.state.borrow();
        let c = s
            .commits
            .get(sha)
            .ok_or_else(|| HostError::new(Step::CommitLookup, Some(404), "Not Found"))?;
        Ok(CommitInfo {
            sha: sha.to_string(),
            tree: c.tree.clone(),
        })
    }

    fn tree_recursive(&self, tree_sha: &str) -> Result<RemoteTree, HostError> {
        self.enter(Step::TreeListing)?;
        let s = self.state.borrow();
        let tree = s
            .trees
            .get(tree_sha)
            .ok_or_else(|| HostError::new(Step::TreeListing, Some(404), "Not Found"))?;
        Ok(RemoteTree {
            sha: tree_sha.to_string(),
            entries: tree
                .iter()
                .map(|(path, sha)| RemoteTreeEntry {
                    path: path.clone(),
                    blob_hash: sha.clone(),
                })
                .collect(),
            truncated: false,
        })
    }

    fn create_blob(&self, content: &[u8]) -> Result<String, HostError> {
        self.enter(Step::BlobUpload)?;
        let sha = blob_hash(content);
        self.state
            .borrow_mut()
            .blobs
            .insert(sha.clone(), content.to_vec());
        Ok(sha)
    }

    fn create_tree(&self, base_tree: &str, entries: &[NewTreeEntry]) -> Result<String, HostError> {
        self.enter(Step::TreeCreate)?;
        let mut s = self.state.borrow_mut();
        let mut tree = s
            .trees
            .get(base_tree)
            .cloned()
            .ok_or_else(|| rejected(Step::TreeCreate, "base_tree is not a tree"))?;
        for entry in entries {
            if !s.blobs.contains_key(&entry.sha) {
                return Err(rejected(Step::TreeCreate, "unknown blob"));
            }
            tree.insert(entry.path.clone(), entry.sha.clone());
        }
        let id = s.id("tree");
        s.trees.insert(id.clone(), tree);
        Ok(id)
    }

    fn create_commit(&self, message: &str, tree: &str, parent: &str) -> Result<String, HostError> {
        self.enter(Step::CommitCreate)?;
        let mut s = self.state.borrow_mut();
        if !s.trees.contains_key(tree) || !s.commits.contains_key(parent) {
            return Err(rejected(Step::CommitCreate, "unknown tree or parent"));
        }
        Ok(s.add_commit(tree.to_string(), Some(parent.to_string()), message))
    }

    fn update_branch(&self, branch: &str, commit: &str) -> Result<(), HostError> {
        self.enter(Step::RefUpdate)?;
        let mut s = self.state.borrow_mut();
        let current = s
            .refs
            .get(branch)
            .cloned()
            .ok_or_else(|| rejected(Step::RefUpdate, "Reference does not exist"))?;

        let current = if std::mem::take(&mut s.race_on_update) {
            let tree = s.commits[&current].tree.clone();
            let theirs = s.add_commit(tree, Some(current), "someone else");
            s.refs.insert(branch.to_string(), theirs.clone());
            theirs
        } else {
            current
        };

        if !s.descends_from(commit, &current) {
            return Err(rejected(Step::RefUpdate, "Update is not a fast forward"));
        }
        s.refs.insert(branch.to_string(), commit.to_string());
        Ok(())
    }

    fn create_pull_request(&self, pr: &NewPullRequest<'_>) -> Result<PullRequest, HostError> {
        self.enter(Step::PullRequestCreate)?;
        let mut s = self.state.borrow_mut();
        let head_branch = pr.head.rsplit(':').next().unwrap_or(pr.head);
        if head_branch == pr.base {
            return Err(rejected(Step::PullRequestCreate, "No commits between base and head"));
        }
        if s.pulls.iter().any(|(h, b, _)| h == pr.head && b == pr.base) {
            return Err(rejected(
                Step::PullRequestCreate,
                "A pull request already exists for this head",
            ));
        }
        let number = s.pulls.len() as u64 + 1;
        let created = PullRequest {
            number,
            url: format!("https://example.test/pull/{number}"),
        };
        s.pulls
            .push((pr.head.to_string(), pr.base.to_string(), created.clone()));
        Ok(created)
    }

    fn open_pull_requests(&self, head: &str, base: &str) -> Result<Vec<PullRequest>, HostError> {
        self.enter(Step::PullRequestLookup)?;
        Ok(self
            .state
            .borrow()
            .pulls
            .iter()
            .filter(|(h, b, _)| h == head && b == base)
            .map(|(_, _, pr)| pr.clone())
            .collect())
    }
}
