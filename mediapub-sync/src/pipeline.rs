//! The synchronization pass as a step-sequenced pipeline.
//!
//! ```text
//! fetch_ref ──► RefFetched ──► fetch_tree ──► TreeFetched ──► diff ──► Diffed
//!                                                                        │
//!        RefAdvanced ◄── advance ◄── Committed ◄── commit ◄── BlobsStaged ◄── stage_blobs
//! ```
//!
//! Each transition is one method consuming the previous state, so every
//! step's failure mode can be exercised on its own. [`Synchronizer::synchronize`]
//! chains them and stops at `Diffed` when nothing changed.
//!
//! Steps 1–4 only read; repeating them is always safe. Steps 5–7 write to
//! the host and are never retried here: a `NonFastForward` means the caller
//! must start a new pass from a fresh baseline.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::hashing::blob_hash;
use crate::host::{GitHost, HostError, NewTreeEntry, Step};

/// Terminal outcome of a successful pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    /// Every staged file already matched the remote tree. Nothing was written.
    NoChanges,
    /// The branch now points at this new commit.
    Committed(String),
}

// ---------------------------------------------------------------------------
// Pipeline states
// ---------------------------------------------------------------------------

/// Step 1: the branch head and its root tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefFetched {
    pub branch: String,
    pub head: String,
    pub base_tree: String,
}

/// Step 2: the remote blob listing, path → blob id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFetched {
    pub base: RefFetched,
    pub remote: BTreeMap<String, String>,
}

/// A local file whose content differs from (or is absent in) the remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub repo_path: String,
    pub local_path: PathBuf,
    pub hash: String,
    pub content: Vec<u8>,
}

/// Step 3: the changed subset of the staging set, ordered by repo path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diffed {
    pub base: RefFetched,
    pub changed: Vec<ChangedFile>,
    pub unchanged: usize,
}

/// Step 5: blobs uploaded and registered in one new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobsStaged {
    pub base: RefFetched,
    pub tree: String,
    pub paths: Vec<String>,
}

/// Step 6: a commit object exists but no branch points at it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Committed {
    pub base: RefFetched,
    pub commit: String,
}

/// Step 7: the branch was fast-forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefAdvanced {
    pub branch: String,
    pub commit: String,
}

// ---------------------------------------------------------------------------
// Synchronizer
// ---------------------------------------------------------------------------

/// Reconciles local files under `root` with one branch of a hosted repository.
///
/// Holds no state between passes; the remote baseline is fetched every time.
#[derive(Debug)]
pub struct Synchronizer<H> {
    host: H,
    root: PathBuf,
}

impl<H: GitHost> Synchronizer<H> {
    /// `root` maps local paths to repository paths: `<root>/a/b.png` is `a/b.png`.
    pub fn new(host: H, root: impl Into<PathBuf>) -> Self {
        Self {
            host,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Push the changed subset of `paths` to `branch` as one commit.
    ///
    /// Relative paths resolve against the root. Returns `NoChanges` without
    /// any write request when every file already matches the remote tree.
    pub fn synchronize<I, P>(
        &self,
        branch: &str,
        paths: I,
        message: &str,
    ) -> Result<SyncResult, SyncError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let fetched = self.fetch_ref(branch)?;
        let listed = self.fetch_tree(fetched)?;
        let diffed = self.diff(listed, paths)?;
        if diffed.changed.is_empty() {
            tracing::info!(
                "{branch}: {} file(s) already match the remote tree, nothing to commit",
                diffed.unchanged
            );
            return Ok(SyncResult::NoChanges);
        }
        let staged = self.stage_blobs(diffed)?;
        let committed = self.commit(staged, message)?;
        let advanced = self.advance(committed)?;
        Ok(SyncResult::Committed(advanced.commit))
    }

    /// Step 1: resolve the branch head commit and its root tree.
    pub fn fetch_ref(&self, branch: &str) -> Result<RefFetched, SyncError> {
        let head = self.host.branch_head(branch).map_err(|e| match e.status {
            Some(404) => SyncError::RefNotFound {
                branch: branch.to_string(),
                source: e,
            },
            _ => SyncError::Host(e),
        })?;
        let commit = self.host.commit(&head)?;
        tracing::info!("{branch}: head {head}, tree {}", commit.tree);
        Ok(RefFetched {
            branch: branch.to_string(),
            head,
            base_tree: commit.tree,
        })
    }

    /// Step 2: list every blob reachable from the base tree.
    pub fn fetch_tree(&self, base: RefFetched) -> Result<TreeFetched, SyncError> {
        let tree = self
            .host
            .tree_recursive(&base.base_tree)
            .map_err(SyncError::TreeFetch)?;
        if tree.truncated {
            // Missing entries only cause re-uploads of identical content.
            tracing::warn!(
                "{}: remote tree listing was truncated; unchanged files may be re-sent",
                base.branch
            );
        }
        let remote: BTreeMap<String, String> = tree
            .entries
            .into_iter()
            .map(|e| (e.path, e.blob_hash))
            .collect();
        tracing::debug!("{}: {} remote blobs", base.branch, remote.len());
        Ok(TreeFetched { base, remote })
    }

    /// Step 3: hash each local file and keep those absent or different remotely.
    pub fn diff<I, P>(&self, listed: TreeFetched, paths: I) -> Result<Diffed, SyncError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut staged = BTreeMap::new();
        for path in paths {
            let (local_path, repo_path) = locate(&self.root, path.as_ref())?;
            staged.insert(repo_path, local_path);
        }

        let mut changed = Vec::new();
        let mut unchanged = 0;
        for (repo_path, local_path) in staged {
            let content = std::fs::read(&local_path).map_err(|e| io_err(&local_path, e))?;
            let hash = blob_hash(&content);
            match listed.remote.get(&repo_path) {
                Some(remote) if *remote == hash => {
                    tracing::debug!("unchanged: {repo_path}");
                    unchanged += 1;
                }
                Some(_) => {
                    tracing::debug!("modified: {repo_path}");
                    changed.push(ChangedFile { repo_path, local_path, hash, content });
                }
                None => {
                    tracing::debug!("new: {repo_path}");
                    changed.push(ChangedFile { repo_path, local_path, hash, content });
                }
            }
        }
        Ok(Diffed {
            base: listed.base,
            changed,
            unchanged,
        })
    }

    /// Step 5: upload each changed blob, then register them all in one tree
    /// on top of the base tree.
    pub fn stage_blobs(&self, diffed: Diffed) -> Result<BlobsStaged, SyncError> {
        let mut entries = Vec::with_capacity(diffed.changed.len());
        for file in &diffed.changed {
            let sha = self
                .host
                .create_blob(&file.content)
                .map_err(|source| SyncError::BlobUpload {
                    path: file.repo_path.clone(),
                    source,
                })?;
            if sha != file.hash {
                tracing::warn!(
                    "host addressed {} as {sha}, expected {}",
                    file.repo_path,
                    file.hash
                );
            }
            entries.push(NewTreeEntry {
                path: file.repo_path.clone(),
                sha,
            });
        }

        let tree = self.host.create_tree(&diffed.base.base_tree, &entries)?;
        tracing::info!(
            "{}: staged {} blob(s) in tree {tree}",
            diffed.base.branch,
            entries.len()
        );
        Ok(BlobsStaged {
            base: diffed.base,
            tree,
            paths: entries.into_iter().map(|e| e.path).collect(),
        })
    }

    /// Step 6: create the commit; its sole parent is the head from step 1.
    pub fn commit(&self, staged: BlobsStaged, message: &str) -> Result<Committed, SyncError> {
        let commit = self
            .host
            .create_commit(message, &staged.tree, &staged.base.head)?;
        tracing::info!("{}: created commit {commit}", staged.base.branch);
        Ok(Committed {
            base: staged.base,
            commit,
        })
    }

    /// Step 7: fast-forward the branch to the new commit.
    pub fn advance(&self, committed: Committed) -> Result<RefAdvanced, SyncError> {
        let branch = committed.base.branch;
        self.host
            .update_branch(&branch, &committed.commit)
            .map_err(|e| non_fast_forward(&branch, e))?;
        tracing::info!("{branch}: advanced to {}", committed.commit);
        Ok(RefAdvanced {
            branch,
            commit: committed.commit,
        })
    }
}

fn non_fast_forward(branch: &str, e: HostError) -> SyncError {
    match e.status {
        Some(409) | Some(422) if e.step == Step::RefUpdate => SyncError::NonFastForward {
            branch: branch.to_string(),
            source: e,
        },
        _ => SyncError::Host(e),
    }
}

/// Resolve `path` to `(local file, repo path)`.
///
/// Relative paths are taken relative to `root` unless they already start
/// with it (a relative `root` and paths built from it); the result must stay under
/// `root` and is rendered with `/` separators.
fn locate(root: &Path, path: &Path) -> Result<(PathBuf, String), SyncError> {
    let local = if path.is_absolute() || path.starts_with(root) {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    let outside = || SyncError::PathOutsideRoot {
        path: path.to_path_buf(),
        root: root.to_path_buf(),
    };
    let relative = local.strip_prefix(root).map_err(|_| outside())?;

    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }
    if parts.is_empty() {
        return Err(outside());
    }
    Ok((local, parts.join("/")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_relative_and_absolute() {
        let root = Path::new("/work/site");
        let (local, repo) = locate(root, Path::new("public/a.png")).unwrap();
        assert_eq!(local, PathBuf::from("/work/site/public/a.png"));
        assert_eq!(repo, "public/a.png");

        let (_, repo) = locate(root, Path::new("/work/site/src/pages/media.json")).unwrap();
        assert_eq!(repo, "src/pages/media.json");
    }

    #[test]
    fn locate_does_not_prefix_relative_root_twice() {
        let root = Path::new("site");
        let (local, repo) = locate(root, Path::new("site/public/a.png")).unwrap();
        assert_eq!(local, PathBuf::from("site/public/a.png"));
        assert_eq!(repo, "public/a.png");

        let (local, repo) = locate(root, Path::new("public/a.png")).unwrap();
        assert_eq!(local, PathBuf::from("site/public/a.png"));
        assert_eq!(repo, "public/a.png");
    }

    #[test]
    fn locate_rejects_escapes() {
        let root = Path::new("/work/site");
        for bad in ["/elsewhere/a.png", "../a.png", "/work/site"] {
            assert!(
                matches!(locate(root, Path::new(bad)), Err(SyncError::PathOutsideRoot { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn only_ref_update_conflicts_are_non_fast_forward() {
        let conflict = HostError::new(Step::RefUpdate, Some(422), "Update is not a fast forward");
        assert!(matches!(
            non_fast_forward("images", conflict),
            SyncError::NonFastForward { .. }
        ));
        let server = HostError::new(Step::RefUpdate, Some(500), "boom");
        assert!(matches!(non_fast_forward("images", server), SyncError::Host(_)));
    }
}
