//! Publish-directory discovery and collision-free file moves.
//!
//! The publish directory is resolved once (see [`find_publish_dir`]) and held
//! by a [`Relocator`]; every [`Relocator::relocate`] call then moves a single
//! file into it under a fresh UUID v4 name, keeping the lower-cased
//! extension.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{relocate_io, RelocateError};

/// Name of the directory media files are published into.
pub const PUBLIC_DIR_NAME: &str = "public";

const NAME_ATTEMPTS: u32 = 8;

/// Directories never descended into while looking for `public/`.
const SKIPPED_DIRS: &[&str] = &["node_modules", "target"];

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// Walk the working tree under `root` for a `public` directory.
///
/// With `parent_name`, only a `public` directory whose immediate parent is
/// named `parent_name` matches. Hidden directories, `node_modules` and
/// `target` are skipped. Traversal order is by file name, so the result is
/// deterministic.
pub fn find_publish_dir(root: &Path, parent_name: Option<&str>) -> Result<PathBuf, RelocateError> {
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e.file_name().to_string_lossy().as_ref()));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_dir() || entry.file_name() != PUBLIC_DIR_NAME {
            continue;
        }
        let parent_matches = match parent_name {
            None => true,
            Some(name) => entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|p| p == name),
        };
        if parent_matches {
            tracing::debug!("publish directory: {}", entry.path().display());
            return Ok(entry.into_path());
        }
    }

    let name = match parent_name {
        Some(parent) => format!("{parent}/{PUBLIC_DIR_NAME}"),
        None => PUBLIC_DIR_NAME.to_string(),
    };
    Err(RelocateError::PublishDirectoryNotFound {
        root: root.to_path_buf(),
        name,
    })
}

fn is_skipped(name: &str) -> bool {
    name.starts_with('.') || SKIPPED_DIRS.contains(&name)
}

// ---------------------------------------------------------------------------
// Relocator
// ---------------------------------------------------------------------------

/// Moves files into a resolved publish directory.
#[derive(Debug, Clone)]
pub struct Relocator {
    publish_dir: PathBuf,
}

impl Relocator {
    /// Use `publish_dir` as-is. It must already exist.
    pub fn new(publish_dir: impl Into<PathBuf>) -> Result<Self, RelocateError> {
        let publish_dir = publish_dir.into();
        if !publish_dir.is_dir() {
            return Err(RelocateError::PublishDirectoryNotFound {
                name: publish_dir.display().to_string(),
                root: publish_dir,
            });
        }
        Ok(Self { publish_dir })
    }

    /// Resolve the publish directory under `root` once, see [`find_publish_dir`].
    pub fn discover(root: &Path, parent_name: Option<&str>) -> Result<Self, RelocateError> {
        find_publish_dir(root, parent_name).map(|publish_dir| Self { publish_dir })
    }

    pub fn publish_dir(&self) -> &Path {
        &self.publish_dir
    }

    /// Every regular file under the publish directory, hidden entries
    /// excluded, in file-name order.
    pub fn published_files(&self) -> Result<Vec<PathBuf>, RelocateError> {
        let walker = WalkDir::new(&self.publish_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'));

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.publish_dir).to_path_buf();
                relocate_io(path, e.into())
            })?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Move `source` into the publish directory under a fresh random name.
    ///
    /// Returns the new path. `source` no longer exists afterwards.
    pub fn relocate(&self, source: &Path) -> Result<PathBuf, RelocateError> {
        if !source.is_file() {
            return Err(RelocateError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| RelocateError::MissingExtension {
                path: source.to_path_buf(),
            })?;

        let target = self.free_name(&extension)?;
        move_file(source, &target)?;
        tracing::info!("moved {} -> {}", source.display(), target.display());
        Ok(target)
    }

    fn free_name(&self, extension: &str) -> Result<PathBuf, RelocateError> {
        for _ in 0..NAME_ATTEMPTS {
            let candidate = self
                .publish_dir
                .join(format!("{}.{extension}", Uuid::new_v4()));
            if !candidate.exists() {
                return Ok(candidate);
            }
        }
        Err(RelocateError::NameExhausted {
            dir: self.publish_dir.clone(),
        })
    }
}

/// Rename, falling back to copy + remove when the rename crosses devices.
fn move_file(source: &Path, target: &Path) -> Result<(), RelocateError> {
    match std::fs::rename(source, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(relocate_io(source, e)),
        Err(e) => {
            tracing::debug!("rename failed ({e}); copying {}", source.display());
            if let Err(copy_err) = std::fs::copy(source, target) {
                let _ = std::fs::remove_file(target);
                return Err(relocate_io(target, copy_err));
            }
            std::fs::remove_file(source).map_err(|e| relocate_io(source, e))
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
