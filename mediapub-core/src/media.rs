//! Media file discovery.

use std::path::{Path, PathBuf};

use crate::error::{relocate_io, RelocateError};

/// Extensions (lower-case) accepted as publishable media.
pub const MEDIA_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "mp4", "avi"];

/// `true` when `path` has one of [`MEDIA_EXTENSIONS`], case-insensitively.
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|e| MEDIA_EXTENSIONS.contains(&e.as_str()))
}

/// Regular media files directly inside `dir`, sorted by path. Not recursive.
pub fn scan_dir(dir: &Path) -> Result<Vec<PathBuf>, RelocateError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| relocate_io(dir, e))?
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_media_file(p))
        .collect();
    files.sort();
    Ok(files)
}
