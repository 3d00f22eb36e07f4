//! `mediapub.yaml` — per-working-tree configuration.
//!
//! # API pattern
//!
//! - [`Config::load_at`]: explicit file path; used in tests with `TempDir`
//! - [`Config::discover`]: searches `start` and its ancestors for
//!   [`CONFIG_FILE_NAME`]
//!
//! The directory holding the config file is the working tree root; relative
//! paths in the file resolve against it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "mediapub.yaml";

/// Parsed configuration plus the root it was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Owner of the upstream repository pull requests target.
    pub owner: String,
    pub repo: String,
    /// Owner of the repository holding `branch`; defaults to `owner`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head_owner: Option<String>,
    /// Branch that receives the synchronized commit.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Pull request base branch.
    #[serde(default = "default_base")]
    pub base: String,
    #[serde(default = "default_ledger")]
    pub ledger: PathBuf,
    /// Name of the directory that contains `public/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_parent: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(skip)]
    root: PathBuf,
}

fn default_branch() -> String {
    "images".to_string()
}
fn default_base() -> String {
    "master".to_string()
}
fn default_ledger() -> PathBuf {
    PathBuf::from("src/pages/media.json")
}
fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "MEDIAPUB_TOKEN".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load the config file at `path`.
    ///
    /// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
    /// path + line context from serde_yaml) if malformed.
    pub fn load_at(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.root = absolute_parent(path)?;
        Ok(config)
    }

    /// Load the nearest [`CONFIG_FILE_NAME`] in `start` or any ancestor.
    pub fn discover(start: &Path) -> Result<Self, ConfigError> {
        match start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
        {
            Some(path) => Self::load_at(&path),
            None => Err(ConfigError::NotFound {
                path: start.join(CONFIG_FILE_NAME),
            }),
        }
    }

    /// Working tree root (the directory holding the config file).
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.root.join(&self.ledger)
    }

    /// Owner of the repository the synchronizer pushes to.
    pub fn head_owner(&self) -> &str {
        self.head_owner.as_deref().unwrap_or(&self.owner)
    }

    /// `<head_owner>:<branch>`, the head qualifier pull requests are opened from.
    pub fn head_ref(&self) -> String {
        format!("{}:{}", self.head_owner(), self.branch)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Directory holding `path`, made absolute against the current directory.
fn absolute_parent(path: &Path) -> Result<PathBuf, ConfigError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    match parent {
        Some(dir) if dir.is_absolute() => Ok(dir.to_path_buf()),
        _ => {
            let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(match parent {
                Some(dir) if dir != Path::new(".") => cwd.join(dir),
                _ => cwd,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_fill_optional_keys() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "owner: kek\nrepo: site\n").unwrap();

        let config = Config::load_at(&path).unwrap();
        assert_eq!(config.branch, "images");
        assert_eq!(config.base, "master");
        assert_eq!(config.token_env, "MEDIAPUB_TOKEN");
        assert_eq!(config.head_ref(), "kek:images");
        assert_eq!(config.root(), tmp.path());
        assert_eq!(config.ledger_path(), tmp.path().join("src/pages/media.json"));
    }

    #[test]
    fn fork_owner_qualifies_head() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "owner: kek\nrepo: site\nhead_owner: fork\nbranch: drops\n").unwrap();
        let config = Config::load_at(&path).unwrap();
        assert_eq!(config.head_owner(), "fork");
        assert_eq!(config.head_ref(), "fork:drops");
    }

    #[test]
    fn missing_repo_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "owner: kek\n").unwrap();
        assert!(matches!(Config::load_at(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn relative_config_path_yields_absolute_root() {
        let tmp = TempDir::new_in(".").unwrap();
        let name = tmp.path().file_name().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "owner: a\nrepo: b\n").unwrap();

        let relative = Path::new(name).join(CONFIG_FILE_NAME);
        let config = Config::load_at(&relative).unwrap();
        assert!(config.root().is_absolute());
        assert_eq!(config.root(), std::env::current_dir().unwrap().join(name));
        assert!(config.ledger_path().is_absolute());
    }

    #[test]
    fn discover_walks_up_from_subdirectory() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE_NAME), "owner: a\nrepo: b\n").unwrap();
        let nested = tmp.path().join("src").join("pages");
        std::fs::create_dir_all(&nested).unwrap();

        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.root(), tmp.path());
    }

    #[test]
    fn discover_without_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            Config::discover(tmp.path()),
            Err(ConfigError::NotFound { .. })
        ));
    }
}
