//! Append-only metadata ledger.
//!
//! # Storage layout
//!
//! A single pretty-printed JSON array of [`MetadataRecord`]s:
//!
//! ```text
//! [
//!   {
//!     "id": "5b0c6a6e-...",
//!     "tags": ["frog", "happy"],
//!     "extension": "png"
//!   }
//! ]
//! ```
//!
//! # Append protocol
//!
//! 1. Acquire `<ledger>.lock` (created exclusively, removed on drop).
//! 2. Load and parse the full document → `MalformedLedger` on failure.
//! 3. Validate the candidate record → `MalformedRecord` on failure.
//! 4. Splice the record in at a uniformly random index in `[0, len]`.
//! 5. Serialize the whole document, write `<ledger>.tmp`, rename over the
//!    ledger.
//!
//! Record order carries no meaning; readers must not depend on it.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use rand::Rng;

use crate::error::{ledger_io, LedgerError};
use crate::types::MetadataRecord;

const LOCK_ATTEMPTS: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(20);

/// Handle to a ledger document on disk. Holds no cached state.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing document reads as an empty ledger.
    pub fn load(&self) -> Result<Vec<MetadataRecord>, LedgerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(&self.path).map_err(|e| ledger_io(&self.path, e))?;
        serde_json::from_str(&contents).map_err(|source| LedgerError::MalformedLedger {
            path: self.path.clone(),
            source,
        })
    }

    /// Insert `record` at a random position using the thread RNG.
    pub fn append(&self, record: MetadataRecord) -> Result<(), LedgerError> {
        self.append_with_rng(record, &mut rand::thread_rng())
    }

    /// Insert `record` at a position drawn from `rng`, uniform over `[0, len]`.
    pub fn append_with_rng<R: Rng>(
        &self,
        record: MetadataRecord,
        rng: &mut R,
    ) -> Result<(), LedgerError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| ledger_io(dir, e))?;
        }
        let _lock = LedgerLock::acquire(&self.path)?;

        let mut records = self.load()?;
        record.validate()?;

        let index = rng.gen_range(0..=records.len());
        tracing::debug!("inserting record {} at index {index} of {}", record.id, records.len());
        records.insert(index, record);

        let json = serde_json::to_string_pretty(&records)?;
        self.write_atomic(&json)?;
        tracing::info!("ledger {} now holds {} records", self.path.display(), records.len());
        Ok(())
    }

    fn write_atomic(&self, contents: &str) -> Result<(), LedgerError> {
        let tmp = sibling(&self.path, "tmp");
        std::fs::write(&tmp, contents).map_err(|e| ledger_io(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(ledger_io(&self.path, e));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Lock file
// ---------------------------------------------------------------------------

/// Exclusive `<ledger>.lock` marker, removed when dropped.
#[derive(Debug)]
struct LedgerLock {
    path: PathBuf,
}

impl LedgerLock {
    fn acquire(ledger: &Path) -> Result<Self, LedgerError> {
        let path = sibling(ledger, "lock");
        for _ in 0..LOCK_ATTEMPTS {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let _ = writeln!(file, "{}", std::process::id());
                    return Ok(Self { path });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => sleep(LOCK_RETRY_DELAY),
                Err(e) => return Err(ledger_io(&path, e)),
            }
        }
        Err(LedgerError::Locked { path })
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    fn record(id: &str) -> MetadataRecord {
        MetadataRecord::new(id, vec!["frog".into(), "happy".into()], "png")
    }

    #[test]
    fn missing_document_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::new(tmp.path().join("media.json"));
        assert!(ledger.load().unwrap().is_empty());
    }

    #[test]
    fn append_creates_document_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pages").join("media.json");
        let ledger = Ledger::new(&path);
        ledger.append(record("a")).unwrap();

        assert_eq!(ledger.load().unwrap(), vec![record("a")]);
        assert!(!sibling(&path, "tmp").exists(), "tmp must be gone after rename");
        assert!(!sibling(&path, "lock").exists(), "lock must be released");
    }

    #[test]
    fn document_is_pretty_printed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("media.json");
        Ledger::new(&path).append(record("a")).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"id\": \"a\""), "got: {text}");
    }

    #[test]
    fn every_append_lands_exactly_once() {
        let tmp = TempDir::new().unwrap();
        let ledger = Ledger::new(tmp.path().join("media.json"));

        let mut rng = StdRng::seed_from_u64(7);
        for i in 0..40 {
            ledger.append_with_rng(record(&format!("r{i}")), &mut rng).unwrap();
        }
        let mut ids: Vec<_> = ledger.load().unwrap().into_iter().map(|r| r.id.0).collect();
        ids.sort();
        let mut expected: Vec<_> = (0..40).map(|i| format!("r{i}")).collect();
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[test]
    fn insertion_reaches_both_ends() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("media.json");
        let ledger = Ledger::new(&path);
        let seed = serde_json::to_string_pretty(&vec![record("a"), record("b")]).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut positions = std::collections::BTreeSet::new();
        for _ in 0..60 {
            std::fs::write(&path, &seed).unwrap();
            ledger.append_with_rng(record("new"), &mut rng).unwrap();

            let ids: Vec<_> = ledger.load().unwrap().into_iter().map(|r| r.id.0).collect();
            let at = ids.iter().position(|id| id == "new").unwrap();
            let mut rest = ids.clone();
            rest.remove(at);
            assert_eq!(rest, vec!["a", "b"], "existing order is preserved");
            positions.insert(at);
        }
        assert_eq!(positions.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn unknown_keys_in_existing_records_are_kept() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("media.json");
        std::fs::write(
            &path,
            r#"[{"id":"old","tags":["aa","bb"],"extension":"gif","caption":"keep me"}]"#,
        )
        .unwrap();

        Ledger::new(&path).append(record("a")).unwrap();
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let old = doc
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["id"] == "old")
            .unwrap();
        assert_eq!(old["caption"], "keep me");
    }

    #[test]
    fn held_lock_reports_locked() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("media.json");
        std::fs::write(sibling(&path, "lock"), "999").unwrap();
        let err = Ledger::new(&path).append(record("a")).unwrap_err();
        assert!(matches!(err, LedgerError::Locked { .. }));
        assert!(!path.exists());
    }
}
