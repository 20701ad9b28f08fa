//! Durable movement ledger backing undo.
//!
//! A single JSON object mapping destination path to original path. The
//! destination is the key: undo starts from a file's current, post-move
//! location, and a file is moved to at most one place without being moved
//! back. Every mutation is a whole-file read-modify-write; concurrent
//! writers are not supported, single-writer discipline is the caller's
//! responsibility.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One recorded move: where a file came from and where it sits now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementRecord {
    pub original: PathBuf,
    pub dest: PathBuf,
}

/// Append/query/remove store of destination-to-original move records.
pub struct MovementLedger {
    path: PathBuf,
}

impl MovementLedger {
    /// Creates a ledger backed by the given file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full ledger state. A missing file is an empty ledger; an unreadable
    /// or unparsable one is a persistence error.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: format!("JSON parse error: {e}"),
        })
    }

    /// Upserts a record for a completed move and rewrites the store.
    pub fn record(&self, original: &Path, dest: &Path) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(
            dest.to_string_lossy().into_owned(),
            original.to_string_lossy().into_owned(),
        );
        self.persist(&entries)
    }

    /// Every record whose original path contains `query` as a substring.
    ///
    /// Substring matching is what lets "undo everything under a directory"
    /// work without exact path input.
    pub fn find_by_original(&self, query: &str) -> Result<Vec<MovementRecord>> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|(_, original)| original.contains(query))
            .map(|(dest, original)| MovementRecord {
                original: PathBuf::from(original),
                dest: PathBuf::from(dest),
            })
            .collect())
    }

    /// Drops the record keyed by `dest` after a successful undo.
    pub fn remove(&self, dest: &Path) -> Result<()> {
        let mut entries = self.load()?;
        entries.remove(dest.to_string_lossy().as_ref());
        self.persist(&entries)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&self.path, json).map_err(|e| Error::Persistence {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ledger_in(dir: &TempDir) -> MovementLedger {
        MovementLedger::new(dir.path().join("ledger.json"))
    }

    #[test]
    fn test_record_find_remove_round_trip() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let ledger = ledger_in(&dir);

        let original = Path::new("/data/inbox/a.jpg");
        let dest = Path::new("/data/inbox/Images/a.jpg");
        ledger.record(original, dest).expect("record");

        let found = ledger.find_by_original("/data/inbox/a.jpg").expect("find");
        assert_eq!(
            found,
            vec![MovementRecord {
                original: original.to_path_buf(),
                dest: dest.to_path_buf(),
            }]
        );

        ledger.remove(dest).expect("remove");
        assert!(
            ledger
                .find_by_original("/data/inbox/a.jpg")
                .expect("find after remove")
                .is_empty()
        );
    }

    #[test]
    fn test_substring_query_matches_directory_prefix() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let ledger = ledger_in(&dir);

        ledger
            .record(Path::new("/data/inbox/a.jpg"), Path::new("/x/a.jpg"))
            .expect("record a");
        ledger
            .record(Path::new("/data/inbox/b.txt"), Path::new("/x/b.txt"))
            .expect("record b");
        ledger
            .record(Path::new("/data/outbox/c.txt"), Path::new("/x/c.txt"))
            .expect("record c");

        let found = ledger.find_by_original("/data/inbox").expect("find");
        assert_eq!(found.len(), 2);
        assert!(ledger.find_by_original("nowhere").expect("find").is_empty());
    }

    #[test]
    fn test_record_is_upsert_on_destination() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let ledger = ledger_in(&dir);

        let dest = Path::new("/x/Images/a.jpg");
        ledger.record(Path::new("/old/a.jpg"), dest).expect("record");
        ledger.record(Path::new("/new/a.jpg"), dest).expect("re-record");

        let entries = ledger.load().expect("load");
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries.get("/x/Images/a.jpg"),
            Some(&"/new/a.jpg".to_string())
        );
    }

    #[test]
    fn test_ledger_survives_reopen() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("ledger.json");

        MovementLedger::new(path.clone())
            .record(Path::new("/a"), Path::new("/b"))
            .expect("record");

        let reopened = MovementLedger::new(path);
        assert_eq!(reopened.find_by_original("/a").expect("find").len(), 1);
    }

    #[test]
    fn test_corrupted_ledger_is_persistence_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{ truncated").expect("write garbage");

        let ledger = MovementLedger::new(path);
        assert!(matches!(ledger.load(), Err(Error::Persistence { .. })));
        assert!(matches!(
            ledger.record(Path::new("/a"), Path::new("/b")),
            Err(Error::Persistence { .. })
        ));
    }

    #[test]
    fn test_remove_missing_entry_is_a_no_op() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let ledger = ledger_in(&dir);
        ledger.remove(Path::new("/never/recorded")).expect("remove");
        assert!(ledger.load().expect("load").is_empty());
    }
}
