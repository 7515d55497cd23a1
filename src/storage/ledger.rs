//! Print dedup ledger.
//!
//! The ledger is a plain text file with one UID per line. It is only ever
//! appended to; lines are never rewritten, so a file written by any earlier
//! version stays readable. Reusing one ledger file for two different
//! mailboxes makes UIDs collide and messages get skipped.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{Result, StorageError};
use crate::domain::Uid;

/// Durable set of UIDs that have been handled.
#[derive(Debug)]
pub struct PrintLedger {
    path: PathBuf,
    known: HashSet<Uid>,
    file: File,
}

impl PrintLedger {
    /// Loads the existing entries and opens the file for appending.
    ///
    /// A missing or unreadable file loads as an empty ledger. Failing to
    /// open the file for appending is an error: without it no progress
    /// could ever be recorded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let known = Self::load(&path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;

        tracing::info!(path = %path.display(), entries = known.len(), "ledger loaded");
        Ok(Self { path, known, file })
    }

    /// Reads every recorded UID. Never fails.
    pub fn load(path: &Path) -> HashSet<Uid> {
        match std::fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(Uid::from)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ledger unreadable, starting empty");
                HashSet::new()
            }
        }
    }

    /// Returns whether `uid` has been handled.
    pub fn contains(&self, uid: &Uid) -> bool {
        self.known.contains(uid)
    }

    /// Marks `uid` as handled.
    ///
    /// The in-memory set is updated first, so the UID is skipped for the
    /// rest of this process's life even when the append fails.
    pub fn record(&mut self, uid: &Uid) -> Result<()> {
        if !self.known.insert(uid.clone()) {
            return Ok(());
        }
        let line = format!("{}\n", uid);
        self.file
            .write_all(line.as_bytes())
            .and_then(|()| self.file.sync_data())
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Number of recorded UIDs.
    pub fn len(&self) -> usize {
        self.known.len()
    }

    /// Returns whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_is_empty_and_gets_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("printed_uids.txt");

        let ledger = PrintLedger::open(&path).unwrap();
        assert!(ledger.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn record_appends_and_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printed_uids.txt");

        let mut ledger = PrintLedger::open(&path).unwrap();
        ledger.record(&Uid::from("11")).unwrap();
        ledger.record(&Uid::from("12")).unwrap();
        assert!(ledger.contains(&Uid::from("11")));
        drop(ledger);

        let reopened = PrintLedger::open(&path).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.contains(&Uid::from("12")));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "11\n12\n");
    }

    #[test]
    fn duplicate_record_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printed_uids.txt");

        let mut ledger = PrintLedger::open(&path).unwrap();
        ledger.record(&Uid::from("5")).unwrap();
        ledger.record(&Uid::from("5")).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "5\n");
    }

    #[test]
    fn load_tolerates_blank_lines_and_garbage_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printed_uids.txt");
        std::fs::write(&path, b"1\n\n  2  \n\xff\xfe\n3").unwrap();

        let known = PrintLedger::load(&path);
        assert!(known.contains(&Uid::from("1")));
        assert!(known.contains(&Uid::from("2")));
        assert!(known.contains(&Uid::from("3")));
        assert_eq!(known.len(), 4);
    }

    #[test]
    fn unopenable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending.
        let result = PrintLedger::open(dir.path());
        assert!(matches!(result, Err(StorageError::Io { .. })));
    }
}
