//! Temporary artifact store.
//!
//! Two kinds of files end up on disk while printing:
//!
//! - Tracked artifacts, written here before printing. They live in a
//!   directory private to this process and are named after the subject so
//!   an operator can tell them apart.
//! - Dispatcher artifacts (`print_<hex>.html` directly in the temp root),
//!   written by the print dispatcher with the print trigger injected. These
//!   are not tracked; the sweep finds them by name.
//!
//! Every delete here tolerates the file already being gone, because the
//! sweep and the dispatcher may race on the same dispatcher artifact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{Result, StorageError};

/// File name prefix of dispatcher artifacts.
pub const DISPATCH_ARTIFACT_PREFIX: &str = "print_";

/// File name suffix of dispatcher artifacts.
pub const DISPATCH_ARTIFACT_SUFFIX: &str = ".html";

/// Name prefix of the per-process tracked artifact directories.
pub const WORK_DIR_PREFIX: &str = "autoprint-jobs-";

const MAX_LABEL_CHARS: usize = 40;
const FALLBACK_LABEL: &str = "AutoPrint";

/// Returns a fresh, unique dispatcher artifact file name.
pub fn dispatch_artifact_name() -> String {
    format!(
        "{}{}{}",
        DISPATCH_ARTIFACT_PREFIX,
        uuid::Uuid::new_v4().simple(),
        DISPATCH_ARTIFACT_SUFFIX
    )
}

/// Returns whether `name` follows the dispatcher artifact naming pattern.
pub fn is_dispatch_artifact(name: &str) -> bool {
    name.starts_with(DISPATCH_ARTIFACT_PREFIX) && name.ends_with(DISPATCH_ARTIFACT_SUFFIX)
}

/// Removes a file, treating "already gone" as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "could not remove artifact");
            false
        }
    }
}

/// Readable file name stem for a subject.
///
/// Keeps alphanumerics, spaces, hyphens and underscores, capped at 40
/// characters.
pub fn file_label(subject: &str) -> String {
    let label: String = subject
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .take(MAX_LABEL_CHARS)
        .collect();
    if label.is_empty() {
        FALLBACK_LABEL.to_string()
    } else {
        label
    }
}

/// Result of a retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Tracked artifacts removed.
    pub tracked_removed: usize,
    /// Dispatcher artifacts removed from the temp root.
    pub orphans_removed: usize,
    /// Files removed from work directories of processes that are gone.
    pub abandoned_removed: usize,
}

impl SweepReport {
    /// Total files removed.
    pub fn total(&self) -> usize {
        self.tracked_removed + self.orphans_removed + self.abandoned_removed
    }
}

/// Creates and cleans up printable artifacts.
#[derive(Debug)]
pub struct ArtifactStore {
    temp_root: PathBuf,
    work_dir: PathBuf,
    tracked: HashMap<PathBuf, SystemTime>,
}

impl ArtifactStore {
    /// Creates the store's private directory under `temp_root`.
    pub fn new(temp_root: impl Into<PathBuf>) -> Result<Self> {
        let temp_root = temp_root.into();
        let work_dir = temp_root.join(format!("{}{}", WORK_DIR_PREFIX, std::process::id()));
        std::fs::create_dir_all(&work_dir).map_err(|source| StorageError::Io {
            path: work_dir.clone(),
            source,
        })?;

        Ok(Self {
            temp_root,
            work_dir,
            tracked: HashMap::new(),
        })
    }

    /// Writes `html` to a new tracked artifact named after `subject`.
    pub fn write(&mut self, subject: &str, html: &str) -> Result<PathBuf> {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let file_name = format!("{}_{}.html", file_label(subject), &suffix[..8]);
        let path = self.work_dir.join(file_name);

        // Another process's sweep may have removed the directory while empty.
        std::fs::create_dir_all(&self.work_dir).map_err(|source| StorageError::Io {
            path: self.work_dir.clone(),
            source,
        })?;
        std::fs::write(&path, html).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;
        self.tracked.insert(path.clone(), SystemTime::now());
        tracing::debug!(path = %path.display(), "artifact written");
        Ok(path)
    }

    /// Removes tracked artifacts and dispatcher artifacts older than
    /// `retention`.
    ///
    /// A retention too large to subtract from the current time removes
    /// nothing.
    pub fn sweep(&mut self, retention: Duration) -> SweepReport {
        let mut report = SweepReport::default();
        let Some(cutoff) = SystemTime::now().checked_sub(retention) else {
            return report;
        };

        let expired: Vec<PathBuf> = self
            .tracked
            .iter()
            .filter(|(_, created_at)| **created_at <= cutoff)
            .map(|(path, _)| path.clone())
            .collect();
        for path in expired {
            remove_if_exists(&path);
            self.tracked.remove(&path);
            report.tracked_removed += 1;
        }

        report.orphans_removed = self.remove_dispatch_artifacts(Some(cutoff));
        report.abandoned_removed = self.remove_abandoned_work_dirs(cutoff);

        if report.total() > 0 {
            tracing::info!(
                tracked = report.tracked_removed,
                orphans = report.orphans_removed,
                abandoned = report.abandoned_removed,
                "swept old artifacts"
            );
        }
        report
    }

    /// Removes every tracked and dispatcher artifact, and the private
    /// directory. Used at shutdown.
    pub fn purge_all(&mut self) -> usize {
        let mut removed = 0;
        for (path, _) in self.tracked.drain() {
            if remove_if_exists(&path) {
                removed += 1;
            }
        }
        removed += self.remove_dispatch_artifacts(None);

        if let Err(e) = std::fs::remove_dir_all(&self.work_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(dir = %self.work_dir.display(), error = %e, "could not remove work dir");
            }
        }
        removed
    }

    /// Number of tracked artifacts still on record.
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Directory scanned for dispatcher artifacts.
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Private directory for tracked artifacts.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Removes files older than `cutoff` from other processes' work
    /// directories, and each such directory once it is empty.
    ///
    /// A crashed or killed process never purges its own directory, so its
    /// tracked artifacts would otherwise outlive the retention window.
    fn remove_abandoned_work_dirs(&self, cutoff: SystemTime) -> usize {
        let Ok(entries) = std::fs::read_dir(&self.temp_root) else {
            return 0;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let dir = entry.path();
            let is_work_dir = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.starts_with(WORK_DIR_PREFIX));
            if !is_work_dir || dir == self.work_dir || !dir.is_dir() {
                continue;
            }

            let Ok(files) = std::fs::read_dir(&dir) else {
                continue;
            };
            for file in files.flatten() {
                let expired = file
                    .metadata()
                    .and_then(|m| m.modified())
                    .is_ok_and(|modified| modified <= cutoff);
                if expired && remove_if_exists(&file.path()) {
                    removed += 1;
                }
            }
            // Only succeeds once the directory is empty.
            if std::fs::remove_dir(&dir).is_ok() {
                tracing::debug!(dir = %dir.display(), "removed abandoned work dir");
            }
        }
        removed
    }

    /// Removes dispatcher artifacts last modified at or before `cutoff`
    /// (all of them when `cutoff` is `None`).
    fn remove_dispatch_artifacts(&self, cutoff: Option<SystemTime>) -> usize {
        let entries = match std::fs::read_dir(&self.temp_root) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %self.temp_root.display(), error = %e, "cannot scan temp root");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !is_dispatch_artifact(name) {
                continue;
            }
            if let Some(cutoff) = cutoff {
                let modified = entry.metadata().and_then(|m| m.modified());
                match modified {
                    Ok(modified) if modified <= cutoff => {}
                    _ => continue,
                }
            }
            if remove_if_exists(&entry.path()) {
                removed += 1;
            }
        }
        removed
    }
}
