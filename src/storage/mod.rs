//! Local durable and temporary storage.
//!
//! This module provides the storage layer for the print pipeline:
//!
//! - [`PrintLedger`]: append-only record of handled UIDs
//! - [`ArtifactStore`]: temporary HTML files and their retention sweep

mod artifacts;
mod ledger;

pub use artifacts::{
    dispatch_artifact_name, file_label, is_dispatch_artifact, remove_if_exists, ArtifactStore,
    SweepReport, DISPATCH_ARTIFACT_PREFIX, DISPATCH_ARTIFACT_SUFFIX, WORK_DIR_PREFIX,
};
pub use ledger::PrintLedger;

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A file or directory could not be created, read or written.
    #[error("{}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
