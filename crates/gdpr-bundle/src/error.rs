//! Error types for bundle operations.

use gdpr_common::{DataAccessError, RecordCategory};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while assembling, packing or reading a bundle.
#[derive(Error, Debug)]
pub enum BundleError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// ZIP archive error
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A staging location or output sink could not be created
    #[error("cannot prepare '{}': {source}", .path.display())]
    Setup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The account profile could not be rendered
    #[error("profile rendering failed: {0}")]
    Profile(#[source] DataAccessError),

    /// The record source failed for one category
    #[error("collecting {category} records failed: {source}")]
    Collection {
        category: RecordCategory,
        #[source]
        source: DataAccessError,
    },

    /// A collection task panicked
    #[error("collection task for {0} records panicked")]
    TaskPanicked(RecordCategory),

    /// The staging tree could not be compressed
    #[error("cannot pack '{}': {reason}", .path.display())]
    Packaging { path: PathBuf, reason: String },

    /// File exists but is not a readable archive
    #[error("not a ZIP archive: {}", .0.display())]
    NotAnArchive(PathBuf),

    /// Entry not found in archive
    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),
}

impl BundleError {
    pub fn setup(path: &Path, source: std::io::Error) -> Self {
        BundleError::Setup {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, BundleError>;
