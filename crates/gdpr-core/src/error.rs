//! Error types for export and erasure operations.
//!
//! Every error maps to a stable code and to a process exit code so that
//! callers can tell caller misuse from store outages and local I/O
//! problems without parsing messages.

use crate::exit_codes::ExitCode;
use gdpr_bundle::BundleError;
use gdpr_common::DataAccessError;
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the export and erasure workflow.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Data access errors (20-29)
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),

    // Bundle errors (30-39)
    #[error(transparent)]
    Bundle(#[from] BundleError),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Stable error code, grouped by range:
    /// - 10-19: configuration and caller errors
    /// - 20-29: record store and directory errors
    /// - 30-39: bundle assembly and packaging errors
    /// - 60-69: local I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidArgument(_) => 11,
            Error::DataAccess(DataAccessError::AccountNotFound(_)) => 20,
            Error::DataAccess(_) => 21,
            Error::Bundle(BundleError::Setup { .. }) | Error::Bundle(BundleError::Profile(_)) => 30,
            Error::Bundle(BundleError::Collection { .. })
            | Error::Bundle(BundleError::TaskPanicked(_)) => 31,
            Error::Bundle(BundleError::Packaging { .. }) => 32,
            Error::Bundle(BundleError::NotAnArchive(_)) => 33,
            Error::Bundle(_) => 39,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::Config(_) => ExitCode::ConfigError,
            Error::InvalidArgument(_) | Error::Bundle(BundleError::NotAnArchive(_)) => {
                ExitCode::ArgsError
            }
            Error::DataAccess(DataAccessError::AccountNotFound(_)) => ExitCode::NotFound,
            Error::DataAccess(_)
            | Error::Bundle(BundleError::Collection { .. })
            | Error::Bundle(BundleError::Profile(_)) => ExitCode::StoreError,
            Error::Bundle(_) | Error::Io(_) => ExitCode::IoError,
            Error::Json(_) => ExitCode::InternalError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdpr_common::RecordCategory;

    #[test]
    fn test_codes_by_range() {
        assert_eq!(Error::Config("x".into()).code(), 10);
        assert_eq!(Error::InvalidArgument("x".into()).code(), 11);
        assert_eq!(
            Error::from(DataAccessError::AccountNotFound("jdoe".into())).code(),
            20
        );
        assert_eq!(
            Error::from(BundleError::Collection {
                category: RecordCategory::Geodocs,
                source: DataAccessError::Unavailable("down".into()),
            })
            .code(),
            31
        );
        assert_eq!(
            Error::from(std::io::Error::new(std::io::ErrorKind::Other, "x")).code(),
            60
        );
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            Error::InvalidArgument("x".into()).exit_code(),
            ExitCode::ArgsError
        );
        assert_eq!(
            Error::from(DataAccessError::Unavailable("down".into())).exit_code(),
            ExitCode::StoreError
        );
        assert_eq!(
            Error::from(DataAccessError::AccountNotFound("jdoe".into())).exit_code(),
            ExitCode::NotFound
        );
    }

    #[test]
    fn test_transparent_messages() {
        let err = Error::from(DataAccessError::AccountNotFound("jdoe".into()));
        assert_eq!(err.to_string(), "account not found: jdoe");
    }
}
