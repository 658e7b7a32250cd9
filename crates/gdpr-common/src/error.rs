//! Errors raised by the record store and account directory.

use thiserror::Error;

/// Errors that can occur while reading from or deleting in the backing stores.
#[derive(Error, Debug)]
pub enum DataAccessError {
    /// No account with this uid exists in the directory.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The backing store could not be reached or refused the query.
    #[error("data store unavailable: {0}")]
    Unavailable(String),

    /// I/O error while reading the store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored content could not be decoded.
    #[error("malformed stored data: {0}")]
    Malformed(String),
}

/// Result type alias for data access operations.
pub type Result<T> = std::result::Result<T, DataAccessError>;
