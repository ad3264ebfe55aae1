//! Storage error types

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying database error (connection, timeout, constraint other
    /// than the ones handled explicitly)
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Unique email constraint hit on registration
    #[error("email already registered")]
    DuplicateEmail,
}

impl StorageError {
    /// Classify a sqlx error from a user insert, surfacing the unique
    /// violation as its own variant.
    pub(crate) fn from_user_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return Self::DuplicateEmail;
            }
        }
        Self::Database(err)
    }
}
