//! Error types for gaze-store

use thiserror::Error;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A malformed or unrecognized resource reference.
    ///
    /// Rejected before any side effect takes place.
    #[error("Invalid resource reference: {0}")]
    InvalidReference(String),

    /// A write was rejected before touching storage, e.g. an item insert
    /// without a subject id.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// An error from the storage engine or the filesystem backing the
    /// image cache.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A classification batch could not be committed.
    ///
    /// Storage is left unchanged (the batch rolls back as a unit), but the
    /// condition is not recoverable from inside the store: continuing to
    /// classify after losing a finished classification is unsound, so the
    /// embedding application should treat this as fatal.
    #[error("Classification transaction failed: {0}")]
    TransactionFailed(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail() {
        let err = StoreError::InvalidReference("item/abc".into());
        assert!(err.to_string().contains("item/abc"));

        let err = StoreError::ConstraintViolation("item insert requires a subjectId".into());
        assert!(err.to_string().contains("subjectId"));
    }
}
