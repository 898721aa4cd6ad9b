//! Engine Error Types

use crate::storage::error::StorageError;
use thiserror::Error;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced to engine callers
///
/// Most failures inside a job are isolated and logged rather than
/// returned; these variants cover the paths where the caller itself must
/// know the operation did not happen.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage operation failed: {source}")]
    Storage {
        #[from]
        source: StorageError,
    },

    #[error("job supervisor failed: {message}")]
    Supervisor { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_conversion() {
        let storage_err = StorageError::NotFound {
            entity: "job",
            id: 3,
        };
        let engine_err: EngineError = storage_err.into();
        assert!(engine_err.to_string().contains("record not found"));
    }
}
