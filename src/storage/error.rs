//! Storage Error Types

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by storage collaborators
///
/// The engine treats storage failures as non-fatal: they are logged and
/// the job continues, mirroring the per-plugin isolation policy.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StorageError {
    #[error("record not found: {entity} id {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("conflicting write on {entity} id {id}: {reason}")]
    Conflict {
        entity: &'static str,
        id: i64,
        reason: String,
    },

    #[error("storage backend failure: {message}")]
    Backend { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::NotFound {
            entity: "job",
            id: 42,
        };
        assert_eq!(err.to_string(), "record not found: job id 42");

        let err = StorageError::Backend {
            message: "disk full".to_string(),
        };
        assert!(err.to_string().contains("disk full"));
    }
}
