use thiserror::Error;

use super::Table;

/// Failure reported by a storage backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The operation may succeed if run again (lost connection, serialization conflict, ...)
    #[error("transient storage error: {0}")]
    Transient(String),

    #[error("storage error: {0}")]
    Permanent(String),
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient(_))
    }
}

/// Failure to durably record a client operation
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("writing {table} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        table: Table,
        attempts: u32,
        #[source]
        source: StorageError,
    },

    #[error("writing {table} failed: {source}")]
    Permanent {
        table: Table,
        #[source]
        source: StorageError,
    },
}
