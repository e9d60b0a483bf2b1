//! Error types for wkstats-store.

use std::path::PathBuf;

/// Result type for wkstats-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in wkstats-store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No history document exists yet. Callers that can start from an
    /// empty history should use `read_or_empty` instead of treating
    /// this as fatal.
    #[error("History document not found")]
    NotFound,

    /// The stored document could not be parsed.
    #[error("Stored history is corrupt: {0}")]
    Corrupt(serde_json::Error),

    /// Failed to serialize the document for writing.
    #[error("Serialization error: {0}")]
    Serialization(serde_json::Error),

    /// Failed to create the data directory.
    #[error("Failed to create data directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Another writer committed between our read and this write.
    #[error("Version conflict: expected {expected:?}, found {found:?}")]
    VersionConflict {
        expected: Option<u64>,
        found: Option<u64>,
    },

    /// Repeated version conflicts exhausted the update retries.
    #[error("Update contention: gave up after {attempts} attempts")]
    Contention { attempts: u32 },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
