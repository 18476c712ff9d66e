//! Error types for the Participation Store subsystem

use thiserror::Error;

/// Participation store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite failure (open, schema, statement or transaction).
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Database directory could not be created.
    #[error("Failed to prepare database directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A chunk of an upsert batch failed; earlier chunks remain committed.
    #[error("Upsert chunk {chunk} of {chunks} failed after {committed_rows} committed rows: {source}")]
    ChunkFailed {
        chunk: usize,
        chunks: usize,
        committed_rows: usize,
        #[source]
        source: rusqlite::Error,
    },

    /// Stored value does not decode into the domain type.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A store call on the blocking pool panicked or was cancelled.
    #[error("Blocking store task failed: {0}")]
    Task(String),

    /// Parameter limit too small to hold a single row.
    #[error("max_bind_params {0} cannot hold one row of 6 columns")]
    BindLimitTooSmall(usize),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
