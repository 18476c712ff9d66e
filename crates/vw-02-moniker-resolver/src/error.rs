//! Error types for the Moniker Resolver subsystem

use thiserror::Error;
use vw_01_block_source::BlockSourceError;

/// Moniker resolution errors
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Underlying RPC failure.
    #[error("RPC failure: {0}")]
    Rpc(#[from] BlockSourceError),

    /// Genesis file could not be read.
    #[error("Failed to read genesis file {path}: {source}")]
    GenesisFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Document did not have the expected shape.
    #[error("Malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    /// Active validator set could not be obtained; the previous map is kept.
    #[error("Active validator set unavailable: {0}")]
    ActiveSetUnavailable(String),
}

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, ResolverError>;
