//! Error types for the Block Source subsystem

use shared_types::Height;
use thiserror::Error;

/// Block source errors. All of them are transient from the caller's view.
#[derive(Debug, Error)]
pub enum BlockSourceError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Body could not be decoded into the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The node does not (yet) have the requested block.
    #[error("Block {height} not available")]
    Unavailable { height: Height },
}

/// Result type for block source operations
pub type BlockSourceResult<T> = Result<T, BlockSourceError>;
