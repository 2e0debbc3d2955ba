//! Error types for the podindex pipeline.

use thiserror::Error;

/// Errors that can occur during an index run.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Storage error: {0}")]
    Storage(String),

    /// A chunk query still failed after all retries; the run is aborted.
    #[error("Range query failed for blocks [{from}, {to}]: {reason}")]
    RangeQueryFailure { from: u64, to: u64, reason: String },

    /// The resume point could not be read from the store.
    #[error("Cursor unavailable: {0}")]
    CursorUnavailable(String),

    /// Indexed events could not be written to the store.
    #[error("Insert failed for {count} events: {reason}")]
    InsertFailure { count: usize, reason: String },

    #[error("Malformed log at block {block_number}: missing argument '{arg}'")]
    MalformedLog { block_number: u64, arg: String },

    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("Run deadline of {ms}ms exceeded")]
    DeadlineExceeded { ms: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    /// Returns `true` if the error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Rpc(_) | Self::Timeout { .. })
    }
}
