//! State driver errors

use thiserror::Error;

/// Errors that can occur when reading or writing persisted state
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists under the requested key
    #[error("state key not found: {0}")]
    KeyNotFound(String),

    /// The backing store failed (connection, quorum, disk, ...)
    #[error("state backend error: {0}")]
    Backend(String),
}
