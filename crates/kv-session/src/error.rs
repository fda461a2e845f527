//! Session store error types.

use thiserror::Error;

/// Errors that can occur when reading or writing session data.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Failed to open the backing store.
    #[error("Failed to open store: {0}")]
    OpenError(String),

    /// Failed to serialize or deserialize a value.
    #[error("Serialization error: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// Failed to perform store operation.
    #[error("Store operation failed: {0}")]
    StoreError(String),

    /// Malformed dotted key path.
    #[error("Invalid key path: {0:?}")]
    InvalidPath(String),
}
