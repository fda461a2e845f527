//! Cart error types.

use kv_session::SessionError;
use thiserror::Error;

/// Errors that can occur in cart operations.
#[derive(Error, Debug)]
pub enum CartError {
    /// Missing or empty attribute path.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Item not in cart.
    #[error("Item not in cart: {0}")]
    ItemNotFound(String),

    /// Arithmetic on a value that is not an integer.
    #[error("Cart attribute is not numeric: {0}")]
    NotNumeric(String),

    /// Arithmetic overflow.
    #[error("Arithmetic overflow in cart totals")]
    Overflow,

    /// Invalid configuration.
    #[error("Invalid cart configuration: {0}")]
    Config(String),

    /// Session store error.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Stored cart record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
