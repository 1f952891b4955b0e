//! Core error types for Launchpad.

use thiserror::Error;

/// Core error type for Launchpad operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A query key could not be built.
    #[error("Invalid query key: {0}")]
    InvalidKey(String),

    /// Invalid data in a request or response body.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
