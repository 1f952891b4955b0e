//! Store error types.

use std::sync::Arc;

use launchpad_fetch::RequestError;
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The fetch or mutation call failed.
    ///
    /// Shared because one coalesced fetch hands the same failure to every
    /// waiting reader.
    #[error("{0}")]
    Fetch(Arc<RequestError>),

    /// A key was read back as a different type than it was stored with.
    #[error("Cached value for {key} has a different type")]
    TypeMismatch {
        /// Display form of the key.
        key: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(Arc<serde_json::Error>),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Returns the request error behind a failed fetch or mutation.
    pub fn request(&self) -> Option<&RequestError> {
        match self {
            Self::Fetch(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Fetch(err) => err.is_transient(),
            Self::Io(_) => true,
            _ => false,
        }
    }
}

impl From<RequestError> for StoreError {
    fn from(err: RequestError) -> Self {
        Self::Fetch(Arc::new(err))
    }
}

impl From<Arc<RequestError>> for StoreError {
    fn from(err: Arc<RequestError>) -> Self {
        Self::Fetch(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(Arc::new(err))
    }
}
