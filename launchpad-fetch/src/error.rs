//! Request and credential error types.

use reqwest::StatusCode;
use thiserror::Error;

// ============================================================================
// Request Error
// ============================================================================

/// Error type for gateway and streaming calls.
///
/// Callers get enough to show either a generic failure or the server's own
/// message, without having to know anything about the transport.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Transport failure before any response arrived (DNS, refused, timeout),
    /// or a transport failure in the middle of a streamed body.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The server answered with a failure status.
    #[error("HTTP {status}: {message}")]
    Http {
        /// Response status code.
        status: u16,
        /// Message from the `message`/`detail` field, or `"HTTP <status>"`.
        message: String,
    },

    /// A body was present but was not the JSON we expected.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The base URL or endpoint could not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request was rejected locally before being sent.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// The caller cancelled the call.
    #[error("Request cancelled")]
    Cancelled,
}

impl RequestError {
    /// Builds an HTTP error from a status and message.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http {
            status: status.as_u16(),
            message: message.into(),
        }
    }

    /// Returns the HTTP status, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true for 401/403, the visible symptom of a degraded credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// Returns true if the same call might succeed later.
    ///
    /// This layer never retries on its own; the flag is for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err)
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<launchpad_core::CoreError> for RequestError {
    fn from(err: launchpad_core::CoreError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<url::ParseError> for RequestError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}

// ============================================================================
// Token Error
// ============================================================================

/// Failure of the identity provider while fetching a credential.
///
/// Never surfaced by [`TokenProvider`](crate::TokenProvider); it degrades the
/// call to anonymous instead.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Keychain lookup failed.
    #[error("Keychain error: {0}")]
    Keychain(#[from] KeychainError),

    /// The identity provider is unreachable or misbehaving.
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),

    /// The stored credential cannot be used in a header.
    #[error("Malformed credential: {0}")]
    Malformed(String),
}

// ============================================================================
// Keychain Error
// ============================================================================

/// Error type for keychain operations.
#[derive(Debug, Error)]
pub enum KeychainError {
    /// Credential not found.
    #[error("Credential not found for {service}/{account}")]
    NotFound {
        /// Service name.
        service: String,
        /// Account name.
        account: String,
    },

    /// Access denied.
    #[error("Access denied to keychain")]
    AccessDenied,

    /// Platform error.
    #[error("Platform error: {0}")]
    Platform(String),

    /// Generic error.
    #[error("Keychain error: {0}")]
    Other(String),
}

impl From<keyring::Error> for KeychainError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::NoEntry => KeychainError::NotFound {
                service: String::new(),
                account: String::new(),
            },
            keyring::Error::Ambiguous(_) => {
                KeychainError::Other("Ambiguous credential entry".to_string())
            }
            keyring::Error::PlatformFailure(e) => KeychainError::Platform(e.to_string()),
            keyring::Error::NoStorageAccess(_) => KeychainError::AccessDenied,
            _ => KeychainError::Other(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_helpers() {
        let err = RequestError::http(StatusCode::NOT_FOUND, "not found");
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.user_message(), "not found");
        assert!(!err.is_unauthorized());
        assert!(!err.is_transient());

        assert!(RequestError::http(StatusCode::FORBIDDEN, "x").is_unauthorized());
        assert!(RequestError::http(StatusCode::BAD_GATEWAY, "x").is_transient());
        assert!(RequestError::http(StatusCode::TOO_MANY_REQUESTS, "x").is_transient());
    }

    #[test]
    fn test_parse_error_from_serde() {
        let err: RequestError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, RequestError::Parse(_)));
        assert_eq!(err.status(), None);
    }
}
