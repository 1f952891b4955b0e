//! Per-call credentials.
//!
//! [`TokenProvider`] asks an [`IdentityProvider`] for the current bearer
//! token on every call and turns it into an `Authorization` header. Nothing
//! is cached between calls.
//!
//! ## Degraded authentication
//!
//! If the identity provider fails, the call does not fail. It proceeds
//! without an `Authorization` header and the server rejects it with its own
//! 401/403 if the endpoint is not public. This keeps public reads working
//! while the identity provider is flaky, at the cost of hiding the failure
//! behind what looks like a signed-out user. The state is therefore named
//! ([`AuthState::Degraded`]), logged at `warn` (a genuine absence of identity
//! is only logged at `debug`), and readable via [`TokenProvider::last_state`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::error::TokenError;
use crate::host::keychain::{KeychainApi, accounts};

// ============================================================================
// Identity Providers
// ============================================================================

/// Source of the current identity's bearer token.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Returns the current token, or `None` when no identity is established.
    async fn current_token(&self) -> Result<Option<String>, TokenError>;
}

/// An identity provider that never has a user.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    fn name(&self) -> &str {
        "anonymous"
    }

    async fn current_token(&self) -> Result<Option<String>, TokenError> {
        Ok(None)
    }
}

/// A fixed token, e.g. from configuration or an environment variable.
#[derive(Clone)]
pub struct StaticIdentity {
    token: String,
}

impl StaticIdentity {
    /// Creates a provider that always returns `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Reads the token from an environment variable, if set and non-empty.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }
}

impl fmt::Debug for StaticIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticIdentity").finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    fn name(&self) -> &str {
        "static"
    }

    async fn current_token(&self) -> Result<Option<String>, TokenError> {
        Ok(Some(self.token.clone()))
    }
}

/// Reads the token from the keychain on every call.
///
/// A sign-in flow elsewhere writes the token; signing out deletes it.
pub struct KeychainIdentity {
    keychain: Arc<dyn KeychainApi>,
    service: String,
    account: String,
}

impl KeychainIdentity {
    /// Uses the default service/account.
    pub fn new(keychain: Arc<dyn KeychainApi>) -> Self {
        Self::with_entry(keychain, accounts::SERVICE, accounts::ID_TOKEN)
    }

    /// Uses a specific keychain entry.
    pub fn with_entry(
        keychain: Arc<dyn KeychainApi>,
        service: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            keychain,
            service: service.into(),
            account: account.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for KeychainIdentity {
    fn name(&self) -> &str {
        "keychain"
    }

    async fn current_token(&self) -> Result<Option<String>, TokenError> {
        Ok(self.keychain.get(&self.service, &self.account).await?)
    }
}

// ============================================================================
// Auth State
// ============================================================================

/// Outcome of the last credential lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// A token was attached.
    Authenticated,
    /// No identity is established; the call is anonymous on purpose.
    Anonymous,
    /// The identity provider failed; the call proceeds unauthenticated.
    Degraded,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Authenticated => "authenticated",
            Self::Anonymous => "anonymous",
            Self::Degraded => "degraded",
        })
    }
}

/// Headers for one outbound call plus how they were obtained.
#[derive(Debug, Clone)]
pub struct AuthHeader {
    headers: HeaderMap,
    state: AuthState,
}

impl AuthHeader {
    fn anonymous(state: AuthState) -> Self {
        Self {
            headers: HeaderMap::new(),
            state,
        }
    }

    /// The credential state behind these headers.
    pub fn state(&self) -> AuthState {
        self.state
    }

    /// Empty, or exactly one `Authorization` entry.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Consumes self, returning the headers.
    pub fn into_headers(self) -> HeaderMap {
        self.headers
    }
}

// ============================================================================
// Token Provider
// ============================================================================

/// Produces the `Authorization` header for each outbound call.
#[derive(Clone)]
pub struct TokenProvider {
    identity: Arc<dyn IdentityProvider>,
    last_state: Arc<Mutex<Option<AuthState>>>,
}

impl TokenProvider {
    /// Wraps an identity provider.
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        Self {
            identity,
            last_state: Arc::new(Mutex::new(None)),
        }
    }

    /// A provider that never authenticates.
    pub fn anonymous() -> Self {
        Self::new(Arc::new(AnonymousIdentity))
    }

    /// Fetches a fresh credential and builds the header mapping.
    ///
    /// Never fails: see the module docs for the degraded policy.
    pub async fn auth_header(&self) -> AuthHeader {
        let header = match self.identity.current_token().await {
            Ok(Some(token)) => match bearer_value(&token) {
                Ok(value) => {
                    let mut headers = HeaderMap::new();
                    headers.insert(AUTHORIZATION, value);
                    AuthHeader {
                        headers,
                        state: AuthState::Authenticated,
                    }
                }
                Err(e) => self.degraded(&e),
            },
            Ok(None) => {
                debug!(identity = self.identity.name(), "No identity established, anonymous request");
                AuthHeader::anonymous(AuthState::Anonymous)
            }
            Err(e) => self.degraded(&e),
        };

        self.record(header.state);
        header
    }

    /// State of the most recent lookup, if any call has been made.
    pub fn last_state(&self) -> Option<AuthState> {
        *self.last_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn degraded(&self, error: &TokenError) -> AuthHeader {
        if self.last_state() == Some(AuthState::Degraded) {
            debug!(identity = self.identity.name(), error = %error, "Credential still unavailable");
        } else {
            warn!(
                identity = self.identity.name(),
                error = %error,
                "Credential fetch failed, continuing unauthenticated (auth degraded)"
            );
        }
        AuthHeader::anonymous(AuthState::Degraded)
    }

    fn record(&self, state: AuthState) {
        *self.last_state.lock().unwrap_or_else(PoisonError::into_inner) = Some(state);
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("identity", &self.identity.name())
            .field("last_state", &self.last_state())
            .finish()
    }
}

fn bearer_value(token: &str) -> Result<HeaderValue, TokenError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
        .map_err(|e| TokenError::Malformed(e.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

// ============================================================================
// Tests
// ============================================================================
