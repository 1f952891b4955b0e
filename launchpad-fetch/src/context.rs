//! Client context bundling the credential source and both transports.
//!
//! The context is created once at application start and handed to the
//! layers above (API facade, query cache). Everything inside is cheap to
//! clone and shares one connection pool per transport.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::api::LaunchpadApi;
use crate::auth::{AnonymousIdentity, IdentityProvider, TokenProvider};
use crate::error::RequestError;
use crate::chat::ChatClient;
use crate::gateway::RequestGateway;
use crate::stream::StreamingProtocolClient;

/// User agent string for Launchpad.
const USER_AGENT: &str = concat!("Launchpad/", env!("CARGO_PKG_VERSION"));

/// Default base URL for a locally running backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

// ============================================================================
// Client Settings
// ============================================================================

/// Transport settings.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Base URL every endpoint is appended to.
    pub base_url: String,
    /// Total deadline for unary calls. `None` leaves it to the transport.
    pub timeout: Option<Duration>,
    /// Connection deadline, also applied to streaming calls.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            connect_timeout: None,
        }
    }
}

impl ClientSettings {
    /// Settings for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the unary call deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client for unary calls.
    pub fn build_client(&self) -> Result<Client, RequestError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder.build().map_err(RequestError::Network)
    }

    /// Builds the client for streaming calls.
    ///
    /// A total deadline would cut long responses mid-stream, so only the
    /// connect deadline applies.
    pub fn build_stream_client(&self) -> Result<Client, RequestError> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        builder.build().map_err(RequestError::Network)
    }
}

// ============================================================================
// Client Context
// ============================================================================

/// Credential source plus unary and streaming transports.
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// Per-call credentials.
    pub tokens: TokenProvider,
    /// Unary JSON and upload calls.
    pub gateway: RequestGateway,
    /// Streaming text calls.
    pub streaming: StreamingProtocolClient,
    /// Settings used to build the transports.
    pub settings: ClientSettings,
}

impl ClientContext {
    /// Creates an anonymous context for the given settings.
    pub fn new(settings: ClientSettings) -> Result<Self, RequestError> {
        Self::builder().settings(settings).build()
    }

    /// Creates a builder for customizing the context.
    pub fn builder() -> ClientContextBuilder {
        ClientContextBuilder::new()
    }

    /// Typed endpoint facade over this context's gateway.
    pub fn api(&self) -> LaunchpadApi {
        LaunchpadApi::new(self.gateway.clone())
    }

    /// Chat client posting to `endpoint`.
    pub fn chat(&self, endpoint: &str) -> ChatClient {
        ChatClient::new(self.streaming.clone(), endpoint)
    }
}

// ============================================================================
// Client Context Builder
// ============================================================================

/// Builder for constructing a `ClientContext`.
pub struct ClientContextBuilder {
    identity: Option<Arc<dyn IdentityProvider>>,
    settings: ClientSettings,
}

impl ClientContextBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self {
            identity: None,
            settings: ClientSettings::default(),
        }
    }

    /// Sets the identity provider. Defaults to anonymous.
    pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets all transport settings.
    pub fn settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.settings.base_url = base_url.into();
        self
    }

    /// Sets the unary call deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = Some(timeout);
        self
    }

    /// Builds the context, validating the base URL.
    pub fn build(self) -> Result<ClientContext, RequestError> {
        let identity = self
            .identity
            .unwrap_or_else(|| Arc::new(AnonymousIdentity));
        let tokens = TokenProvider::new(identity);

        let gateway = RequestGateway::new(&self.settings, tokens.clone())?;
        let streaming = StreamingProtocolClient::new(
            self.settings.build_stream_client()?,
            gateway.base_url(),
            tokens.clone(),
        )?;

        Ok(ClientContext {
            tokens,
            gateway,
            streaming,
            settings: self.settings,
        })
    }
}

impl Default for ClientContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
