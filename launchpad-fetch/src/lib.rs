// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Launchpad Fetch
//!
//! Transport layer for the Launchpad client.
//!
//! ## Credentials
//!
//! - [`auth::IdentityProvider`] - Source of the bearer credential
//! - [`auth::TokenProvider`] - Builds per-call auth headers, degrading to
//!   anonymous when the source fails
//! - [`host::keychain`] - Secure credential storage (system keychain)
//!
//! ## Transports
//!
//! - [`gateway::RequestGateway`] - Unary JSON calls and multipart uploads
//! - [`stream::StreamingProtocolClient`] - Incremental text responses
//! - [`api::LaunchpadApi`] - Typed backend endpoints
//! - [`chat::ChatClient`] - Streaming chat
//!
//! ## Example
//!
//! ```ignore
//! use launchpad_fetch::ClientContext;
//!
//! let ctx = ClientContext::builder()
//!     .base_url("http://localhost:8000/api")
//!     .build()?;
//!
//! let startups = ctx.api().list_startups().await?;
//! ```

pub mod api;
pub mod auth;
pub mod chat;
pub mod context;
pub mod error;
pub mod gateway;
pub mod host;
pub mod stream;

// Errors
pub use error::{KeychainError, RequestError, TokenError};

// Credentials
pub use auth::{
    AnonymousIdentity, AuthHeader, AuthState, IdentityProvider, KeychainIdentity,
    StaticIdentity, TokenProvider,
};
pub use host::keychain::{KeychainApi, MemoryKeychain, SystemKeychain};

// Transports
pub use api::LaunchpadApi;
pub use chat::ChatClient;
pub use context::{ClientContext, ClientContextBuilder, ClientSettings, DEFAULT_BASE_URL};
pub use gateway::{RequestGateway, UploadFile, UploadForm};
pub use stream::{FragmentStream, StreamingProtocolClient, collect_fragments};
