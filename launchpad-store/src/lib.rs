// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Launchpad Store
//!
//! Client-side state for the Launchpad application.
//!
//! This crate provides:
//!
//! - **QueryCache**: Keyed cache with fetch coalescing, prefix invalidation
//!   and subscriptions
//! - **MutationCoordinator**: Runs writes and invalidates what they declare
//! - **BackgroundRefresher**: Fixed-interval polling of selected keys
//! - **Queries**: Cached reads and mutations for every resource
//! - **ClientConfig**: Configuration with persistence
//!
//! ## Usage
//!
//! ```ignore
//! use launchpad_fetch::ClientContext;
//! use launchpad_store::{ClientConfig, Queries, QueryCache};
//!
//! let config = ClientConfig::load().await?;
//! let ctx = ClientContext::new(config.client_settings())?;
//! let queries = Queries::new(ctx.api(), QueryCache::with_limit(config.cache.max_entries));
//!
//! // Cached read
//! let startups = queries.startups().await?;
//!
//! // Mutation; the startup list is refetched on next read
//! queries.create_startup(&NewStartup::named("Acme")).await?;
//! ```

pub mod config;
pub mod error;
pub mod mutation;
pub mod persistence;
pub mod queries;
pub mod query_cache;
pub mod refresh;

pub use config::{
    CacheConfig, ChatConfig, ClientConfig, IdentityConfig, RefreshConfig, UploadConfig,
};
pub use error::StoreError;
pub use mutation::{MutationCoordinator, MutationDescriptor};
pub use persistence::{default_config_dir, ensure_dir, load_json, load_json_or_default, save_json};
pub use queries::Queries;
pub use query_cache::{EntryInfo, EntryStatus, QueryCache, Subscription};
pub use refresh::BackgroundRefresher;

#[cfg(test)]
mod persistence_tests;
