//! CLI command implementations.

pub mod auth;
pub mod chat;
pub mod config;
pub mod get;
pub mod notifications;
pub mod session;
pub mod startups;
pub mod upload;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use launchpad_fetch::{ClientContext, SystemKeychain};
use launchpad_store::{ClientConfig, Queries, QueryCache};
use tracing::debug;

use crate::Cli;
use crate::output::{JsonFormatter, TextFormatter};

/// Loads the config, applying `--base-url` last.
pub async fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = ClientConfig::load().await?;
    if let Some(base_url) = &cli.base_url {
        config.base_url.clone_from(base_url);
        config.validate()?;
    }
    debug!(base_url = %config.base_url, "Configuration ready");
    Ok(config)
}

/// Builds the transports for `config`.
pub fn build_context(config: &ClientConfig) -> Result<ClientContext> {
    let identity = config.identity.build(Arc::new(SystemKeychain::new()));
    let ctx = ClientContext::builder()
        .settings(config.client_settings())
        .identity(identity)
        .build()?;
    Ok(ctx)
}

/// Builds the cached query facade for `config`.
pub fn build_queries(ctx: &ClientContext, config: &ClientConfig) -> Queries {
    let api = ctx.api().with_upload_endpoint(config.upload.endpoint.clone());
    Queries::new(api, QueryCache::with_limit(config.cache.max_entries))
}

/// Loads config and builds the query facade in one go.
pub async fn queries(cli: &Cli) -> Result<Queries> {
    let config = load_config(cli).await?;
    let ctx = build_context(&config)?;
    Ok(build_queries(&ctx, &config))
}

/// Text formatter honoring `--no-color`.
pub fn text(cli: &Cli) -> TextFormatter {
    TextFormatter::new(!cli.no_color)
}

/// JSON formatter honoring `--pretty`.
pub fn json(cli: &Cli) -> JsonFormatter {
    JsonFormatter::new(cli.pretty)
}
