//! Get command - raw GET against any endpoint.

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use tracing::info;

use super::{build_context, json, load_config};
use crate::Cli;

/// Arguments for the get command.
#[derive(Args)]
pub struct GetArgs {
    /// Endpoint path, appended to the base URL (e.g. /startups).
    pub endpoint: String,
}

/// Runs the get command.
///
/// The body is printed as JSON in every output format. An empty body prints
/// `null`.
pub async fn run(args: &GetArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let ctx = build_context(&config)?;

    info!(endpoint = %args.endpoint, "GET");
    let body: Value = ctx.gateway.get(&args.endpoint).await?;

    println!("{}", json(cli).format(&body)?);
    Ok(())
}
