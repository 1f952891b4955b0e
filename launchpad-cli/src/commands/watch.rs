//! Watch command - follow the unread count as it refreshes.

use anyhow::Result;
use clap::Args;
use launchpad_core::{UnreadCount, keys};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{build_context, build_queries, json, load_config, text};
use crate::output::WatchOutput;
use crate::{Cli, OutputFormat};

/// Arguments for the watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds, overriding the config.
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Minimum interval to use.
    #[arg(long, default_value = "5")]
    pub min_interval: u64,

    /// Also print the cache entries after every change.
    #[arg(long)]
    pub entries: bool,
}

/// Runs the watch command until Ctrl+C.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let mut config = load_config(cli).await?;
    if let Some(secs) = args.interval {
        config.refresh.interval_ms = secs.max(args.min_interval) * 1000;
    }
    config.refresh.enabled = true;

    let ctx = build_context(&config)?;
    let queries = build_queries(&ctx, &config);

    let mut subscription = queries.watch_unread_count();
    if let Err(e) = queries.unread_count().await {
        warn!(error = %e, "Initial unread count failed");
    }
    print_status(&queries, &subscription.status(), args, cli)?;

    let cancel = CancellationToken::new();
    let refresher = queries.start_background_refresh(&config.refresh, cancel.clone());
    info!(interval_ms = config.refresh.interval_ms, "Watching unread count");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = subscription.changed() => {
                if !changed {
                    break;
                }
                let status = subscription.status();
                // Fetch start/end both notify; print settled states only.
                if !status.fetching {
                    print_status(&queries, &status, args, cli)?;
                }
            }
        }
    }

    cancel.cancel();
    if let Some(handle) = refresher {
        handle.await?;
    }
    Ok(())
}

fn print_status(
    queries: &launchpad_store::Queries,
    status: &launchpad_store::EntryStatus,
    args: &WatchArgs,
    cli: &Cli,
) -> Result<()> {
    let count = queries
        .cache()
        .peek::<UnreadCount>(&keys::unread_count())
        .map(|unread| unread.count);
    let now = chrono::Utc::now();

    match cli.format {
        OutputFormat::Text => {
            let text = text(cli);
            let line = match (&status.error, count) {
                (Some(error), _) => text.format_error("unread count", error),
                (None, Some(count)) => text.format_unread_count(count),
                (None, None) => text.dim("No data yet"),
            };
            println!("[{}] {line}", now.with_timezone(&chrono::Local).format("%H:%M:%S"));
            if args.entries {
                println!("{}", text.format_entries(&queries.cache().entries()));
            }
        }
        OutputFormat::Json => {
            let json = json(cli);
            let output = WatchOutput {
                unread_count: count,
                version: status.version,
                stale: status.stale,
                error: status.error.clone(),
                at: now,
            };
            println!("{}", json.format(&output)?);
            if args.entries {
                println!("{}", json.format_entries(&queries.cache().entries())?);
            }
        }
    }
    Ok(())
}
