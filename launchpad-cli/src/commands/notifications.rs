//! Notifications command.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::{json, queries, text};
use crate::{Cli, OutputFormat};

/// Arguments for the notifications command.
#[derive(Args)]
pub struct NotificationsArgs {
    /// Action to run. Lists all notifications when omitted.
    #[command(subcommand)]
    pub action: Option<NotificationsAction>,
}

/// Notifications subcommands.
#[derive(Subcommand)]
pub enum NotificationsAction {
    /// List notifications.
    List {
        /// Only unread notifications.
        #[arg(long, short)]
        unread: bool,
    },

    /// Show the unread count.
    Count,

    /// Mark one notification read.
    Read {
        /// Notification id.
        id: String,
    },

    /// Mark every notification read.
    ReadAll,
}

/// Runs the notifications command.
pub async fn run(args: &NotificationsArgs, cli: &Cli) -> Result<()> {
    let queries = queries(cli).await?;
    let text = text(cli);
    let json = json(cli);

    let default = NotificationsAction::List { unread: false };
    let action = args.action.as_ref().unwrap_or(&default);

    let output = match action {
        NotificationsAction::List { unread } => {
            let notifications = queries.notifications(*unread).await?;
            match cli.format {
                OutputFormat::Text => text.format_notifications(&notifications),
                OutputFormat::Json => json.format(&*notifications)?,
            }
        }
        NotificationsAction::Count => {
            let unread = queries.unread_count().await?;
            match cli.format {
                OutputFormat::Text => text.format_unread_count(unread.count),
                OutputFormat::Json => json.format(&*unread)?,
            }
        }
        NotificationsAction::Read { id } => {
            queries.mark_notification_read(id).await?;
            match cli.format {
                OutputFormat::Text => format!("Marked read: {id}"),
                OutputFormat::Json => json.format(&serde_json::json!({ "read": id }))?,
            }
        }
        NotificationsAction::ReadAll => {
            queries.mark_all_notifications_read().await?;
            // Invalidated by the mutation above, so this refetches.
            let unread = queries.unread_count().await?;
            match cli.format {
                OutputFormat::Text => text.format_unread_count(unread.count),
                OutputFormat::Json => json.format(&*unread)?,
            }
        }
    };

    println!("{output}");
    Ok(())
}
