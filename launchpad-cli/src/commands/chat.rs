//! Chat command - stream a reply about a startup.

use std::io::{Write, stdout};

use anyhow::{Context, Result};
use clap::Args;
use futures::StreamExt;
use launchpad_core::ChatSession;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{build_context, json, load_config};
use crate::{Cli, OutputFormat};

/// Arguments for the chat command.
#[derive(Args)]
pub struct ChatArgs {
    /// Startup to chat about.
    pub startup_id: String,

    /// Message to send.
    pub message: String,

    /// User id the session belongs to.
    #[arg(long, short, env = "LAUNCHPAD_USER")]
    pub user: String,

    /// Extra JSON context passed along with the message.
    #[arg(long)]
    pub context: Option<String>,
}

/// Runs the chat command.
///
/// Text output prints fragments as they arrive. JSON output waits for the
/// whole reply. Ctrl+C stops the stream and keeps what arrived so far.
pub async fn run(args: &ChatArgs, cli: &Cli) -> Result<()> {
    let context = args
        .context
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--context is not valid JSON")?;

    let config = load_config(cli).await?;
    let ctx = build_context(&config)?;
    let chat = ctx.chat(&config.chat.endpoint);
    let session = ChatSession::new(&args.user, args.startup_id.as_str());
    debug!(session_id = %session.session_id, "Chat session");

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping stream");
            on_interrupt.cancel();
        }
    });

    let result = stream_reply(&chat, &session, args, context, cancel, cli).await;
    interrupt.abort();
    let reply = result?;

    match cli.format {
        OutputFormat::Text => println!(),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "sessionId": session.session_id,
                "startupId": session.startup_id,
                "reply": reply,
            });
            println!("{}", json(cli).format(&output)?);
        }
    }
    Ok(())
}

async fn stream_reply(
    chat: &launchpad_fetch::ChatClient,
    session: &ChatSession,
    args: &ChatArgs,
    context: Option<Value>,
    cancel: CancellationToken,
    cli: &Cli,
) -> Result<String> {
    let mut fragments = chat
        .send_with_cancel(session, &args.message, context, cancel)
        .await?;

    let mut reply = String::new();
    let mut out = stdout();
    while let Some(fragment) = fragments.next().await {
        let fragment = fragment?;
        if cli.format == OutputFormat::Text {
            out.write_all(fragment.as_bytes())?;
            out.flush()?;
        }
        reply.push_str(&fragment);
    }
    Ok(reply)
}
