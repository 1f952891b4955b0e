//! Session command - print the chat session id.

use anyhow::Result;
use clap::Args;
use launchpad_core::ChatSession;

use super::json;
use crate::{Cli, OutputFormat};

/// Arguments for the session command.
#[derive(Args)]
pub struct SessionArgs {
    /// User id.
    pub user: String,

    /// Startup id.
    pub startup: String,
}

/// Runs the session command.
pub fn run(args: &SessionArgs, cli: &Cli) -> Result<()> {
    let session = ChatSession::new(&args.user, args.startup.as_str());

    match cli.format {
        OutputFormat::Text => println!("{}", session.session_id),
        OutputFormat::Json => println!("{}", json(cli).format(&session)?),
    }
    Ok(())
}
