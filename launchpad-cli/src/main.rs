// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Launchpad CLI - the Launchpad data access layer from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List startups
//! launchpad startups
//!
//! # Create a startup and run an analysis
//! launchpad startups create "Acme" --industry fintech
//! launchpad startups analyze s1
//!
//! # Unread notifications as JSON
//! launchpad notifications list --unread --format json --pretty
//!
//! # Chat about a startup, streaming the reply
//! launchpad chat s1 "What is the biggest risk?" --user u1
//!
//! # Upload a pitch deck
//! launchpad upload s1 ./deck.pdf
//!
//! # Watch the unread count
//! launchpad watch
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use launchpad_fetch::RequestError;
use launchpad_store::StoreError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{auth, chat, config, get, notifications, session, startups, upload, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// Launchpad CLI - startups, analyses, notifications and chat.
#[derive(Parser)]
#[command(name = "launchpad")]
#[command(about = "Launchpad data access CLI")]
#[command(long_about = r#"
Launchpad talks to the Launchpad backend: startups, analyses, follow-up
questions, notifications, document uploads and streaming chat.

The backend URL comes from the config file, LAUNCHPAD_BASE_URL, or --base-url.
The bearer token comes from LAUNCHPAD_TOKEN or the system keychain
(see `launchpad auth login`).

Examples:
  launchpad startups                       # List startups
  launchpad startups analyze s1            # Run an analysis
  launchpad notifications count            # Unread count
  launchpad chat s1 "Summarize" --user u1  # Streaming chat
  launchpad watch                          # Poll the unread count
"#)]
#[command(version)]
#[command(author = "Launchpad Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, lists startups.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Backend base URL, overriding config and environment.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// GET any endpoint and print the JSON body.
    Get(get::GetArgs),

    /// Startups, analyses and questions.
    #[command(visible_alias = "s")]
    Startups(startups::StartupsArgs),

    /// Notifications.
    #[command(visible_alias = "n")]
    Notifications(notifications::NotificationsArgs),

    /// Chat about a startup, streaming the reply.
    Chat(chat::ChatArgs),

    /// Upload a document for a startup.
    Upload(upload::UploadArgs),

    /// Print the chat session id for a user and startup.
    Session(session::SessionArgs),

    /// Watch the unread notification count.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),

    /// Manage the stored credential.
    Auth(auth::AuthArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// The backend could not be reached.
    Network = 2,
    /// The backend rejected the credential (401/403).
    Unauthorized = 3,
    /// The backend answered with another failure status.
    Http = 4,
    /// Invalid configuration.
    Config = 5,
}

impl ExitCode {
    /// Picks the exit code for an error.
    pub fn for_error(err: &anyhow::Error) -> Self {
        let request = err
            .downcast_ref::<RequestError>()
            .or_else(|| err.downcast_ref::<StoreError>().and_then(StoreError::request));

        if let Some(request) = request {
            return match request {
                RequestError::Network(_) => Self::Network,
                e if e.is_unauthorized() => Self::Unauthorized,
                RequestError::Http { .. } => Self::Http,
                RequestError::InvalidUrl(_) => Self::Config,
                _ => Self::Error,
            };
        }
        match err.downcast_ref::<StoreError>() {
            Some(StoreError::Config(_)) => Self::Config,
            _ => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("launchpad=debug,info")
    } else {
        EnvFilter::new("launchpad=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Get(args)) => get::run(args, &cli).await,
        Some(Commands::Startups(args)) => startups::run(args, &cli).await,
        Some(Commands::Notifications(args)) => notifications::run(args, &cli).await,
        Some(Commands::Chat(args)) => chat::run(args, &cli).await,
        Some(Commands::Upload(args)) => upload::run(args, &cli).await,
        Some(Commands::Session(args)) => session::run(args, &cli),
        Some(Commands::Watch(args)) => watch::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        Some(Commands::Auth(args)) => auth::run(args, &cli).await,
        None => startups::run(&startups::StartupsArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
