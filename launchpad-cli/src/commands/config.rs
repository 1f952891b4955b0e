//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use launchpad_store::{ClientConfig, default_config_dir};
use tracing::info;

use super::{json, load_config, text};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Write the default configuration if none exists.
    Init,

    /// Set the backend base URL.
    SetBaseUrl {
        /// New base URL.
        url: String,
    },

    /// Set the background refresh interval.
    Refresh {
        /// Interval in seconds.
        seconds: u64,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::Init => init_config().await,
        ConfigAction::SetBaseUrl { url } => {
            update(|config| config.base_url.clone_from(url)).await?;
            println!("Base URL set to: {url}");
            Ok(())
        }
        ConfigAction::Refresh { seconds } => {
            update(|config| config.refresh.interval_ms = seconds.saturating_mul(1000)).await?;
            println!("Refresh interval set to: {seconds}s");
            Ok(())
        }
        ConfigAction::Reset => reset_config().await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;

    match cli.format {
        OutputFormat::Text => println!("{}", text(cli).format_config(&config)),
        OutputFormat::Json => println!("{}", json(cli).format(&config)?),
    }
    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_path = ClientConfig::default_path();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:  {}", config_dir.display());
            println!("Config file: {}", config_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_path.display().to_string(),
            });
            println!("{}", json(cli).format(&paths)?);
        }
    }
    Ok(())
}

async fn init_config() -> Result<()> {
    let path = ClientConfig::default_path();
    if path.exists() {
        println!("Configuration already exists: {}", path.display());
        return Ok(());
    }
    ClientConfig::default().save_to(&path).await?;
    println!("Wrote default configuration: {}", path.display());
    Ok(())
}

/// Edits the file on disk. Environment overrides are not written back.
async fn update(edit: impl FnOnce(&mut ClientConfig)) -> Result<()> {
    let path = ClientConfig::default_path();
    let mut config = ClientConfig::load_from(&path).await?;
    edit(&mut config);
    config.save_to(&path).await?;
    Ok(())
}

async fn reset_config() -> Result<()> {
    let path = ClientConfig::default_path();

    if path.exists() {
        tokio::fs::remove_file(&path).await?;
        info!(path = %path.display(), "Configuration reset");
        println!("Configuration reset to defaults");
    } else {
        println!("No configuration file to reset");
    }
    Ok(())
}
