//! Auth command - manage the token stored in the system keychain.

use std::io::{BufRead, IsTerminal};
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use launchpad_fetch::{KeychainApi, SystemKeychain};
use launchpad_store::IdentityConfig;
use tracing::info;

use super::{json, load_config};
use crate::{Cli, OutputFormat};

/// Arguments for the auth command.
#[derive(Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Auth subcommands.
#[derive(Subcommand)]
pub enum AuthAction {
    /// Store a token in the keychain. Reads stdin when --token is omitted.
    Login {
        /// The bearer token.
        #[arg(long)]
        token: Option<String>,
    },

    /// Remove the stored token.
    Logout,

    /// Show where the token comes from.
    Status,
}

/// Runs the auth command.
pub async fn run(args: &AuthArgs, cli: &Cli) -> Result<()> {
    let config = load_config(cli).await?;
    let identity = &config.identity;
    let keychain: Arc<dyn KeychainApi> = Arc::new(SystemKeychain::new());

    match &args.action {
        AuthAction::Login { token } => {
            let token = match token {
                Some(token) => token.trim().to_string(),
                None => read_token()?,
            };
            if token.is_empty() {
                bail!("empty token");
            }
            keychain
                .set(&identity.keychain_service, &identity.keychain_account, &token)
                .await?;
            info!(account = %identity.keychain_account, "Token stored");
            println!("Token stored in keychain");
        }
        AuthAction::Logout => {
            keychain
                .delete(&identity.keychain_service, &identity.keychain_account)
                .await?;
            info!(account = %identity.keychain_account, "Token removed");
            println!("Token removed from keychain");
        }
        AuthAction::Status => {
            let source = token_source(identity, keychain.as_ref()).await;
            match cli.format {
                OutputFormat::Text => println!("Token source: {source}"),
                OutputFormat::Json => {
                    let output = serde_json::json!({ "source": source });
                    println!("{}", json(cli).format(&output)?);
                }
            }
        }
    }
    Ok(())
}

/// Mirrors the precedence of [`IdentityConfig::build`].
async fn token_source(identity: &IdentityConfig, keychain: &dyn KeychainApi) -> String {
    if let Some(var) = identity
        .token_env
        .as_deref()
        .filter(|var| std::env::var(var).is_ok_and(|v| !v.trim().is_empty()))
    {
        return format!("environment (${var})");
    }
    if identity.use_keychain
        && keychain
            .exists(&identity.keychain_service, &identity.keychain_account)
            .await
    {
        return format!(
            "keychain ({}/{})",
            identity.keychain_service, identity.keychain_account
        );
    }
    "none (anonymous)".to_string()
}

fn read_token() -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Token: ");
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use launchpad_fetch::MemoryKeychain;

    #[tokio::test]
    async fn test_token_source_keychain() {
        let keychain = MemoryKeychain::new();
        let identity = IdentityConfig {
            keychain_service: "svc".into(),
            keychain_account: "acct".into(),
            use_keychain: true,
            token_env: None,
        };
        assert_eq!(token_source(&identity, &keychain).await, "none (anonymous)");

        keychain.set("svc", "acct", "tok").await.unwrap();
        assert_eq!(token_source(&identity, &keychain).await, "keychain (svc/acct)");
    }

    #[tokio::test]
    async fn test_token_source_keychain_disabled() {
        let keychain = MemoryKeychain::new();
        keychain.set("svc", "acct", "tok").await.unwrap();
        let identity = IdentityConfig {
            keychain_service: "svc".into(),
            keychain_account: "acct".into(),
            use_keychain: false,
            token_env: None,
        };
        assert_eq!(token_source(&identity, &keychain).await, "none (anonymous)");
    }
}
