//! Client configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use launchpad_fetch::host::keychain::accounts;
use launchpad_fetch::{
    AnonymousIdentity, ClientSettings, DEFAULT_BASE_URL, IdentityProvider, KeychainApi,
    KeychainIdentity, StaticIdentity,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::StoreError;
use crate::persistence::{default_config_dir, load_json, save_json};

/// Overrides [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "LAUNCHPAD_BASE_URL";

/// Overrides [`RefreshConfig::interval_ms`].
pub const REFRESH_INTERVAL_ENV: &str = "LAUNCHPAD_REFRESH_INTERVAL_MS";

/// Default environment variable holding a static token.
pub const DEFAULT_TOKEN_ENV: &str = "LAUNCHPAD_TOKEN";

// ============================================================================
// Sections
// ============================================================================

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL every endpoint is appended to.
    pub base_url: String,
    /// Deadline for unary calls. `None` leaves it to the transport.
    pub request_timeout_secs: Option<u64>,
    /// Background refresh.
    pub refresh: RefreshConfig,
    /// Query cache.
    pub cache: CacheConfig,
    /// Streaming chat.
    pub chat: ChatConfig,
    /// Document upload.
    pub upload: UploadConfig,
    /// Credential source.
    pub identity: IdentityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            refresh: RefreshConfig::default(),
            cache: CacheConfig::default(),
            chat: ChatConfig::default(),
            upload: UploadConfig::default(),
            identity: IdentityConfig::default(),
        }
    }
}

/// Background refresh settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Refetch cadence in milliseconds.
    pub interval_ms: u64,
    /// Whether background refresh runs at all.
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: 30_000,
            enabled: true,
        }
    }
}

impl RefreshConfig {
    /// Cadence as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Query cache settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Upper bound on entries. Unbounded when absent.
    pub max_entries: Option<usize>,
}

/// Chat settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Streaming endpoint.
    pub endpoint: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: launchpad_fetch::chat::DEFAULT_CHAT_ENDPOINT.to_string(),
        }
    }
}

/// Upload settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Multipart endpoint.
    pub endpoint: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint: launchpad_fetch::api::DEFAULT_UPLOAD_ENDPOINT.to_string(),
        }
    }
}

/// Where the bearer credential comes from.
///
/// A token in `token_env` wins; otherwise the keychain entry is read on every
/// call; with neither, calls are anonymous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Keychain service holding the token.
    pub keychain_service: String,
    /// Keychain account holding the token.
    pub keychain_account: String,
    /// Read the keychain at all.
    pub use_keychain: bool,
    /// Environment variable with a static token.
    pub token_env: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            keychain_service: accounts::SERVICE.to_string(),
            keychain_account: accounts::ID_TOKEN.to_string(),
            use_keychain: true,
            token_env: Some(DEFAULT_TOKEN_ENV.to_string()),
        }
    }
}

impl IdentityConfig {
    /// Builds the identity provider this section describes.
    pub fn build(&self, keychain: Arc<dyn KeychainApi>) -> Arc<dyn IdentityProvider> {
        if let Some(identity) = self.token_env.as_deref().and_then(StaticIdentity::from_env) {
            debug!("Using token from environment");
            return Arc::new(identity);
        }
        if self.use_keychain {
            return Arc::new(KeychainIdentity::with_entry(
                keychain,
                &self.keychain_service,
                &self.keychain_account,
            ));
        }
        Arc::new(AnonymousIdentity)
    }
}

// ============================================================================
// Load / Save
// ============================================================================

impl ClientConfig {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        default_config_dir().join("config.json")
    }

    /// Loads from the default path and applies environment overrides.
    pub async fn load() -> Result<Self, StoreError> {
        let mut config = Self::load_from(&Self::default_path()).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Loads from `path`. A missing file yields the defaults.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let config: Self = load_json(path).await?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&Self::default_path()).await
    }

    /// Saves to `path` with owner-only permissions.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        self.validate()?;
        save_json(path, self).await?;
        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Applies `LAUNCHPAD_BASE_URL` and `LAUNCHPAD_REFRESH_INTERVAL_MS`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = var(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(base_url = %base_url, "Base URL from environment");
            self.base_url = base_url;
        }
        if let Some(raw) = var(REFRESH_INTERVAL_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.refresh.interval_ms = ms,
                Err(_) => warn!(value = %raw, "Ignoring invalid {REFRESH_INTERVAL_ENV}"),
            }
        }
    }

    /// Checks values that would otherwise fail at first use.
    pub fn validate(&self) -> Result<(), StoreError> {
        Url::parse(&self.base_url)
            .map_err(|e| StoreError::Config(format!("invalid base_url {:?}: {e}", self.base_url)))?;
        if self.refresh.interval_ms == 0 {
            return Err(StoreError::Config("refresh.interval_ms must be positive".into()));
        }
        if self.cache.max_entries == Some(0) {
            return Err(StoreError::Config("cache.max_entries must be positive".into()));
        }
        for (name, endpoint) in [("chat.endpoint", &self.chat.endpoint), ("upload.endpoint", &self.upload.endpoint)] {
            if !endpoint.starts_with('/') {
                return Err(StoreError::Config(format!("{name} must start with '/'")));
            }
        }
        Ok(())
    }

    /// Transport settings for the fetch layer.
    pub fn client_settings(&self) -> ClientSettings {
        let mut settings = ClientSettings::new(self.base_url.clone());
        settings.timeout = self.request_timeout_secs.map(Duration::from_secs);
        settings
    }
}

// ============================================================================
// Tests
// ============================================================================
