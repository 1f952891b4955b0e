//! File persistence helpers.
//!
//! JSON files are written atomically with owner-only permissions, since the
//! configuration can name credential sources.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

// ============================================================================
// Default Paths
// ============================================================================

/// Returns the default configuration directory.
///
/// - macOS: `~/Library/Application Support/Launchpad`
/// - Linux: `~/.config/launchpad`
/// - Windows: `%APPDATA%\launchpad`
pub fn default_config_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support").join("Launchpad"))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    #[cfg(not(target_os = "macos"))]
    {
        dirs::config_dir()
            .map(|c| c.join("launchpad"))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

// ============================================================================
// Security: File Permissions
// ============================================================================

/// Sets owner read/write only (0o600) on Unix.
#[cfg(unix)]
async fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o600);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0600", "Set restrictive permissions");
    Ok(())
}

/// Sets owner-only access (0o700) on a directory on Unix.
#[cfg(unix)]
async fn set_restrictive_dir_permissions(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(0o700);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = "0700", "Set restrictive directory permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn set_restrictive_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

#[cfg(not(unix))]
async fn set_restrictive_dir_permissions(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}

// ============================================================================
// File Operations
// ============================================================================

/// Creates a directory and any missing ancestors.
///
/// Only directories created here get 0o700; existing ones are left alone.
pub async fn ensure_dir(path: &Path) -> Result<(), StoreError> {
    let mut missing = Vec::new();
    let mut current = Some(path);
    while let Some(dir) = current {
        if dir.as_os_str().is_empty() || tokio::fs::try_exists(dir).await? {
            break;
        }
        missing.push(dir.to_path_buf());
        current = dir.parent();
    }
    if missing.is_empty() {
        return Ok(());
    }

    debug!(path = %path.display(), "Creating secure directory");
    tokio::fs::create_dir_all(path).await?;
    for dir in missing.iter().rev() {
        set_restrictive_dir_permissions(dir).await?;
    }
    Ok(())
}

/// Saves data to a JSON file with secure permissions.
///
/// Creates parent directories if needed and writes atomically (temp file,
/// then rename).
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    if let Some(parent) = path.parent() {
        ensure_dir(parent).await?;
    }

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    set_restrictive_permissions(&temp_path).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), "JSON file saved securely");
    Ok(())
}

/// Loads data from a JSON file.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;

    debug!(path = %path.display(), "JSON file loaded");
    Ok(data)
}

/// Loads data from a JSON file, returning default if missing or invalid.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(e) => {
            if !matches!(e, StoreError::Io(_)) {
                warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            }
            T::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
