//! Secure credential storage using the system keychain.
//!
//! This module provides access to the system's secure credential storage:
//! - macOS: Keychain Services
//! - Windows: Credential Manager
//! - Linux: Secret Service (GNOME Keyring, KDE Wallet)
//!
//! Lookups are never cached here. The identity token stored in the keychain
//! can be rotated by another process at any time, and every outbound call
//! must see the current value.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use crate::error::KeychainError;

/// Service name prefix for Launchpad credentials.
const SERVICE_PREFIX: &str = "launchpad";

// ============================================================================
// Keychain API Trait
// ============================================================================

/// API for secure credential storage.
#[async_trait]
pub trait KeychainApi: Send + Sync {
    /// Get a credential from the keychain.
    ///
    /// # Returns
    /// * `Ok(Some(secret))` - Credential found
    /// * `Ok(None)` - Credential not found
    /// * `Err(e)` - Error accessing keychain
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError>;

    /// Set a credential in the keychain.
    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError>;

    /// Delete a credential from the keychain. Deleting a missing entry is not an error.
    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError>;

    /// Check if a credential exists.
    async fn exists(&self, service: &str, account: &str) -> bool {
        matches!(self.get(service, account).await, Ok(Some(_)))
    }
}

// ============================================================================
// System Keychain Implementation
// ============================================================================

/// Default implementation using the system keychain.
///
/// Backed by the `keyring` crate. Platform calls block, so they run on the
/// blocking pool.
#[derive(Debug, Clone, Default)]
pub struct SystemKeychain;

impl SystemKeychain {
    /// Creates a new system keychain instance.
    pub fn new() -> Self {
        Self
    }

    /// Builds the full service name with prefix.
    fn full_service(service: &str) -> String {
        format!("{SERVICE_PREFIX}:{service}")
    }

    /// Creates a keyring entry.
    fn entry(service: &str, account: &str) -> Result<Entry, KeychainError> {
        let full_service = Self::full_service(service);
        Entry::new(&full_service, account).map_err(|e| KeychainError::Platform(e.to_string()))
    }

    async fn blocking<T, F>(f: F) -> Result<T, KeychainError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, KeychainError> + Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| KeychainError::Other(format!("keychain task failed: {e}")))?
    }
}

#[async_trait]
impl KeychainApi for SystemKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        debug!(service = %service, account = %account, "Getting credential from keychain");

        let entry = Self::entry(service, account)?;
        let result = Self::blocking(move || match entry.get_password() {
            Ok(secret) if !secret.is_empty() => Ok(Some(secret)),
            // Empty password or no entry both mean "not found"
            Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::from(e)),
        })
        .await;

        if let Err(ref e) = result {
            warn!(service = %service, account = %account, error = %e, "Failed to get credential");
        }
        result
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError> {
        debug!(service = %service, account = %account, "Setting credential in keychain");

        let entry = Self::entry(service, account)?;
        let secret = secret.to_string();
        Self::blocking(move || entry.set_password(&secret).map_err(KeychainError::from))
            .await
            .inspect_err(|e| {
                warn!(service = %service, account = %account, error = %e, "Failed to set credential");
            })
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError> {
        debug!(service = %service, account = %account, "Deleting credential from keychain");

        let entry = Self::entry(service, account)?;
        Self::blocking(move || match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(KeychainError::from(e)),
        })
        .await
    }
}

// ============================================================================
// In-Memory Keychain
// ============================================================================

/// Process-local keychain, for tests and headless environments.
#[derive(Debug, Default)]
pub struct MemoryKeychain {
    entries: Mutex<HashMap<(String, String), String>>,
}

impl MemoryKeychain {
    /// Creates an empty keychain.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeychainApi for MemoryKeychain {
    async fn get(&self, service: &str, account: &str) -> Result<Option<String>, KeychainError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    async fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), KeychainError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            (service.to_string(), account.to_string()),
            secret.to_string(),
        );
        Ok(())
    }

    async fn delete(&self, service: &str, account: &str) -> Result<(), KeychainError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}

// ============================================================================
// Common Credential Keys
// ============================================================================

/// Default keychain location of the session token.
pub mod accounts {
    /// Service name for the Launchpad backend.
    pub const SERVICE: &str = "api";
    /// Account holding the current identity token.
    pub const ID_TOKEN: &str = "id_token";
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_service_name() {
        assert_eq!(SystemKeychain::full_service("api"), "launchpad:api");
    }

    #[tokio::test]
    async fn test_memory_keychain_roundtrip() {
        let keychain = MemoryKeychain::new();
        assert!(!keychain.exists("api", "id_token").await);

        keychain.set("api", "id_token", "tok-1").await.unwrap();
        assert_eq!(
            keychain.get("api", "id_token").await.unwrap().as_deref(),
            Some("tok-1")
        );

        keychain.delete("api", "id_token").await.unwrap();
        keychain.delete("api", "id_token").await.unwrap();
        assert!(keychain.get("api", "id_token").await.unwrap().is_none());
    }
}
