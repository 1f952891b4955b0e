//! Persistence round-trip and edge case tests.

use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::{ClientConfig, RefreshConfig};
use crate::persistence::{ensure_dir, load_json, load_json_or_default, save_json};

// ============================================================================
// JSON Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    let mut config = ClientConfig {
        base_url: "https://launchpad.example.com/api".into(),
        request_timeout_secs: Some(20),
        refresh: RefreshConfig {
            interval_ms: 10_000,
            enabled: false,
        },
        ..Default::default()
    };
    config.cache.max_entries = Some(64);
    config.identity.token_env = None;

    config.save_to(&file_path).await.unwrap();
    let loaded = ClientConfig::load_from(&file_path).await.unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_save_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let nested_path = temp_dir.path().join("deeply").join("nested").join("config.json");

    let data = serde_json::json!({"key": "value"});
    save_json(&nested_path, &data).await.unwrap();
    assert!(nested_path.exists());
}

#[tokio::test]
async fn test_load_nonexistent_file() {
    let file_path = PathBuf::from("/nonexistent/path/config.json");

    let result: Result<ClientConfig, _> = load_json(&file_path).await;
    assert!(result.is_err());

    let fallback: ClientConfig = load_json_or_default(&file_path).await;
    assert_eq!(fallback, ClientConfig::default());
}

#[tokio::test]
async fn test_ensure_dir_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let dir_path = temp_dir.path().join("launchpad");

    ensure_dir(&dir_path).await.unwrap();
    ensure_dir(&dir_path).await.unwrap();

    assert!(dir_path.is_dir());
}

#[cfg(unix)]
#[tokio::test]
async fn test_created_dirs_and_file_are_private() {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("launchpad");
    let file_path = dir.join("config.json");

    ClientConfig::default().save_to(&file_path).await.unwrap();

    let dir_mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
    let file_mode = std::fs::metadata(&file_path).unwrap().permissions().mode() & 0o777;
    assert_eq!(dir_mode, 0o700);
    assert_eq!(file_mode, 0o600);
}

// ============================================================================
// Compatibility
// ============================================================================

#[tokio::test]
async fn test_load_json_with_unknown_fields() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("extra_fields.json");

    let json = r#"{
        "base_url": "http://127.0.0.1:9000/api",
        "theme": "dark",
        "refresh": {"interval_ms": 15000, "jitter": 3}
    }"#;
    tokio::fs::write(&file_path, json).await.unwrap();

    let loaded = ClientConfig::load_from(&file_path).await.unwrap();
    assert_eq!(loaded.base_url, "http://127.0.0.1:9000/api");
    assert_eq!(loaded.refresh.interval_ms, 15_000);
    assert!(loaded.refresh.enabled);
}

#[tokio::test]
async fn test_invalid_json_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("broken.json");
    tokio::fs::write(&file_path, "{ not json").await.unwrap();

    let err = ClientConfig::load_from(&file_path).await.unwrap_err();
    assert!(matches!(err, crate::StoreError::Serialization(_)));
}

#[tokio::test]
async fn test_atomic_write_leaves_no_temp_file() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("atomic.json");

    save_json(&file_path, &ClientConfig::default()).await.unwrap();

    assert!(!file_path.with_extension("json.tmp").exists());
    assert!(file_path.exists());
}

#[tokio::test]
async fn test_invalid_config_is_not_saved() {
    let temp_dir = TempDir::new().unwrap();
    let file_path = temp_dir.path().join("config.json");

    let config = ClientConfig {
        base_url: "nope".into(),
        ..Default::default()
    };
    assert!(config.save_to(&file_path).await.is_err());
    assert!(!file_path.exists());
}
