//! Integration tests for the layered configuration.
//!
//! These tests cover defaults, TOML files, `IMGDUPE_*` environment
//! variables and command-line overrides.

use clap::Parser;
use imgdupe::cli::Cli;
use imgdupe::config::{Config, ConfigError};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tempfile::tempdir;

// =============================================================================
// Helper Functions
// =============================================================================

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all IMGDUPE_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("IMGDUPE_") {
            std::env::remove_var(key);
        }
    }
}

fn write_config(dir: &std::path::Path, content: &str) -> PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// Layering
// =============================================================================

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
account_name = "someone"
data_dir = "/srv/images"
client_id_file = "/etc/imgdupe/client-id"
api_base_url = "https://api.example/3"
request_timeout_secs = 10
"#,
    );

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.account_name, "someone");
    assert_eq!(config.data_dir, Some(PathBuf::from("/srv/images")));
    assert_eq!(config.client_id_file, PathBuf::from("/etc/imgdupe/client-id"));
    assert_eq!(config.api_base_url, "https://api.example/3");
    assert_eq!(config.request_timeout(), Duration::from_secs(10));
}

#[test]
fn test_config_partial_toml_keeps_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "account_name = \"someone\"\n");

    let config = Config::load(Some(&path)).unwrap();
    let defaults = Config::default();

    assert_eq!(config.account_name, "someone");
    assert_eq!(config.request_timeout_secs, defaults.request_timeout_secs);
    assert_eq!(config.client_id_file, defaults.client_id_file);
    assert_eq!(config.api_base_url, defaults.api_base_url);
}

#[test]
fn test_config_missing_file_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_env_overrides_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "account_name = \"from-file\"\nrequest_timeout_secs = 10\n",
    );

    std::env::set_var("IMGDUPE_ACCOUNT_NAME", "from-env");
    std::env::set_var("IMGDUPE_REQUEST_TIMEOUT_SECS", "45");
    let config = Config::load(Some(&path));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.account_name, "from-env");
    assert_eq!(config.request_timeout_secs, 45);
}

#[test]
fn test_invalid_type_is_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(dir.path(), "request_timeout_secs = \"soon\"\n");

    let result = Config::load(Some(&path));
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_cli_overrides_everything() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "account_name = \"from-file\"\nrequest_timeout_secs = 10\n",
    );
    std::env::set_var("IMGDUPE_ACCOUNT_NAME", "from-env");

    let cli = Cli::try_parse_from([
        "imgdupe",
        "sync",
        "--account",
        "from-cli",
        "--timeout",
        "3",
    ])
    .unwrap();
    let config = Config::load(Some(&path)).map(|c| c.with_overrides(cli.command.overrides()));
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.account_name, "from-cli");
    assert_eq!(config.request_timeout_secs, 3);
}

#[test]
fn test_check_ignores_remote_settings() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();
    let cli = Cli::try_parse_from(["imgdupe", "check", "-a", "someone"]).unwrap();

    let config = Config::default().with_overrides(cli.command.overrides());
    assert_eq!(config.account_name, "someone");
    assert_eq!(config.client_id_file, Config::default().client_id_file);
    assert!(config.validate().is_ok());
}
