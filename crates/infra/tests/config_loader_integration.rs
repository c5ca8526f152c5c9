//! Integration tests for configuration loader
//!
//! Tests the end-to-end layering: file values over defaults, environment
//! over file.

use std::io::Write;
use std::sync::Mutex;

use mystar_domain::{Config, MyStarError};
use mystar_infra::config;
use once_cell::sync::Lazy;
use tempfile::Builder;

/// Serialises tests that touch process environment variables.
static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const OVERRIDE_KEYS: [&str; 2] = ["MYSTAR_API_BASE_URL", "MYSTAR_REFRESH_THRESHOLD_SECS"];

fn clear_overrides() {
    for key in OVERRIDE_KEYS {
        std::env::remove_var(key);
    }
}

#[test]
fn test_load_explicit_toml_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_overrides();

    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(
        br#"
[provider]
api_base_url = "http://127.0.0.1:8080/graphql"
scope = "openid"

[session]
poll_interval_secs = 60
"#,
    )
    .unwrap();

    let config = config::load(Some(file.path().to_path_buf())).unwrap();
    assert_eq!(config.provider.api_base_url, "http://127.0.0.1:8080/graphql");
    assert_eq!(config.provider.scope, "openid");
    assert_eq!(config.session.poll_interval_secs, 60);
    assert_eq!(config.session.http_timeout_secs, Config::default().session.http_timeout_secs);
}

#[test]
fn test_environment_overrides_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_overrides();

    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(br#"{ "provider": { "api_base_url": "http://from-file/graphql" } }"#).unwrap();

    std::env::set_var("MYSTAR_API_BASE_URL", "http://from-env/graphql");
    std::env::set_var("MYSTAR_REFRESH_THRESHOLD_SECS", "120");
    let result = config::load(Some(file.path().to_path_buf()));
    clear_overrides();

    let config = result.unwrap();
    assert_eq!(config.provider.api_base_url, "http://from-env/graphql");
    assert_eq!(config.session.refresh_threshold_secs, 120);
}

#[test]
fn test_invalid_environment_value_is_config_error() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_overrides();

    let file = Builder::new().suffix(".toml").tempfile().unwrap();
    std::env::set_var("MYSTAR_REFRESH_THRESHOLD_SECS", "five minutes");
    let result = config::load(Some(file.path().to_path_buf()));
    clear_overrides();

    assert!(matches!(result, Err(MyStarError::Config(_))));
}

#[test]
fn test_missing_explicit_file_is_error() {
    let result = config::load(Some("/nonexistent/mystar.toml".into()));
    assert!(matches!(result, Err(MyStarError::Config(_))));
}
