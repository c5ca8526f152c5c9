//! Configuration loader
//!
//! ## Loading Strategy
//! 1. Start from [`Config::default`] (the provider's production endpoints)
//! 2. Merge a config file: the explicit path if given (must exist), else the
//!    first probed file, else nothing
//! 3. Apply `MYSTAR_*` environment overrides
//!
//! ## Environment Variables
//! - `MYSTAR_OIDC_PROVIDER_URL`: OIDC provider base URL
//! - `MYSTAR_CLIENT_ID`: OAuth client id
//! - `MYSTAR_REDIRECT_URI`: registered redirect URI
//! - `MYSTAR_SCOPE`: space separated scopes
//! - `MYSTAR_API_BASE_URL`: GraphQL endpoint
//! - `MYSTAR_USER_AGENT`: user agent for the authorization request
//! - `MYSTAR_POLL_INTERVAL_SECS`: telemetry poll interval
//! - `MYSTAR_REFRESH_THRESHOLD_SECS`: refresh tokens this close to expiry
//! - `MYSTAR_HTTP_TIMEOUT_SECS`: per-request timeout
//!
//! ## File Locations
//! Probed in the current working directory, in order: `mystar.toml`,
//! `mystar.json`, `config.toml`, `config.json`.

use std::path::{Path, PathBuf};

use mystar_domain::{Config, MyStarError, Result};

const PROBED_FILES: [&str; 4] = ["mystar.toml", "mystar.json", "config.toml", "config.json"];

/// Load configuration with the full layering strategy.
///
/// # Errors
/// Returns `MyStarError::Config` if the explicit file is missing, a file
/// cannot be parsed, or an override has an invalid value.
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => load_from_file(&path)?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(&found)?,
            None => {
                tracing::debug!("No config file found, using defaults");
                Config::default()
            }
        },
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Load configuration from a file
///
/// Format is detected by extension (`.json` or `.toml`); fields missing from
/// the file keep their defaults.
///
/// # Errors
/// Returns `MyStarError::Config` if the file does not exist, cannot be read
/// or is not valid for its format.
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(MyStarError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| MyStarError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MyStarError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MyStarError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MyStarError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file in the current working directory.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    PROBED_FILES.iter().map(|name| cwd.join(name)).find(|path| path.exists())
}

/// Apply `MYSTAR_*` overrides read through `lookup`.
///
/// Empty values are ignored.
///
/// # Errors
/// Returns `MyStarError::Config` when a numeric override does not parse.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    let provider = &mut config.provider;
    for (key, field) in [
        ("MYSTAR_OIDC_PROVIDER_URL", &mut provider.oidc_provider_url),
        ("MYSTAR_CLIENT_ID", &mut provider.client_id),
        ("MYSTAR_REDIRECT_URI", &mut provider.redirect_uri),
        ("MYSTAR_SCOPE", &mut provider.scope),
        ("MYSTAR_API_BASE_URL", &mut provider.api_base_url),
        ("MYSTAR_USER_AGENT", &mut provider.user_agent),
    ] {
        if let Some(value) = get(key) {
            *field = value;
        }
    }

    let session = &mut config.session;
    for (key, field) in [
        ("MYSTAR_POLL_INTERVAL_SECS", &mut session.poll_interval_secs),
        ("MYSTAR_REFRESH_THRESHOLD_SECS", &mut session.refresh_threshold_secs),
        ("MYSTAR_HTTP_TIMEOUT_SECS", &mut session.http_timeout_secs),
    ] {
        if let Some(value) = get(key) {
            *field = value
                .trim()
                .parse()
                .map_err(|e| MyStarError::Config(format!("Invalid value for {key}: {e}")))?;
        }
    }

    Ok(())
}
