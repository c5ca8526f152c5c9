//! Configuration structures
//!
//! Loaded by `mystar_infra::config::loader`; every field has a default so an
//! empty config file (or none at all) yields a working setup.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity provider and API endpoints
    pub provider: ProviderConfig,
    /// Session timing
    pub session: SessionConfig,
}

/// Endpoints and client registration of the telemetry provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the OIDC provider (no trailing slash)
    pub oidc_provider_url: String,
    pub client_id: String,
    pub redirect_uri: String,
    /// Space separated scopes
    pub scope: String,
    /// GraphQL endpoint
    pub api_base_url: String,
    /// User agent for the authorization request
    pub user_agent: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            oidc_provider_url: constants::OIDC_PROVIDER_URL.to_string(),
            client_id: constants::OIDC_CLIENT_ID.to_string(),
            redirect_uri: constants::OIDC_REDIRECT_URI.to_string(),
            scope: constants::OIDC_SCOPE.to_string(),
            api_base_url: constants::API_BASE_URL.to_string(),
            user_agent: constants::BROWSER_USER_AGENT.to_string(),
        }
    }
}

impl ProviderConfig {
    /// URL of the OIDC discovery document
    #[must_use]
    pub fn discovery_url(&self) -> String {
        format!(
            "{}{}",
            self.oidc_provider_url.trim_end_matches('/'),
            constants::WELL_KNOWN_PATH
        )
    }
}

/// Timing of the recurring poll and token refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub poll_interval_secs: u64,
    /// Refresh the access token when it expires within this many seconds
    pub refresh_threshold_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: constants::DEFAULT_POLL_INTERVAL_SECS,
            refresh_threshold_secs: constants::DEFAULT_REFRESH_THRESHOLD_SECS,
            http_timeout_secs: constants::DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl SessionConfig {
    /// Poll period, clamped to one second .. one day.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.clamp(1, constants::MAX_POLL_INTERVAL_SECS))
    }

    /// Per-request timeout, clamped to one second .. one hour.
    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.clamp(1, constants::MAX_HTTP_TIMEOUT_SECS))
    }
}
