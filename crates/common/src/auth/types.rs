//! Token endpoint types
//!
//! Wire format of the provider's token endpoint (RFC 6749 §5) and the
//! in-memory token state derived from it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use mystar_domain::{MyStarError, Result};
use serde::{Deserialize, Serialize};

/// Access and refresh token pair with its expiry.
///
/// `expires_at` is the wall-clock time after which `access_token` must not be
/// used without refreshing first.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// Build the state from a token response received at `now`.
    ///
    /// When the response carries no refresh token, `previous_refresh_token`
    /// is kept (rotation is optional per response).
    ///
    /// # Errors
    /// [`MyStarError::Protocol`] when `expires_in` is not positive or puts
    /// the expiry outside the representable time range.
    pub fn from_response(
        response: TokenResponse,
        previous_refresh_token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let expires_at = expiry_after(now, response.expires_in).ok_or_else(|| {
            MyStarError::Protocol(format!("expires_in out of range: {}", response.expires_in))
        })?;

        let refresh_token = response
            .refresh_token
            .filter(|token| !token.is_empty())
            .or_else(|| previous_refresh_token.map(str::to_string))
            .unwrap_or_default();

        Ok(Self { access_token: response.access_token, refresh_token, expires_at })
    }

    /// Check if the access token is expired or will expire within the given
    /// threshold
    ///
    /// A token whose remaining lifetime equals the threshold counts as
    /// expired.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        self.is_expired_at(Utc::now(), threshold_seconds)
    }

    /// A threshold reaching past the representable time range counts as
    /// expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, threshold_seconds: i64) -> bool {
        Duration::try_seconds(threshold_seconds)
            .and_then(|threshold| now.checked_add_signed(threshold))
            .map_or(true, |deadline| deadline >= self.expires_at)
    }
}

/// `now + seconds`, or `None` for a non-positive or unrepresentable lifetime.
fn expiry_after(now: DateTime<Utc>, seconds: i64) -> Option<DateTime<Utc>> {
    if seconds <= 0 {
        return None;
    }
    now.checked_add_signed(Duration::try_seconds(seconds)?)
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Successful token endpoint response
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &self.refresh_token.as_deref().map(redact))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// OAuth error response from the authorization server (RFC 6749 §5.2)
///
/// The provider may send this with HTTP 200, so the body is always checked
/// for an `error` field before anything else.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthError {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}

/// First few characters of a secret, enough to correlate log lines.
#[must_use]
pub fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{prefix}…")
}
