//! Error types used throughout the session engine

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for MyStar
///
/// Every core operation either succeeds or fails with exactly one of the
/// protocol, parse or authentication kinds. `Config` is only produced while
/// loading configuration or validating caller input at the entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum MyStarError {
    /// Unexpected HTTP status, transport failure, malformed or missing JSON
    /// fields, or GraphQL-level errors.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The login page did not match any known resume-path pattern.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Bad credentials, a provider-reported auth error, or a detected error
    /// marker page.
    #[error("Authentication failed: {}", display_auth(code.as_deref(), message))]
    AuthenticationFailed {
        /// Provider error code (`invalid_grant`, `ERR001`, ...) when known
        code: Option<String>,
        /// Human readable detail
        message: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn display_auth(code: Option<&str>, message: &str) -> String {
    match code {
        Some(code) => format!("{code}: {message}"),
        None => message.to_string(),
    }
}

impl MyStarError {
    /// Build an [`MyStarError::AuthenticationFailed`] without a provider code.
    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { code: None, message: message.into() }
    }

    /// Build an [`MyStarError::AuthenticationFailed`] carrying a provider code.
    pub fn auth_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AuthenticationFailed { code: Some(code.into()), message: message.into() }
    }

    /// Closed classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(_) => ErrorKind::Protocol,
            Self::Parse(_) => ErrorKind::Parse,
            Self::AuthenticationFailed { .. } => ErrorKind::AuthenticationFailed,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether the same operation may succeed on a later attempt without the
    /// caller changing anything.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

/// Kind of a [`MyStarError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// See [`MyStarError::Protocol`]
    Protocol,
    /// See [`MyStarError::Parse`]
    Parse,
    /// See [`MyStarError::AuthenticationFailed`]
    AuthenticationFailed,
    /// See [`MyStarError::Config`]
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol => write!(f, "ProtocolError"),
            Self::Parse => write!(f, "ParseError"),
            Self::AuthenticationFailed => write!(f, "AuthenticationFailed"),
            Self::Config => write!(f, "ConfigError"),
        }
    }
}

/// Result type alias for MyStar operations
pub type Result<T> = std::result::Result<T, MyStarError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_display_includes_provider_code() {
        let err = MyStarError::auth_with_code("invalid_grant", "refresh token revoked");
        assert_eq!(err.to_string(), "Authentication failed: invalid_grant: refresh token revoked");

        let err = MyStarError::auth("bad credentials");
        assert_eq!(err.to_string(), "Authentication failed: bad credentials");
    }

    #[test]
    fn kinds_and_retryability() {
        assert_eq!(MyStarError::Protocol("x".into()).kind(), ErrorKind::Protocol);
        assert_eq!(MyStarError::Parse("x".into()).kind(), ErrorKind::Parse);
        assert_eq!(MyStarError::auth("x").kind(), ErrorKind::AuthenticationFailed);

        assert!(MyStarError::Protocol("HTTP 503".into()).is_retryable());
        assert!(!MyStarError::Parse("no resume path".into()).is_retryable());
        assert!(!MyStarError::auth("ERR001").is_retryable());
    }

    #[test]
    fn kind_display_matches_public_names() {
        assert_eq!(ErrorKind::Protocol.to_string(), "ProtocolError");
        assert_eq!(ErrorKind::AuthenticationFailed.to_string(), "AuthenticationFailed");
    }
}
