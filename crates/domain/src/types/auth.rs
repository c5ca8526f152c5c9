//! Authentication inputs and provider metadata

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{MyStarError, Result};

/// Account credentials and the vehicle to track.
///
/// Owned by the caller and passed by value into the engine; never persisted
/// by it. `Debug` never prints the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub vin: String,
}

impl Credentials {
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        vin: impl Into<String>,
    ) -> Self {
        Self { email: email.into(), password: password.into(), vin: vin.into() }
    }

    /// Reject empty fields. No other validation is performed.
    ///
    /// # Errors
    /// Returns [`MyStarError::AuthenticationFailed`] naming the first empty
    /// field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in
            [("email", &self.email), ("password", &self.password), ("vin", &self.vin)]
        {
            if value.trim().is_empty() {
                return Err(MyStarError::auth_with_code(
                    "missing_credentials",
                    format!("{field} must not be empty"),
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("vin", &self.vin)
            .finish()
    }
}

/// Endpoints advertised by the provider's discovery document.
///
/// Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConfiguration {
    pub issuer: String,
    pub token_endpoint: String,
    pub authorization_endpoint: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let creds = Credentials::new("driver@example.com", "hunter2", "YSMYKEAE1RB000001");
        let debug = format!("{creds:?}");
        assert!(debug.contains("driver@example.com"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn validate_rejects_blank_fields() {
        assert!(Credentials::new("a@b.c", "pw", "VIN").validate().is_ok());

        let err = Credentials::new("a@b.c", "pw", "  ").validate().unwrap_err();
        assert!(err.to_string().contains("vin must not be empty"));

        let err = Credentials::new("", "pw", "VIN").validate().unwrap_err();
        assert!(err.to_string().contains("email"));
    }
}
