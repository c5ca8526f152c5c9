//! Seam between the token manager and the token endpoint
//!
//! The token manager runs against an in-memory endpoint in unit tests and
//! against [`super::client::OAuthClient`] in production.

use async_trait::async_trait;
use mystar_domain::Result;

use super::types::TokenResponse;

/// Token endpoint operations
#[async_trait]
pub trait TokenEndpointClient: Send + Sync {
    /// Exchange an authorization code for tokens (`grant_type=authorization_code`).
    ///
    /// # Errors
    /// `AuthenticationFailed` when the provider reports an OAuth error,
    /// `Protocol` for any other unexpected response.
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenResponse>;

    /// Obtain a new access token (`grant_type=refresh_token`).
    ///
    /// # Errors
    /// Same as [`TokenEndpointClient::exchange_code`].
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse>;
}
