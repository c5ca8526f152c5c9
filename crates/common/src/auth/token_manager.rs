//! Token manager with refresh-before-expiry
//!
//! Single writer of the session's [`TokenState`]:
//! - Code exchange after a successful authorization
//! - Refresh when the access token is within the threshold of expiry
//! - Serialised refreshes, so concurrent callers trigger at most one request

use std::sync::Arc;

use chrono::Utc;
use mystar_domain::{MyStarError, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use super::traits::TokenEndpointClient;
use super::types::TokenState;

/// Owns the token state of one session.
pub struct TokenManager<C: TokenEndpointClient> {
    endpoint: Arc<C>,
    state: RwLock<Option<TokenState>>,
    refresh_lock: Mutex<()>,
    refresh_threshold_seconds: i64,
}

impl<C: TokenEndpointClient> TokenManager<C> {
    /// # Arguments
    /// * `endpoint` - token endpoint used for exchange and refresh
    /// * `refresh_threshold_seconds` - refresh when the access token expires
    ///   within this many seconds (300 in production)
    #[must_use]
    pub fn new(endpoint: Arc<C>, refresh_threshold_seconds: i64) -> Self {
        Self {
            endpoint,
            state: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            refresh_threshold_seconds,
        }
    }

    /// Exchange an authorization code and install the resulting tokens.
    ///
    /// # Errors
    /// Propagates the endpoint error; the previous state is left untouched.
    #[instrument(skip_all)]
    pub async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenState> {
        let response = self.endpoint.exchange_code(code, code_verifier).await?;
        let tokens = TokenState::from_response(response, None, Utc::now())?;
        info!(expires_at = %tokens.expires_at, "access token obtained");

        *self.state.write().await = Some(tokens.clone());
        Ok(tokens)
    }

    /// Refresh the access token unconditionally.
    ///
    /// # Errors
    /// `AuthenticationFailed` when no tokens exist yet, otherwise the
    /// endpoint error. A failed refresh keeps the old state.
    #[instrument(skip_all)]
    pub async fn refresh(&self) -> Result<TokenState> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<TokenState> {
        let previous_refresh = self
            .state
            .read()
            .await
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
            .ok_or_else(|| MyStarError::auth("not authenticated"))?;

        let response = self.endpoint.refresh_access_token(&previous_refresh).await?;
        let tokens = TokenState::from_response(response, Some(&previous_refresh), Utc::now())?;
        info!(expires_at = %tokens.expires_at, "access token refreshed");

        *self.state.write().await = Some(tokens.clone());
        Ok(tokens)
    }

    /// Access token valid for more than the refresh threshold, refreshing
    /// first when necessary.
    ///
    /// # Errors
    /// `AuthenticationFailed` when not authenticated, or the refresh error.
    pub async fn current_access_token(&self) -> Result<String> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while this one waited.
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        debug!("access token within refresh threshold");
        Ok(self.refresh_locked().await?.access_token)
    }

    async fn fresh_token(&self) -> Option<String> {
        self.state
            .read()
            .await
            .as_ref()
            .filter(|tokens| !tokens.is_expired(self.refresh_threshold_seconds))
            .map(|tokens| tokens.access_token.clone())
    }

    /// Current token state, if any.
    pub async fn tokens(&self) -> Option<TokenState> {
        self.state.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Drop the tokens (session teardown).
    pub async fn clear(&self) {
        *self.state.write().await = None;
    }
}
