//! Browser-less authorization code acquisition
//!
//! ```text
//! DirectAttempt ──code in redirect──────────────────────────► Done
//!      │
//!      └─login page─► ScrapeLogin ─► SubmitCredentials ─302/303 + code─► Done
//!                          │                 │
//!                      ParseError     ERR001 ─► AuthenticationFailed
//!                                     other  ─► ProtocolError
//! ```
//!
//! The provider sometimes completes the authorization request from an
//! existing session cookie and sometimes shows its login form; which one
//! applies is only known from the response.

use mystar_domain::constants::{LOGIN_ERROR_MARKER, PUBLIC_SITE_HOST};
use mystar_domain::{Credentials, MyStarError, OidcConfiguration, ProviderConfig, Result};
use reqwest::header::LOCATION;
use reqwest::{Client, Response};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::pkce::{validate_state, PkceParameters};
use super::resume_path::{resolve_resume_url, ResumePathScraper};
use super::types::redact;
use crate::error::IntoMyStarError;

/// Drives one authorization attempt over a cookie-bearing session client.
#[derive(Debug)]
pub struct AuthorizationAcquirer {
    http: Client,
    provider: ProviderConfig,
    scraper: ResumePathScraper,
}

impl AuthorizationAcquirer {
    /// `http` must keep cookies between requests and must not follow the
    /// redirect to `redirect_uri` (see [`crate::http::SessionClientBuilder`]).
    ///
    /// # Errors
    /// [`MyStarError::Parse`] if the built-in scraper patterns fail to
    /// compile.
    pub fn new(http: Client, provider: ProviderConfig) -> Result<Self> {
        Ok(Self { http, provider, scraper: ResumePathScraper::standard()? })
    }

    #[must_use]
    pub fn with_scraper(http: Client, provider: ProviderConfig, scraper: ResumePathScraper) -> Self {
        Self { http, provider, scraper }
    }

    /// Authorization request URL for `pkce`.
    ///
    /// # Errors
    /// [`MyStarError::Protocol`] if the advertised endpoint is not a URL.
    pub fn authorization_url(&self, endpoint: &str, pkce: &PkceParameters) -> Result<Url> {
        Url::parse_with_params(
            endpoint,
            &[
                ("client_id", self.provider.client_id.as_str()),
                ("redirect_uri", self.provider.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", self.provider.scope.as_str()),
                ("state", pkce.state.as_str()),
                ("code_challenge", pkce.code_challenge.as_str()),
                ("code_challenge_method", pkce.challenge_method()),
                ("response_mode", "query"),
            ],
        )
        .map_err(|err| {
            MyStarError::Protocol(format!("invalid authorization endpoint {endpoint}: {err}"))
        })
    }

    /// Obtain an authorization code for `credentials`.
    ///
    /// # Errors
    /// - [`MyStarError::Parse`] when the login page matches no known layout
    /// - [`MyStarError::AuthenticationFailed`] on rejected credentials, a
    ///   state mismatch or when the provider sends its public website
    /// - [`MyStarError::Protocol`] for any other unexpected response
    #[instrument(skip_all, fields(email = %credentials.email))]
    pub async fn acquire(
        &self,
        oidc: &OidcConfiguration,
        pkce: &PkceParameters,
        credentials: &Credentials,
    ) -> Result<String> {
        let url = self.authorization_url(&oidc.authorization_endpoint, pkce)?;
        let response = self.http.get(url).send().await.map_err(IntoMyStarError::into_mystar)?;
        debug!(status = %response.status(), url = %response.url(), "authorization response");

        if let Some(code) = code_from_response(&response, &pkce.state)? {
            info!(code = %redact(&code), "authorization completed by redirect");
            return Ok(code);
        }

        let html = response.text().await.map_err(IntoMyStarError::into_mystar)?;
        if looks_like_public_site(&html) {
            warn!("authorization request landed on the public website");
            return Err(MyStarError::auth(
                "provider returned its public website instead of the login page",
            ));
        }

        let resume_path = self.scraper.extract(&html)?;
        let target = resolve_resume_url(&self.provider.oidc_provider_url, &resume_path);
        self.submit_credentials(&target, pkce, credentials).await
    }

    async fn submit_credentials(
        &self,
        target: &str,
        pkce: &PkceParameters,
        credentials: &Credentials,
    ) -> Result<String> {
        debug!(%target, "submitting login form");
        let response = self
            .http
            .post(target)
            .form(&[
                ("pf.username", credentials.email.as_str()),
                ("pf.pass", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(IntoMyStarError::into_mystar)?;

        let status = response.status();
        if let Some(code) = code_from_response(&response, &pkce.state)? {
            info!(code = %redact(&code), "authorization completed by login");
            return Ok(code);
        }

        let body = response.text().await.map_err(IntoMyStarError::into_mystar)?;
        if body.contains(LOGIN_ERROR_MARKER) {
            warn!("login rejected by provider");
            return Err(MyStarError::auth_with_code(
                LOGIN_ERROR_MARKER,
                "invalid email or password",
            ));
        }

        Err(MyStarError::Protocol(format!(
            "login submission returned HTTP {status} without an authorization code"
        )))
    }
}

/// Authorization code carried by a response, either in its final URL or in
/// the `Location` of a 302/303 that was not followed.
fn code_from_response(response: &Response, expected_state: &str) -> Result<Option<String>> {
    if let Some(code) = code_from_url(response.url(), expected_state)? {
        return Ok(Some(code));
    }

    let status = response.status().as_u16();
    if !matches!(status, 301 | 302 | 303 | 307 | 308) {
        return Ok(None);
    }

    let Some(location) = response.headers().get(LOCATION).and_then(|v| v.to_str().ok()) else {
        return Ok(None);
    };
    match response.url().join(location) {
        Ok(next) => code_from_url(&next, expected_state),
        Err(err) => {
            debug!(%location, error = %err, "unparseable Location header");
            Ok(None)
        }
    }
}

/// `code` query parameter of `url`.
///
/// A `state` parameter, when present, must equal the one sent.
fn code_from_url(url: &Url, expected_state: &str) -> Result<Option<String>> {
    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" if !value.is_empty() => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            _ => {}
        }
    }

    let Some(code) = code else {
        return Ok(None);
    };
    if let Some(state) = state {
        if !validate_state(expected_state, &state) {
            return Err(MyStarError::auth_with_code(
                "state_mismatch",
                "authorization response state does not match the request",
            ));
        }
    }
    Ok(Some(code))
}

fn looks_like_public_site(html: &str) -> bool {
    html.contains(PUBLIC_SITE_HOST) && !html.contains("authorization") && !html.contains("login")
}
