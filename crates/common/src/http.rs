//! HTTP client used for one authentication session.

use std::time::Duration;

use mystar_domain::constants::{BROWSER_USER_AGENT, DEFAULT_HTTP_TIMEOUT_SECS, MAX_REDIRECTS};
use mystar_domain::{MyStarError, Result};
use reqwest::redirect::{Attempt, Policy};
use reqwest::Client;

use crate::error::IntoMyStarError;

/// Builder for the per-session [`reqwest::Client`].
///
/// The built client keeps a cookie jar for its whole lifetime, so every
/// request of one authentication attempt (and the telemetry polls that
/// follow) shares the provider's session cookies. Redirects are followed
/// until the next hop points at the registered redirect URI; that hop is
/// returned to the caller instead so the authorization code can be read
/// from it.
#[derive(Debug, Clone)]
pub struct SessionClientBuilder {
    redirect_uri: String,
    timeout: Duration,
    user_agent: String,
    max_redirects: usize,
}

impl SessionClientBuilder {
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: BROWSER_USER_AGENT.to_string(),
            max_redirects: MAX_REDIRECTS,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn max_redirects(mut self, max: usize) -> Self {
        self.max_redirects = max;
        self
    }

    /// # Errors
    /// Returns [`MyStarError::Protocol`] if the TLS backend cannot be
    /// initialised.
    pub fn build(self) -> Result<Client> {
        let stop_at = self.redirect_uri;
        let max_redirects = self.max_redirects;
        let policy = Policy::custom(move |attempt: Attempt<'_>| {
            if attempt.url().as_str().starts_with(&stop_at) {
                attempt.stop()
            } else if attempt.previous().len() > max_redirects {
                attempt.error(MyStarError::Protocol(format!(
                    "more than {max_redirects} redirects"
                )))
            } else {
                attempt.follow()
            }
        });

        Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent)
            .cookie_store(true)
            .redirect(policy)
            .no_proxy()
            .build()
            .map_err(IntoMyStarError::into_mystar)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::LOCATION;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn stops_before_following_redirect_uri() {
        let server = MockServer::start().await;
        let callback = format!("{}/sign-in-callback", server.uri());

        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(
                ResponseTemplate::new(302).insert_header(LOCATION, "/hop"),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/hop"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header(LOCATION, format!("{callback}?code=abc").as_str()),
            )
            .mount(&server)
            .await;
        // Never reached: the callback hop must not be followed.
        Mock::given(method("GET"))
            .and(path("/sign-in-callback"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = SessionClientBuilder::new(callback).build().unwrap();
        let response = client.get(format!("{}/start", server.uri())).send().await.unwrap();

        assert_eq!(response.status().as_u16(), 302);
        assert_eq!(response.url().path(), "/hop");
        let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
        assert!(location.ends_with("/sign-in-callback?code=abc"));
    }

    #[tokio::test]
    async fn redirect_loop_is_reported_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header(LOCATION, "/loop"))
            .mount(&server)
            .await;

        let client = SessionClientBuilder::new("https://callback.invalid/cb")
            .max_redirects(3)
            .build()
            .unwrap();
        let err = client
            .get(format!("{}/loop", server.uri()))
            .send()
            .await
            .unwrap_err()
            .into_mystar();

        assert!(err.to_string().contains("redirect"), "{err}");
    }
}
