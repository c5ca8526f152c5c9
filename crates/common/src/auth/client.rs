//! Token endpoint client
//!
//! Handles the two form-encoded grants the provider supports:
//! - Authorization code exchange (with PKCE verifier)
//! - Token refresh

use async_trait::async_trait;
use mystar_domain::{MyStarError, ProviderConfig, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::traits::TokenEndpointClient;
use super::types::{OAuthError, TokenResponse};
use crate::error::IntoMyStarError;

/// OAuth 2.0 token endpoint client for a public (secret-less) client.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http: Client,
    token_endpoint: String,
    client_id: String,
    redirect_uri: String,
}

impl OAuthClient {
    /// Create a client for `token_endpoint`, usually taken from the
    /// discovery document.
    #[must_use]
    pub fn new(http: Client, token_endpoint: impl Into<String>, provider: &ProviderConfig) -> Self {
        Self {
            http,
            token_endpoint: token_endpoint.into(),
            client_id: provider.client_id.clone(),
            redirect_uri: provider.redirect_uri.clone(),
        }
    }

    async fn post_form(&self, grant: &str, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .http
            .post(&self.token_endpoint)
            .form(params)
            .send()
            .await
            .map_err(IntoMyStarError::into_mystar)?;

        let status = response.status();
        let body = response.text().await.map_err(IntoMyStarError::into_mystar)?;
        debug!(grant, %status, "token endpoint responded");

        parse_token_body(status, &body)
    }
}

/// Apply the token endpoint's error rules to a raw response.
///
/// An `error` field wins over the status code; a non-200 status without it is
/// a protocol failure.
fn parse_token_body(status: StatusCode, body: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        MyStarError::Protocol(format!("token endpoint returned HTTP {status} with non-JSON body: {err}"))
    })?;

    if value.get("error").is_some() {
        let oauth: OAuthError = serde_json::from_value(value).map_err(|err| {
            MyStarError::Protocol(format!("malformed OAuth error response: {err}"))
        })?;
        warn!(error = %oauth.error, %status, "token endpoint rejected the request");
        return Err(MyStarError::AuthenticationFailed {
            code: Some(oauth.error),
            message: oauth
                .error_description
                .unwrap_or_else(|| "token request rejected by provider".to_string()),
        });
    }

    if status != StatusCode::OK {
        return Err(MyStarError::Protocol(format!("token endpoint returned HTTP {status}")));
    }

    Ok(value)
}

fn token_response(value: Value) -> Result<TokenResponse> {
    let response: TokenResponse = serde_json::from_value(value)
        .map_err(|err| MyStarError::Protocol(format!("incomplete token response: {err}")))?;

    if response.expires_in <= 0 {
        return Err(MyStarError::Protocol(format!(
            "token response has non-positive expires_in: {}",
            response.expires_in
        )));
    }
    Ok(response)
}

#[async_trait]
impl TokenEndpointClient for OAuthClient {
    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenResponse> {
        let value = self
            .post_form(
                "authorization_code",
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", &self.client_id),
                    ("code", code),
                    ("redirect_uri", &self.redirect_uri),
                    ("code_verifier", code_verifier),
                ],
            )
            .await?;

        let response = token_response(value)?;
        if !matches!(response.refresh_token.as_deref(), Some(token) if !token.is_empty()) {
            return Err(MyStarError::Protocol(
                "token response is missing refresh_token".to_string(),
            ));
        }
        Ok(response)
    }

    #[instrument(skip_all)]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenResponse> {
        if refresh_token.is_empty() {
            return Err(MyStarError::auth("no refresh token available"));
        }

        let value = self
            .post_form(
                "refresh_token",
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", &self.client_id),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        token_response(value)
    }
}

#[cfg(test)]
mod tests {
    use mystar_domain::ErrorKind;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_for(server: &MockServer) -> OAuthClient {
        OAuthClient::new(
            Client::new(),
            format!("{}/as/token.oauth2", server.uri()),
            &ProviderConfig::default(),
        )
    }

    #[test]
    fn error_field_wins_over_http_200() {
        let err = parse_token_body(
            StatusCode::OK,
            r#"{"error":"invalid_grant","error_description":"code expired"}"#,
        )
        .unwrap_err();

        assert_eq!(
            err,
            MyStarError::AuthenticationFailed {
                code: Some("invalid_grant".into()),
                message: "code expired".into()
            }
        );
    }

    #[test]
    fn non_200_without_error_is_protocol() {
        let err = parse_token_body(StatusCode::BAD_GATEWAY, "{}").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn html_body_is_protocol() {
        let err = parse_token_body(StatusCode::OK, "<html>maintenance</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn exchange_posts_authorization_code_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/as/token.oauth2"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("client_id=l3oopkc_10"))
            .and(body_string_contains("code=abc123"))
            .and(body_string_contains("code_verifier=verifier"))
            .and(body_string_contains("redirect_uri=https%3A%2F%2Fwww.polestar.com%2Fsign-in-callback"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 1800,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).exchange_code("abc123", "verifier").await.unwrap();
        assert_eq!(response.access_token, "at");
        assert_eq!(response.refresh_token.as_deref(), Some("rt"));
        assert_eq!(response.expires_in, 1800);
    }

    #[tokio::test]
    async fn exchange_requires_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "expires_in": 1800
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange_code("abc", "v").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("refresh_token"));
    }

    #[tokio::test]
    async fn refresh_without_expires_in_is_protocol() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("grant_type=refresh_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"access_token": "at"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).refresh_access_token("rt").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("expires_in"));
    }

    #[tokio::test]
    async fn non_positive_expires_in_is_protocol() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "at",
                "refresh_token": "rt",
                "expires_in": 0
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).exchange_code("abc", "v").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("expires_in"));
    }

    #[tokio::test]
    async fn refresh_error_with_http_400_is_authentication_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).refresh_access_token("rt").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Authentication failed: invalid_grant: token request rejected by provider"
        );
    }
}
