//! OIDC discovery document client

use mystar_domain::{MyStarError, OidcConfiguration, Result};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::error::IntoMyStarError;

/// Fetches and caches the provider's `.well-known/openid-configuration`.
///
/// One instance lives for one session; a new session builds a new client and
/// therefore re-fetches the document.
#[derive(Debug)]
pub struct DiscoveryClient {
    http: Client,
    discovery_url: String,
    cached: OnceCell<OidcConfiguration>,
}

impl DiscoveryClient {
    #[must_use]
    pub fn new(http: Client, discovery_url: impl Into<String>) -> Self {
        Self { http, discovery_url: discovery_url.into(), cached: OnceCell::new() }
    }

    /// Cached configuration, fetching it on first use.
    ///
    /// # Errors
    /// See [`DiscoveryClient::fetch_configuration`]. A failed fetch is not
    /// cached.
    pub async fn configuration(&self) -> Result<OidcConfiguration> {
        self.cached.get_or_try_init(|| self.fetch_configuration()).await.cloned()
    }

    /// Always fetch the document, bypassing the cache.
    ///
    /// # Errors
    /// [`MyStarError::Protocol`] when the status is not 200 or `issuer`,
    /// `token_endpoint` or `authorization_endpoint` is missing or not a
    /// string.
    #[instrument(skip(self), fields(url = %self.discovery_url))]
    pub async fn fetch_configuration(&self) -> Result<OidcConfiguration> {
        let response = self
            .http
            .get(&self.discovery_url)
            .send()
            .await
            .map_err(IntoMyStarError::into_mystar)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(MyStarError::Protocol(format!("OIDC discovery returned HTTP {status}")));
        }

        let body: Value = response.json().await.map_err(|err| {
            MyStarError::Protocol(format!("OIDC discovery body is not JSON: {err}"))
        })?;
        debug!("discovery document received");

        let configuration = OidcConfiguration {
            issuer: required_string(&body, "issuer")?,
            token_endpoint: required_string(&body, "token_endpoint")?,
            authorization_endpoint: required_string(&body, "authorization_endpoint")?,
        };
        info!(issuer = %configuration.issuer, "OIDC configuration loaded");
        Ok(configuration)
    }
}

fn required_string(body: &Value, field: &str) -> Result<String> {
    body.get(field).and_then(Value::as_str).map(str::to_string).ok_or_else(|| {
        MyStarError::Protocol(format!("OIDC discovery document lacks string field `{field}`"))
    })
}

#[cfg(test)]
mod tests {
    use mystar_domain::ErrorKind;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const WELL_KNOWN: &str = "/.well-known/openid-configuration";

    async fn serve(body: ResponseTemplate, expected_calls: u64) -> (MockServer, DiscoveryClient) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(WELL_KNOWN))
            .respond_with(body)
            .expect(expected_calls)
            .mount(&server)
            .await;
        let client = DiscoveryClient::new(Client::new(), format!("{}{WELL_KNOWN}", server.uri()));
        (server, client)
    }

    #[tokio::test]
    async fn parses_required_endpoints_exactly() {
        let (_server, client) = serve(
            ResponseTemplate::new(200).set_body_json(json!({
                "issuer": "I",
                "token_endpoint": "T",
                "authorization_endpoint": "A",
                "jwks_uri": "J"
            })),
            1,
        )
        .await;

        let config = client.fetch_configuration().await.unwrap();
        assert_eq!(
            config,
            OidcConfiguration {
                issuer: "I".into(),
                token_endpoint: "T".into(),
                authorization_endpoint: "A".into()
            }
        );
    }

    #[tokio::test]
    async fn cached_configuration_fetches_once() {
        let (_server, client) = serve(
            ResponseTemplate::new(200).set_body_json(json!({
                "issuer": "I", "token_endpoint": "T", "authorization_endpoint": "A"
            })),
            1,
        )
        .await;

        let first = client.configuration().await.unwrap();
        let second = client.configuration().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn non_200_is_protocol_error() {
        let (_server, client) = serve(ResponseTemplate::new(503), 1).await;
        let err = client.fetch_configuration().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn wrong_typed_field_is_protocol_error() {
        let (_server, client) = serve(
            ResponseTemplate::new(200).set_body_json(json!({
                "issuer": "I", "token_endpoint": 42, "authorization_endpoint": "A"
            })),
            1,
        )
        .await;

        let err = client.fetch_configuration().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert!(err.to_string().contains("token_endpoint"));
    }
}
