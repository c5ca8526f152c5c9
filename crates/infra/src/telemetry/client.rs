//! GraphQL client for the telemetry API

use chrono::Utc;
use mystar_common::IntoMyStarError;
use mystar_domain::{CarSnapshot, MyStarError, Result, VehicleInfo};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::queries::{
    decode_telemetry, decode_vehicle_info, CAR_TELEMATICS_QUERY, CONSUMER_CARS_QUERY,
};

/// Issues the vehicle metadata and battery telematics queries.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    http: Client,
    api_base_url: String,
}

impl TelemetryClient {
    /// # Arguments
    /// * `http` - the session's HTTP client
    /// * `api_base_url` - GraphQL endpoint, posted to as-is
    #[must_use]
    pub fn new(http: Client, api_base_url: impl Into<String>) -> Self {
        Self { http, api_base_url: api_base_url.into() }
    }

    /// Model name and studio image of `vin`.
    ///
    /// A VIN that is not on the account is not an error; both fields are
    /// `None`.
    ///
    /// # Errors
    /// [`MyStarError::Protocol`] on HTTP or GraphQL failure.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_vehicle_info(&self, vin: &str, access_token: &str) -> Result<VehicleInfo> {
        let data = self.execute_graphql(CONSUMER_CARS_QUERY, None, access_token).await?;
        let info = decode_vehicle_info(&data, vin)?;
        info!(
            model = info.model_name.as_deref().unwrap_or("unknown"),
            has_image = info.image_url.is_some(),
            "vehicle metadata retrieved"
        );
        Ok(info)
    }

    /// Battery telemetry of `vin`, without vehicle metadata.
    ///
    /// # Errors
    /// [`MyStarError::Protocol`] on HTTP or GraphQL failure or when no
    /// battery record is returned.
    #[instrument(skip(self, access_token))]
    pub async fn fetch_telemetry(&self, vin: &str, access_token: &str) -> Result<CarSnapshot> {
        let variables = json!({ "vins": [vin] });
        let data = self.execute_graphql(CAR_TELEMATICS_QUERY, Some(variables), access_token).await?;
        let snapshot = decode_telemetry(&data, vin, Utc::now())?;
        info!(
            battery = snapshot.battery_percentage,
            range_km = snapshot.range_km,
            status = %snapshot.charging_status,
            "telemetry retrieved"
        );
        Ok(snapshot)
    }

    /// Execute a GraphQL query and return its `data` object.
    ///
    /// A non-empty `errors` array fails the call regardless of HTTP status or
    /// the presence of `data`.
    async fn execute_graphql(
        &self,
        query: &str,
        variables: Option<Value>,
        access_token: &str,
    ) -> Result<Value> {
        let mut request_body = json!({ "query": query });
        if let Some(vars) = variables {
            request_body["variables"] = vars;
        }

        let response = self
            .http
            .post(&self.api_base_url)
            .bearer_auth(access_token)
            .json(&request_body)
            .send()
            .await
            .map_err(IntoMyStarError::into_mystar)?;

        let status = response.status();
        debug!(status = status.as_u16(), "received GraphQL response");

        if status != StatusCode::OK {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MyStarError::Protocol(format!(
                "telemetry API error (HTTP {status}): {}",
                error_text.chars().take(200).collect::<String>()
            )));
        }

        let envelope: GraphQLResponse = response.json().await.map_err(|err| {
            MyStarError::Protocol(format!("failed to parse GraphQL response: {err}"))
        })?;

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            let combined = errors.into_iter().map(|e| e.message).collect::<Vec<_>>().join(", ");
            return Err(MyStarError::Protocol(format!("GraphQL errors: {combined}")));
        }

        envelope
            .data
            .filter(|data| !data.is_null())
            .ok_or_else(|| MyStarError::Protocol("GraphQL response missing data field".into()))
    }
}

#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    #[serde(default)]
    message: String,
}
