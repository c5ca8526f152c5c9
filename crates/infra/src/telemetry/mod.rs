//! Telemetry API client
//!
//! Two GraphQL queries against the provider's API: the account's car list
//! (model name, studio image) and battery telematics for one VIN.

pub mod client;
pub mod queries;

pub use client::TelemetryClient;
