//! # MyStar Infrastructure
//!
//! Network-facing services built on the authentication engine in
//! `mystar-common`.
//!
//! This crate contains:
//! - The GraphQL telemetry client
//! - The session scheduler (authenticate, recurring poll, stop)
//! - Layered configuration loading
//!
//! ## Architecture
//! - Depends on `mystar-domain` and `mystar-common`
//! - Contains all long-running tasks

pub mod config;
pub mod session;
pub mod telemetry;

// Re-export commonly used items
pub use session::MyStarSession;
pub use telemetry::TelemetryClient;
