//! # MyStar Domain
//!
//! Domain types shared by the MyStar session engine.
//!
//! This crate contains:
//! - Vehicle data types (`CarSnapshot`, `ChargingStatus`, `VehicleInfo`)
//! - Authentication inputs and provider metadata (`Credentials`,
//!   `OidcConfiguration`)
//! - The observable session state record
//! - Domain error types and Result definitions
//! - Configuration structures and provider constants
//!
//! ## Architecture
//! - No dependencies on other MyStar crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
