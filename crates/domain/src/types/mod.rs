//! Domain types and models

pub mod auth;
pub mod session;
pub mod vehicle;

pub use auth::{Credentials, OidcConfiguration};
pub use session::SessionState;
pub use vehicle::{CarSnapshot, ChargingStatus, VehicleInfo};
