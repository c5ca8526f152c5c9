//! Authentication engine and HTTP plumbing shared by MyStar crates.
//!
//! - [`auth`]: OIDC discovery, PKCE, authorization code acquisition, token
//!   exchange and refresh
//! - [`http`]: the per-session cookie-bearing HTTP client
//! - [`error`]: transport error conversion into [`mystar_domain::MyStarError`]

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod error;
pub mod http;

pub use error::IntoMyStarError;
pub use http::SessionClientBuilder;
