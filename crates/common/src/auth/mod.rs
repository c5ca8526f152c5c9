//! Authentication engine for the telemetry provider
//!
//! OAuth 2.0 Authorization Code flow with PKCE against one hard-wired OIDC
//! provider whose login step is an HTML form rather than an API.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────┐
//! │ AuthorizationAcquirer │  GET authorize → redirect with code, or
//! └──────────┬────────────┘  scrape login page → POST credentials
//!            │
//!            ├──► DiscoveryClient     (.well-known/openid-configuration)
//!            ├──► PkceParameters      (verifier / challenge / state)
//!            └──► ResumePathScraper   (ordered extraction strategies)
//!
//! ┌───────────────────────┐
//! │ TokenManager          │  exchange, refresh-before-expiry, current token
//! └──────────┬────────────┘
//!            └──► TokenEndpointClient  (OAuthClient in production)
//! ```
//!
//! All HTTP goes through one cookie-bearing client per session, built by
//! [`crate::http::SessionClientBuilder`].
//!
//! # Module Organization
//!
//! - **[`pkce`]**: verifier, challenge and state generation
//! - **[`discovery`]**: OIDC discovery document client
//! - **[`acquirer`]**: authorization code acquisition
//! - **[`resume_path`]**: login page scraping strategies
//! - **[`client`]**: token endpoint client
//! - **[`token_manager`]**: token lifecycle
//! - **[`types`]**: token wire types and state
//! - **[`traits`]**: token endpoint seam

pub mod acquirer;
pub mod client;
pub mod discovery;
pub mod pkce;
pub mod resume_path;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use acquirer::AuthorizationAcquirer;
pub use client::OAuthClient;
pub use discovery::DiscoveryClient;
pub use pkce::{
    generate_code_challenge, generate_code_verifier, generate_state, validate_state,
    PkceParameters,
};
pub use resume_path::{RegexExtractor, ResumePathExtractor, ResumePathScraper};
pub use token_manager::TokenManager;
pub use traits::TokenEndpointClient;
pub use types::{OAuthError, TokenResponse, TokenState};
