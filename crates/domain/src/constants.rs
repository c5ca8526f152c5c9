//! Provider constants
//!
//! Centralized location for the fixed endpoints and flow quirks of the
//! telemetry provider. Every value here is a default of
//! [`crate::config::ProviderConfig`] and can be overridden by configuration.

// Identity provider
pub const OIDC_PROVIDER_URL: &str = "https://polestarid.eu.polestar.com";
pub const OIDC_CLIENT_ID: &str = "l3oopkc_10";
pub const OIDC_REDIRECT_URI: &str = "https://www.polestar.com/sign-in-callback";
pub const OIDC_SCOPE: &str = "openid profile email customer:attributes";
pub const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

// Telemetry API
pub const API_BASE_URL: &str = "https://pc-api.polestar.com/eu-north-1/mystar-v2/";

/// Sent on the authorization request; the login page is only served to
/// browser-like agents.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Host of the provider's public website. Landing there instead of on the
/// login form means the authorization flow was rejected.
pub const PUBLIC_SITE_HOST: &str = "www.polestar.com";

/// Marker the login page embeds when the submitted credentials are wrong.
pub const LOGIN_ERROR_MARKER: &str = "ERR001";

// Session timing
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 300;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const MAX_POLL_INTERVAL_SECS: u64 = 86_400;
pub const MAX_HTTP_TIMEOUT_SECS: u64 = 3_600;
pub const MAX_REDIRECTS: usize = 10;
