//! Conversions from transport errors into [`MyStarError`].
//!
//! Network failures are reported as protocol errors: the session engine does
//! not distinguish "could not reach the provider" from "the provider answered
//! nonsense".

use mystar_domain::MyStarError;
use reqwest::Error as HttpError;

/// Extension trait to make the conversion explicit at call sites:
/// `.map_err(IntoMyStarError::into_mystar)`.
pub trait IntoMyStarError {
    fn into_mystar(self) -> MyStarError;
}

impl IntoMyStarError for HttpError {
    fn into_mystar(self) -> MyStarError {
        if self.is_timeout() {
            return MyStarError::Protocol("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MyStarError::Protocol(format!("HTTP connection failure: {self}"));
        }

        if self.is_redirect() {
            return MyStarError::Protocol(format!("redirect chain aborted: {self}"));
        }

        if let Some(status) = self.status() {
            return MyStarError::Protocol(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown status")
            ));
        }

        if self.is_decode() {
            return MyStarError::Parse(format!("failed to decode response body: {self}"));
        }

        MyStarError::Protocol(self.to_string())
    }
}
