//! PKCE (Proof Key for Code Exchange) for the authorization request
//!
//! Implements the S256 method of RFC 7636. The provider is a public client
//! registration, so the verifier is the only proof binding the authorization
//! request to the token exchange.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Number of random bytes behind verifier and state (43 base64url chars).
const RANDOM_BYTES: usize = 32;

fn random_token() -> String {
    let mut bytes = [0u8; RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a cryptographically secure code verifier
///
/// Returns 32 random bytes as unpadded base64url: 43 characters, inside the
/// 43-128 range RFC 7636 allows.
#[must_use]
pub fn generate_code_verifier() -> String {
    random_token()
}

/// `BASE64URL(SHA256(ASCII(code_verifier)))`
#[must_use]
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate a random state token for CSRF protection
#[must_use]
pub fn generate_state() -> String {
    random_token()
}

/// Compare the state sent in the authorization request with the one echoed
/// back by the provider.
#[must_use]
pub fn validate_state(expected: &str, actual: &str) -> bool {
    expected.len() == actual.len()
        && expected.bytes().zip(actual.bytes()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

/// Verifier, challenge and state for one authorization attempt.
///
/// Created fresh per attempt and never reused.
#[derive(Debug, Clone)]
pub struct PkceParameters {
    /// Kept secret until token exchange
    pub code_verifier: String,
    /// Sent in the authorization request
    pub code_challenge: String,
    pub state: String,
}

impl PkceParameters {
    /// Generate a new set of parameters.
    ///
    /// # Examples
    /// ```
    /// use mystar_common::auth::PkceParameters;
    ///
    /// let pkce = PkceParameters::generate();
    /// assert_eq!(pkce.code_verifier.len(), 43);
    /// assert_eq!(pkce.challenge_method(), "S256");
    /// ```
    #[must_use]
    pub fn generate() -> Self {
        let code_verifier = generate_code_verifier();
        let code_challenge = generate_code_challenge(&code_verifier);
        Self { code_verifier, code_challenge, state: generate_state() }
    }

    /// Always `S256`
    #[must_use]
    pub const fn challenge_method(&self) -> &'static str {
        "S256"
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for auth::pkce.
    use super::*;

    /// Validates the length and alphabet of generated parameters.
    ///
    /// Assertions:
    /// - Verifier is exactly 43 characters.
    /// - Verifier, challenge and state contain no padding or non-URL-safe
    ///   characters.
    #[test]
    fn test_generate_pkce_parameters() {
        let pkce = PkceParameters::generate();

        assert_eq!(pkce.code_verifier.len(), 43);
        assert_eq!(pkce.state.len(), 43);
        for value in [&pkce.code_verifier, &pkce.code_challenge, &pkce.state] {
            assert!(
                value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "unexpected character in {value}"
            );
        }
    }

    /// Each attempt must get fresh values.
    #[test]
    fn test_unique_parameters() {
        let first = PkceParameters::generate();
        let second = PkceParameters::generate();

        assert_ne!(first.code_verifier, second.code_verifier);
        assert_ne!(first.code_challenge, second.code_challenge);
        assert_ne!(first.state, second.state);
    }

    /// RFC 7636 Appendix B test vector.
    #[test]
    fn test_code_challenge_known_vector() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            generate_code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_code_challenge_matches_verifier() {
        let pkce = PkceParameters::generate();
        assert_eq!(pkce.code_challenge, generate_code_challenge(&pkce.code_verifier));
    }

    #[test]
    fn test_validate_state() {
        assert!(validate_state("abc", "abc"));
        assert!(!validate_state("abc", "abd"));
        assert!(!validate_state("abc", "abcd"));
    }
}
