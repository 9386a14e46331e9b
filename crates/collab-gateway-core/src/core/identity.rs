// crates/collab-gateway-core/src/core/identity.rs
// ============================================================================
// Module: Caller Identity
// Description: Resolved caller identity and opaque access tokens.
// Purpose: Carry who is calling without exposing credential material.
// Dependencies: serde, sha2
// ============================================================================

//! ## Overview
//! [`Identity`] is what the collaborator reports for the signed-in caller. An
//! empty identity is a valid value and stands for an unauthenticated caller.
//! [`AccessToken`] wraps the bearer credential so it never appears in debug
//! output or logs; a short SHA-256 fingerprint is available for correlation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fmt::Write as _;

use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Identity
// ============================================================================

/// Resolved caller identity.
///
/// # Invariants
/// - All fields empty means "unauthenticated".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Directory object identifier of the caller.
    pub user_id: String,
    /// Human-readable display name.
    pub display_name: String,
    /// Principal (sign-in) name.
    pub principal_name: String,
    /// Tenant the identity belongs to.
    pub tenant_id: String,
}

impl Identity {
    /// Returns the identity used for unauthenticated callers.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Returns true when no caller is identified.
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_empty() && self.principal_name.is_empty()
    }
}

// ============================================================================
// SECTION: Access Token
// ============================================================================

/// Number of hex characters kept from the token digest.
const FINGERPRINT_HEX_LEN: usize = 12;

/// Opaque bearer token.
///
/// # Invariants
/// - `Debug` and `Display` never print the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps a raw token value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token value for transmission to the issuer's audience.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns a short, log-safe SHA-256 fingerprint of the token.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        let mut out = String::with_capacity(FINGERPRINT_HEX_LEN);
        for byte in digest.iter().take(FINGERPRINT_HEX_LEN / 2) {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken(sha256:{})", self.fingerprint())
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.fingerprint())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::use_debug,
        reason = "Test-only assertions use unwrap/expect for clarity."
    )]

    use super::AccessToken;
    use super::Identity;

    #[test]
    fn anonymous_identity_is_empty() {
        let identity = Identity::anonymous();
        assert!(identity.is_anonymous());
        assert!(identity.display_name.is_empty());
    }

    #[test]
    fn token_debug_does_not_leak_value() {
        let token = AccessToken::new("super-secret-token");
        let debug = format!("{token:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.starts_with("AccessToken(sha256:"));
        assert_eq!(token.fingerprint().len(), 12);
        assert_eq!(token.expose(), "super-secret-token");
    }

    #[test]
    fn fingerprint_is_stable() {
        let first = AccessToken::new("abc").fingerprint();
        let second = AccessToken::new("abc").fingerprint();
        assert_eq!(first, second);
        assert_ne!(first, AccessToken::new("abd").fingerprint());
    }
}
