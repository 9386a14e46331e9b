// crates/collab-gateway-core/src/core/session.rs
// ============================================================================
// Module: Session Record
// Description: Cached access session and session lifecycle states.
// Purpose: Define the single validity rule every session consumer applies.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! A [`Session`] is the cached access token plus its expiry, tenant, and
//! granted scopes. It is valid only while `now < expires_at - 5 minutes`.
//! Sessions are replaced wholesale on refresh and never mutated in place.
//! [`SessionState`] names the states the session manager moves through.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Serialize;
use time::Duration;
use time::OffsetDateTime;

use crate::core::credential::CredentialSourceKind;
use crate::core::identity::AccessToken;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Safety margin subtracted from the token expiry before it is considered stale.
pub const SESSION_SAFETY_MARGIN: Duration = Duration::minutes(5);

// ============================================================================
// SECTION: Session
// ============================================================================

/// How a session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum SessionSource {
    /// Exchanged from a detected external credential.
    ExternalCredential(CredentialSourceKind),
    /// Completed through the device-code flow.
    DeviceCode,
}

/// Cached access session.
///
/// # Invariants
/// - Immutable once built; refresh produces a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for the collaborator.
    pub access_token: AccessToken,
    /// Token expiry reported by the issuer.
    pub expires_at: OffsetDateTime,
    /// Tenant the token was issued for.
    pub tenant_id: Option<String>,
    /// Scopes granted with the token.
    pub scopes: BTreeSet<String>,
    /// Account label reported by the issuer, when known.
    pub account: Option<String>,
    /// Credential path that produced the session.
    pub source: SessionSource,
}

impl Session {
    /// Returns the instant after which the session must not be used.
    #[must_use]
    pub fn stale_at(&self) -> Option<OffsetDateTime> {
        self.expires_at.checked_sub(SESSION_SAFETY_MARGIN)
    }

    /// Returns true when the session may be used at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        self.stale_at().is_some_and(|deadline| now < deadline)
    }
}

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Session manager lifecycle state.
///
/// # Invariants
/// - Labels are stable for audit output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No session and no refresh in progress.
    #[default]
    Unauthenticated,
    /// Running credential source detection.
    Detecting,
    /// Exchanging a detected external credential for a token.
    UsingExternalCredential,
    /// Waiting for the caller to complete device-code verification.
    DeviceCodePending,
    /// A valid session is cached.
    Authenticated,
    /// The cached session passed its safety deadline.
    Expired,
}

impl SessionState {
    /// Returns a stable label for the state.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Detecting => "detecting",
            Self::UsingExternalCredential => "using_external_credential",
            Self::DeviceCodePending => "device_code_pending",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
        }
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
        reason = "Test-only assertions use unwrap/expect for clarity."
    )]

    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use time::Duration;
    use time::OffsetDateTime;

    use super::SESSION_SAFETY_MARGIN;
    use super::Session;
    use super::SessionSource;
    use crate::core::identity::AccessToken;

    fn session_expiring_at(expires_at: OffsetDateTime) -> Session {
        Session {
            access_token: AccessToken::new("token"),
            expires_at,
            tenant_id: Some("tenant".to_string()),
            scopes: BTreeSet::new(),
            account: None,
            source: SessionSource::DeviceCode,
        }
    }

    #[test]
    fn session_valid_just_before_margin() {
        let expires_at = OffsetDateTime::UNIX_EPOCH + Duration::days(1);
        let session = session_expiring_at(expires_at);
        let now = expires_at - SESSION_SAFETY_MARGIN - Duration::seconds(1);
        assert!(session.is_valid_at(now));
    }

    #[test]
    fn session_invalid_at_margin() {
        let expires_at = OffsetDateTime::UNIX_EPOCH + Duration::days(1);
        let session = session_expiring_at(expires_at);
        assert!(!session.is_valid_at(expires_at - SESSION_SAFETY_MARGIN));
    }

    #[test]
    fn session_invalid_inside_margin_before_expiry() {
        let expires_at = OffsetDateTime::UNIX_EPOCH + Duration::days(1);
        let session = session_expiring_at(expires_at);
        let now = expires_at - SESSION_SAFETY_MARGIN + Duration::seconds(1);
        assert!(now < expires_at);
        assert!(!session.is_valid_at(now));
    }

    proptest! {
        #[test]
        fn validity_matches_margin_rule(
            expiry_secs in 1_000_000i64..2_000_000_000i64,
            offset_secs in -86_400i64..86_400i64,
        ) {
            let expires_at = OffsetDateTime::from_unix_timestamp(expiry_secs).unwrap();
            let now = expires_at + Duration::seconds(offset_secs);
            let session = session_expiring_at(expires_at);
            let expected = now < expires_at - SESSION_SAFETY_MARGIN;
            prop_assert_eq!(session.is_valid_at(now), expected);
        }
    }
}
