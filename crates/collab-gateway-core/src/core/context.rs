// crates/collab-gateway-core/src/core/context.rs
// ============================================================================
// Module: Execution Context
// Description: Immutable per-call context handed to tool bodies.
// Purpose: Bundle identity, scope hints, permission, and correlation id.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`ExecutionContext`] is built once per tool call by the context
//! resolver, owned by that call, and dropped when it completes. It is never
//! absent: an unauthenticated caller gets an anonymous identity, the Guest
//! level, and no access token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identity::AccessToken;
use crate::core::identity::Identity;
use crate::core::permission::PermissionLevel;

// ============================================================================
// SECTION: Hints
// ============================================================================

/// Optional team, channel, and meeting scope hints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextHints {
    /// Active team identifier.
    pub team_id: Option<String>,
    /// Active channel identifier.
    pub channel_id: Option<String>,
    /// Active meeting identifier.
    pub meeting_id: Option<String>,
}

impl ContextHints {
    /// Returns true when no hint is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.team_id.is_none() && self.channel_id.is_none() && self.meeting_id.is_none()
    }

    /// Fills unset fields from `fallback`.
    ///
    /// A channel hint is only inherited when both hints name the same team.
    #[must_use]
    pub fn or(self, fallback: &Self) -> Self {
        let same_team = self.team_id.is_none() || self.team_id == fallback.team_id;
        let channel_id = if same_team {
            self.channel_id.or_else(|| fallback.channel_id.clone())
        } else {
            self.channel_id
        };
        Self {
            team_id: self.team_id.or_else(|| fallback.team_id.clone()),
            channel_id,
            meeting_id: self.meeting_id.or_else(|| fallback.meeting_id.clone()),
        }
    }
}

// ============================================================================
// SECTION: Execution Context
// ============================================================================

/// Per-call execution context.
///
/// # Invariants
/// - `correlation_id` is unique per call and never reused.
/// - `access_token` is `None` exactly when no session could be established.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Caller identity (anonymous when unauthenticated).
    pub identity: Identity,
    /// Tenant the call runs in, when known.
    pub tenant_id: Option<String>,
    /// Team, channel, and meeting hints for this call.
    pub hints: ContextHints,
    /// Computed permission level.
    pub permission: PermissionLevel,
    /// Correlation identifier for logs and error messages.
    pub correlation_id: String,
    /// Access token for collaborator calls.
    pub access_token: Option<AccessToken>,
}

impl ExecutionContext {
    /// Builds the context used when no session is available.
    #[must_use]
    pub fn anonymous(correlation_id: impl Into<String>, hints: ContextHints) -> Self {
        Self {
            identity: Identity::anonymous(),
            tenant_id: None,
            hints,
            permission: PermissionLevel::Guest,
            correlation_id: correlation_id.into(),
            access_token: None,
        }
    }

    /// Returns true when the caller has an authenticated session.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
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

    use super::ContextHints;
    use super::ExecutionContext;
    use crate::core::permission::PermissionLevel;

    #[test]
    fn anonymous_context_defaults_to_guest() {
        let context = ExecutionContext::anonymous("cg-1", ContextHints::default());
        assert_eq!(context.permission, PermissionLevel::Guest);
        assert!(!context.is_authenticated());
        assert!(context.identity.is_anonymous());
        assert_eq!(context.correlation_id, "cg-1");
    }

    fn previous_hints() -> ContextHints {
        ContextHints {
            team_id: Some("team-a".to_string()),
            channel_id: Some("general".to_string()),
            meeting_id: Some("meeting-1".to_string()),
        }
    }

    #[test]
    fn empty_hints_inherit_everything() {
        let merged = ContextHints::default().or(&previous_hints());
        assert_eq!(merged, previous_hints());
        assert!(ContextHints::default().is_empty());
    }

    #[test]
    fn new_team_drops_previous_channel() {
        let current = ContextHints {
            team_id: Some("team-b".to_string()),
            channel_id: None,
            meeting_id: None,
        };
        let merged = current.or(&previous_hints());
        assert_eq!(merged.team_id.as_deref(), Some("team-b"));
        assert!(merged.channel_id.is_none());
        assert_eq!(merged.meeting_id.as_deref(), Some("meeting-1"));
    }

    #[test]
    fn same_team_keeps_previous_channel() {
        let current = ContextHints {
            team_id: Some("team-a".to_string()),
            channel_id: None,
            meeting_id: None,
        };
        let merged = current.or(&previous_hints());
        assert_eq!(merged.channel_id.as_deref(), Some("general"));
    }
}
