// crates/collab-gateway-mcp/src/context.rs
// ============================================================================
// Module: Context Resolver
// Description: Builds the per-call execution context from the session.
// Purpose: Turn hints plus the current session into identity and permission.
// Dependencies: collab-gateway-auth, collab-gateway-core, tokio-util, tracing
// ============================================================================

//! ## Overview
//! [`ContextResolver::resolve`] always returns a context. When the session
//! manager cannot produce a session the caller is anonymous at Guest level.
//! When a session exists but the identity lookup fails, the token is kept and
//! the identity stays empty.
//!
//! Permission follows the tool's required scope. Meeting-scoped tools ask the
//! collaborator whether the caller organizes the hinted meeting; otherwise
//! the caller's role in the hinted team is used. Missing hints and failed
//! role lookups both yield Guest.
//!
//! Hints missing from a call are filled from the last call that succeeded,
//! so a client that selected a team once keeps working in it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use collab_gateway_auth::SessionManager;
use collab_gateway_core::AccessToken;
use collab_gateway_core::CollaborationApi;
use collab_gateway_core::ContextHints;
use collab_gateway_core::ExecutionContext;
use collab_gateway_core::Identity;
use collab_gateway_core::PermissionLevel;
use collab_gateway_core::PermissionScope;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Execution context resolver.
pub struct ContextResolver {
    /// Session source.
    sessions: Arc<SessionManager>,
    /// Identity and role lookups.
    collaborator: Arc<dyn CollaborationApi>,
    /// Hints of the last successful call.
    last_hints: Mutex<ContextHints>,
}

impl ContextResolver {
    /// Creates a resolver with no remembered hints.
    #[must_use]
    pub fn new(sessions: Arc<SessionManager>, collaborator: Arc<dyn CollaborationApi>) -> Self {
        Self {
            sessions,
            collaborator,
            last_hints: Mutex::new(ContextHints::default()),
        }
    }

    /// Resolves the context for one call.
    pub async fn resolve(
        &self,
        correlation_id: &str,
        hints: ContextHints,
        required: PermissionLevel,
        cancel: &CancellationToken,
    ) -> ExecutionContext {
        let hints = hints.or(&self.last_hints());
        let session = match self.sessions.get_access_token(cancel).await {
            Ok(session) => session,
            Err(err) => {
                debug!(correlation_id, error = %err, "no session; resolving anonymous context");
                return ExecutionContext::anonymous(correlation_id, hints);
            }
        };

        let identity = match self.collaborator.current_identity(&session.access_token).await {
            Ok(identity) => identity,
            Err(err) => {
                warn!(correlation_id, error = %err, "identity lookup failed");
                Identity::anonymous()
            }
        };
        let tenant_id = session
            .tenant_id
            .clone()
            .or_else(|| (!identity.tenant_id.is_empty()).then(|| identity.tenant_id.clone()));
        let permission =
            self.permission(correlation_id, &session.access_token, &hints, required).await;

        ExecutionContext {
            identity,
            tenant_id,
            hints,
            permission,
            correlation_id: correlation_id.to_string(),
            access_token: Some(session.access_token),
        }
    }

    /// Stores `hints` as the fallback for later calls.
    pub fn remember(&self, hints: &ContextHints) {
        if hints.is_empty() {
            return;
        }
        *self.last_hints.lock().unwrap_or_else(PoisonError::into_inner) = hints.clone();
    }

    /// Returns the remembered hints.
    #[must_use]
    pub fn last_hints(&self) -> ContextHints {
        self.last_hints.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Computes the permission level for the required scope.
    async fn permission(
        &self,
        correlation_id: &str,
        token: &AccessToken,
        hints: &ContextHints,
        required: PermissionLevel,
    ) -> PermissionLevel {
        if required.scope() == PermissionScope::Meeting
            && let Some(meeting_id) = hints.meeting_id.as_deref()
        {
            match self.collaborator.is_meeting_organizer(token, meeting_id).await {
                Ok(true) => return PermissionLevel::Organizer,
                Ok(false) => {}
                Err(err) => {
                    warn!(correlation_id, meeting_id, error = %err, "organizer lookup failed");
                }
            }
        }
        let Some(team_id) = hints.team_id.as_deref() else {
            return PermissionLevel::Guest;
        };
        match self.collaborator.team_role(token, team_id).await {
            Ok(Some(role)) => role.permission(),
            Ok(None) => PermissionLevel::Guest,
            Err(err) => {
                warn!(correlation_id, team_id, error = %err, "team role lookup failed");
                PermissionLevel::Guest
            }
        }
    }
}
