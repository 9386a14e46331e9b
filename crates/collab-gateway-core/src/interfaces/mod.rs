// crates/collab-gateway-core/src/interfaces/mod.rs
// ============================================================================
// Module: Collab Gateway Interfaces
// Description: Backend-agnostic collaborator interface used by tool bodies.
// Purpose: Define the contract between the pipeline and the collaboration API.
// Dependencies: async-trait, serde, thiserror, crate::core
// ============================================================================

//! ## Overview
//! The collaborator is the external service that owns teams, channels,
//! members, and meetings. Tool bodies and the context resolver reach it only
//! through [`CollaborationApi`], so the gateway can run against the in-memory
//! directory or a remote service without changing the pipeline. Failures are
//! reported as typed [`UpstreamError`] values and never as panics.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::AccessToken;
use crate::core::Identity;
use crate::core::PermissionLevel;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Role a user holds within a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRole {
    /// Team owner.
    Owner,
    /// Regular member.
    Member,
    /// Invited guest.
    Guest,
}

impl TeamRole {
    /// Returns the permission level this role grants.
    #[must_use]
    pub const fn permission(self) -> PermissionLevel {
        match self {
            Self::Owner => PermissionLevel::Owner,
            Self::Member => PermissionLevel::Member,
            Self::Guest => PermissionLevel::Guest,
        }
    }

    /// Returns a stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
            Self::Guest => "guest",
        }
    }
}

/// Team summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Team identifier.
    pub id: String,
    /// Display name.
    pub display_name: String,
    /// Free-form description.
    pub description: String,
}

/// Channel summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Channel identifier.
    pub id: String,
    /// Owning team identifier.
    pub team_id: String,
    /// Display name.
    pub display_name: String,
}

/// Team membership record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    /// Member user identifier.
    pub user_id: String,
    /// Member display name.
    pub display_name: String,
    /// Role within the team.
    pub role: TeamRole,
}

/// Message posted to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelMessage {
    /// Message identifier assigned by the collaborator.
    pub id: String,
    /// Channel the message was posted to.
    pub channel_id: String,
    /// Author user identifier.
    pub author_id: String,
    /// Message body.
    pub content: String,
}

/// Meeting summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    /// Meeting identifier.
    pub id: String,
    /// Meeting subject.
    pub subject: String,
    /// Organizer user identifier.
    pub organizer_id: String,
    /// Start time (RFC 3339).
    pub start: String,
    /// End time (RFC 3339).
    pub end: String,
}

/// Partial meeting update; unset fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingUpdate {
    /// New subject.
    pub subject: Option<String>,
    /// New start time (RFC 3339).
    pub start: Option<String>,
    /// New end time (RFC 3339).
    pub end: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Collaborator failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// The collaborator refused the operation for this caller.
    #[error("collaborator denied access: {0}")]
    Forbidden(String),
    /// The addressed resource does not exist.
    #[error("collaborator resource not found: {0}")]
    NotFound(String),
    /// The collaborator could not be reached.
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    /// The collaborator reported any other failure.
    #[error("collaborator request failed: {0}")]
    Failed(String),
}

// ============================================================================
// SECTION: Collaborator Interface
// ============================================================================

/// Collaboration service used by the context resolver and tool bodies.
///
/// Every call carries the caller's bearer token; implementations decide what
/// the token authorizes.
#[async_trait]
pub trait CollaborationApi: Send + Sync {
    /// Returns the identity behind `token`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the identity cannot be resolved.
    async fn current_identity(&self, token: &AccessToken) -> Result<Identity, UpstreamError>;

    /// Returns the caller's role in `team_id`, or `None` when not a member.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the lookup fails.
    async fn team_role(
        &self,
        token: &AccessToken,
        team_id: &str,
    ) -> Result<Option<TeamRole>, UpstreamError>;

    /// Returns true when the caller organizes `meeting_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the lookup fails.
    async fn is_meeting_organizer(
        &self,
        token: &AccessToken,
        meeting_id: &str,
    ) -> Result<bool, UpstreamError>;

    /// Lists teams visible to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the listing fails.
    async fn list_teams(&self, token: &AccessToken) -> Result<Vec<Team>, UpstreamError>;

    /// Lists channels in `team_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the team is unknown or the listing fails.
    async fn list_channels(
        &self,
        token: &AccessToken,
        team_id: &str,
    ) -> Result<Vec<Channel>, UpstreamError>;

    /// Lists members of `team_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the team is unknown or the listing fails.
    async fn list_team_members(
        &self,
        token: &AccessToken,
        team_id: &str,
    ) -> Result<Vec<TeamMember>, UpstreamError>;

    /// Posts `content` to a channel.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the channel is unknown or the post fails.
    async fn send_channel_message(
        &self,
        token: &AccessToken,
        team_id: &str,
        channel_id: &str,
        content: &str,
    ) -> Result<ChannelMessage, UpstreamError>;

    /// Adds `user_id` to `team_id` with `role`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the team is unknown or the change fails.
    async fn add_team_member(
        &self,
        token: &AccessToken,
        team_id: &str,
        user_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, UpstreamError>;

    /// Removes `user_id` from `team_id`.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the member is unknown or the change fails.
    async fn remove_team_member(
        &self,
        token: &AccessToken,
        team_id: &str,
        user_id: &str,
    ) -> Result<(), UpstreamError>;

    /// Lists meetings the caller can see.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the listing fails.
    async fn list_meetings(&self, token: &AccessToken) -> Result<Vec<Meeting>, UpstreamError>;

    /// Applies `update` to `meeting_id` and returns the updated meeting.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError`] when the meeting is unknown or the change fails.
    async fn update_meeting(
        &self,
        token: &AccessToken,
        meeting_id: &str,
        update: MeetingUpdate,
    ) -> Result<Meeting, UpstreamError>;
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

    use super::MeetingUpdate;
    use super::TeamRole;
    use crate::core::PermissionLevel;

    #[test]
    fn team_roles_map_to_permission_levels() {
        assert_eq!(TeamRole::Owner.permission(), PermissionLevel::Owner);
        assert_eq!(TeamRole::Member.permission(), PermissionLevel::Member);
        assert_eq!(TeamRole::Guest.permission(), PermissionLevel::Guest);
    }

    #[test]
    fn meeting_update_accepts_partial_payload() {
        let update: MeetingUpdate =
            serde_json::from_value(serde_json::json!({ "subject": "Retro" })).unwrap();
        assert_eq!(update.subject.as_deref(), Some("Retro"));
        assert!(update.start.is_none());
    }

    #[test]
    fn team_role_wire_labels_are_lowercase() {
        let role: TeamRole = serde_json::from_value(serde_json::json!("owner")).unwrap();
        assert_eq!(role, TeamRole::Owner);
        assert_eq!(role.as_str(), "owner");
    }
}
