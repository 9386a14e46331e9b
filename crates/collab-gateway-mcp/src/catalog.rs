// crates/collab-gateway-mcp/src/catalog.rs
// ============================================================================
// Module: Built-in Tool Catalog
// Description: The gateway's fixed set of collaboration tools.
// Purpose: Describe each tool once and run its body over the collaborator.
// Dependencies: async-trait, collab-gateway-core, serde, serde_json, time
// ============================================================================

//! ## Overview
//! Every built-in tool is one variant of [`BuiltinTool`], which carries its
//! name, description, category, required permission level, and input schema,
//! and implements [`ToolHandler`] for its body. Bodies are thin: they read
//! scope from the resolved context (so hints carried over from earlier calls
//! apply) and forward to the [`CollaborationApi`](collab_gateway_core::CollaborationApi).
//!
//! Guest tools work for anonymous callers and report empty results rather
//! than failing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use collab_gateway_core::ExecutionContext;
use collab_gateway_core::MeetingUpdate;
use collab_gateway_core::PermissionLevel;
use collab_gateway_core::TeamRole;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use time::format_description::well_known::Rfc3339;

use crate::registry::RegistryError;
use crate::registry::ToolCategory;
use crate::registry::ToolDescriptor;
use crate::registry::ToolRegistry;
use crate::registry::ToolRegistryBuilder;
use crate::tools::ToolError;
use crate::tools::ToolHandler;
use crate::tools::ToolServices;
use crate::tools::require_token;

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Built-in tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTool {
    /// Session state and credential source.
    AuthStatus,
    /// Caller identity and resolved permission.
    GetCurrentUser,
    /// Teams visible to the caller.
    ListTeams,
    /// Channels of the selected team.
    ListChannels,
    /// Members of the selected team.
    ListTeamMembers,
    /// Post to the selected channel.
    SendChannelMessage,
    /// Add a member to the selected team.
    AddTeamMember,
    /// Remove a member from the selected team.
    RemoveTeamMember,
    /// Meetings visible to the caller.
    ListMeetings,
    /// Reschedule or rename an organized meeting.
    UpdateMeeting,
}

impl BuiltinTool {
    /// All built-in tools.
    pub const ALL: [Self; 10] = [
        Self::AuthStatus,
        Self::GetCurrentUser,
        Self::ListTeams,
        Self::ListChannels,
        Self::ListTeamMembers,
        Self::SendChannelMessage,
        Self::AddTeamMember,
        Self::RemoveTeamMember,
        Self::ListMeetings,
        Self::UpdateMeeting,
    ];

    /// Returns the tool name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AuthStatus => "auth_status",
            Self::GetCurrentUser => "get_current_user",
            Self::ListTeams => "list_teams",
            Self::ListChannels => "list_channels",
            Self::ListTeamMembers => "list_team_members",
            Self::SendChannelMessage => "send_channel_message",
            Self::AddTeamMember => "add_team_member",
            Self::RemoveTeamMember => "remove_team_member",
            Self::ListMeetings => "list_meetings",
            Self::UpdateMeeting => "update_meeting",
        }
    }

    /// Returns the human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthStatus => "Report session state and the credential source in use.",
            Self::GetCurrentUser => "Return the signed-in user and permission in scope.",
            Self::ListTeams => "List the teams the signed-in user belongs to.",
            Self::ListChannels => "List channels in the selected team.",
            Self::ListTeamMembers => "List members of the selected team with their roles.",
            Self::SendChannelMessage => "Post a message to a channel in the selected team.",
            Self::AddTeamMember => "Add a user to the selected team.",
            Self::RemoveTeamMember => "Remove a user from the selected team.",
            Self::ListMeetings => "List meetings visible to the signed-in user.",
            Self::UpdateMeeting => "Change the subject or time of a meeting.",
        }
    }

    /// Returns the category tag.
    #[must_use]
    pub const fn category(self) -> ToolCategory {
        match self {
            Self::AuthStatus | Self::GetCurrentUser | Self::ListTeams => ToolCategory::General,
            Self::ListChannels
            | Self::ListTeamMembers
            | Self::SendChannelMessage
            | Self::AddTeamMember
            | Self::RemoveTeamMember => ToolCategory::Team,
            Self::ListMeetings | Self::UpdateMeeting => ToolCategory::Meeting,
        }
    }

    /// Returns the required permission level.
    #[must_use]
    pub const fn required_permission(self) -> PermissionLevel {
        match self {
            Self::AuthStatus | Self::GetCurrentUser | Self::ListTeams | Self::ListMeetings => {
                PermissionLevel::Guest
            }
            Self::ListChannels | Self::ListTeamMembers | Self::SendChannelMessage => {
                PermissionLevel::Member
            }
            Self::AddTeamMember | Self::RemoveTeamMember => PermissionLevel::Owner,
            Self::UpdateMeeting => PermissionLevel::Organizer,
        }
    }

    /// Returns the JSON Schema for the tool arguments.
    #[must_use]
    pub fn input_schema(self) -> Value {
        let id = json!({"type": "string", "minLength": 1});
        match self {
            Self::AuthStatus | Self::GetCurrentUser | Self::ListTeams | Self::ListMeetings => {
                json!({"type": "object", "properties": {}})
            }
            Self::ListChannels | Self::ListTeamMembers => json!({
                "type": "object",
                "properties": {"teamId": id},
            }),
            Self::SendChannelMessage => json!({
                "type": "object",
                "properties": {
                    "teamId": id,
                    "channelId": id,
                    "content": {"type": "string", "minLength": 1, "maxLength": 28_000},
                },
                "required": ["content"],
            }),
            Self::AddTeamMember => json!({
                "type": "object",
                "properties": {
                    "teamId": id,
                    "userId": id,
                    "role": {"type": "string", "enum": ["owner", "member", "guest"]},
                },
                "required": ["userId"],
            }),
            Self::RemoveTeamMember => json!({
                "type": "object",
                "properties": {"teamId": id, "userId": id},
                "required": ["userId"],
            }),
            Self::UpdateMeeting => json!({
                "type": "object",
                "properties": {
                    "meetingId": id,
                    "subject": {"type": "string", "minLength": 1},
                    "start": {"type": "string", "format": "date-time"},
                    "end": {"type": "string", "format": "date-time"},
                },
                "required": ["meetingId"],
                "minProperties": 2,
            }),
        }
    }

    /// Returns the listed descriptor.
    #[must_use]
    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
            category: self.category(),
            required_permission: self.required_permission(),
        }
    }
}

/// Builds the registry holding every built-in tool.
///
/// # Errors
///
/// Returns [`RegistryError`] when a built-in descriptor is rejected.
pub fn builtin_registry() -> Result<ToolRegistry, RegistryError> {
    let mut builder = ToolRegistryBuilder::new();
    for tool in BuiltinTool::ALL {
        builder.register(tool.descriptor(), Arc::new(tool))?;
    }
    Ok(builder.build())
}

// ============================================================================
// SECTION: Arguments
// ============================================================================

/// `send_channel_message` arguments.
#[derive(Debug, Deserialize)]
struct SendMessageArgs {
    /// Message body.
    content: String,
}

/// `add_team_member` / `remove_team_member` arguments.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemberArgs {
    /// Target user.
    user_id: String,
    /// Role to grant; defaults to member.
    #[serde(default)]
    role: Option<TeamRole>,
}

/// Decodes schema-valid arguments into a typed struct.
fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|err| ToolError::Validation {
        violations: vec![err.to_string()],
    })
}

/// Returns the team in scope.
fn team_in_scope(context: &ExecutionContext) -> Result<&str, ToolError> {
    context.hints.team_id.as_deref().ok_or_else(|| ToolError::Validation {
        violations: vec!["teamId: no team selected".to_string()],
    })
}

// ============================================================================
// SECTION: Tool Bodies
// ============================================================================

#[async_trait]
impl ToolHandler for BuiltinTool {
    async fn call(
        &self,
        services: &ToolServices,
        context: &ExecutionContext,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let api = services.collaborator.as_ref();
        match self {
            Self::AuthStatus => auth_status(services, context),
            Self::GetCurrentUser => Ok(json!({
                "authenticated": context.is_authenticated(),
                "user": context.identity,
                "tenantId": context.tenant_id,
                "permission": context.permission,
                "hints": context.hints,
            })),
            Self::ListTeams => {
                let teams = match &context.access_token {
                    Some(token) => api.list_teams(token).await?,
                    None => Vec::new(),
                };
                Ok(json!({"teams": teams}))
            }
            Self::ListChannels => {
                let team_id = team_in_scope(context)?;
                let channels = api.list_channels(require_token(context)?, team_id).await?;
                Ok(json!({"teamId": team_id, "channels": channels}))
            }
            Self::ListTeamMembers => {
                let team_id = team_in_scope(context)?;
                let members = api.list_team_members(require_token(context)?, team_id).await?;
                Ok(json!({"teamId": team_id, "members": members}))
            }
            Self::SendChannelMessage => {
                let args: SendMessageArgs = decode(arguments)?;
                let team_id = team_in_scope(context)?;
                let channel_id =
                    context.hints.channel_id.as_deref().ok_or_else(|| ToolError::Validation {
                        violations: vec!["channelId: no channel selected".to_string()],
                    })?;
                let token = require_token(context)?;
                let message =
                    api.send_channel_message(token, team_id, channel_id, &args.content).await?;
                Ok(json!({"message": message}))
            }
            Self::AddTeamMember => {
                let args: MemberArgs = decode(arguments)?;
                let team_id = team_in_scope(context)?;
                let role = args.role.unwrap_or(TeamRole::Member);
                let member = api
                    .add_team_member(require_token(context)?, team_id, &args.user_id, role)
                    .await?;
                Ok(json!({"teamId": team_id, "member": member}))
            }
            Self::RemoveTeamMember => {
                let args: MemberArgs = decode(arguments)?;
                let team_id = team_in_scope(context)?;
                api.remove_team_member(require_token(context)?, team_id, &args.user_id).await?;
                Ok(json!({"teamId": team_id, "removed": args.user_id}))
            }
            Self::ListMeetings => {
                let meetings = match &context.access_token {
                    Some(token) => api.list_meetings(token).await?,
                    None => Vec::new(),
                };
                Ok(json!({"meetings": meetings}))
            }
            Self::UpdateMeeting => {
                let update: MeetingUpdate = decode(arguments)?;
                let meeting_id =
                    context.hints.meeting_id.as_deref().ok_or_else(|| ToolError::Validation {
                        violations: vec!["meetingId: no meeting selected".to_string()],
                    })?;
                let token = require_token(context)?;
                let meeting = api.update_meeting(token, meeting_id, update).await?;
                Ok(json!({"meeting": meeting}))
            }
        }
    }
}

/// Reports session state without exposing the token.
fn auth_status(services: &ToolServices, context: &ExecutionContext) -> Result<Value, ToolError> {
    let sessions = services.sessions.as_ref();
    let session = sessions.cached_session();
    let expires_at = session
        .as_ref()
        .map(|session| session.expires_at.format(&Rfc3339))
        .transpose()
        .map_err(|err| ToolError::Internal(format!("expiry formatting failed: {err}")))?;
    Ok(json!({
        "state": sessions.state().as_str(),
        "authenticated": context.is_authenticated(),
        "tenantId": context.tenant_id,
        "account": session.as_ref().and_then(|session| session.account.clone()),
        "source": session.as_ref().map(|session| session.source),
        "expiresAt": expires_at,
        "simulation": sessions.settings().simulation,
    }))
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

    use collab_gateway_core::PermissionLevel;

    use super::BuiltinTool;
    use super::builtin_registry;
    use crate::registry::ToolCategory;

    #[test]
    fn builtin_catalog_registers_cleanly() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.len(), BuiltinTool::ALL.len());
    }

    #[test]
    fn organizer_tools_are_meeting_scoped() {
        for tool in BuiltinTool::ALL {
            if tool.required_permission() == PermissionLevel::Organizer {
                assert_eq!(tool.category(), ToolCategory::Meeting, "{}", tool.name());
            }
        }
    }

    #[test]
    fn permission_levels_match_catalog() {
        assert_eq!(BuiltinTool::ListTeams.required_permission(), PermissionLevel::Guest);
        assert_eq!(BuiltinTool::SendChannelMessage.required_permission(), PermissionLevel::Member);
        assert_eq!(BuiltinTool::RemoveTeamMember.required_permission(), PermissionLevel::Owner);
        assert_eq!(BuiltinTool::UpdateMeeting.required_permission(), PermissionLevel::Organizer);
    }
}
