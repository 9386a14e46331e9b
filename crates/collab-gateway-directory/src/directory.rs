// crates/collab-gateway-directory/src/directory.rs
// ============================================================================
// Module: In-Memory Directory
// Description: CollaborationApi implementation over seeded in-memory state.
// Purpose: Back tool bodies and role lookups without a remote service.
// Dependencies: collab-gateway-core, collab-gateway-config, time, tracing
// ============================================================================

//! ## Overview
//! [`InMemoryDirectory`] answers every collaborator call for the single
//! configured caller. The caller's role in a team is resolved in order:
//! `owner_permissive`, then `team_roles`, then seeded membership, then
//! `default_role`. Mutations are checked against that role so the directory
//! refuses what a real service would refuse, independently of the gateway's
//! own authorization.
//!
//! State lives behind a mutex and is never held across an await point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use async_trait::async_trait;
use collab_gateway_config::DirectoryConfig;
use collab_gateway_core::AccessToken;
use collab_gateway_core::Channel;
use collab_gateway_core::ChannelMessage;
use collab_gateway_core::CollaborationApi;
use collab_gateway_core::Identity;
use collab_gateway_core::Meeting;
use collab_gateway_core::MeetingUpdate;
use collab_gateway_core::Team;
use collab_gateway_core::TeamMember;
use collab_gateway_core::TeamRole;
use collab_gateway_core::UpstreamError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::debug;

use crate::seed::DirectorySeed;

// ============================================================================
// SECTION: State
// ============================================================================

/// Mutable directory contents.
#[derive(Debug)]
struct DirectoryState {
    /// Seeded and mutated records.
    seed: DirectorySeed,
    /// Messages keyed by channel id.
    messages: BTreeMap<String, Vec<ChannelMessage>>,
    /// Next message sequence number.
    next_message: u64,
}

/// Caller-role overrides taken from configuration.
#[derive(Debug, Clone)]
struct RolePolicy {
    /// Grant Owner in every team.
    owner_permissive: bool,
    /// Role for teams without an explicit or seeded entry.
    default_role: Option<TeamRole>,
    /// Explicit caller roles per team.
    team_roles: BTreeMap<String, TeamRole>,
    /// Extra meetings the caller organizes.
    organizer_meetings: BTreeSet<String>,
}

// ============================================================================
// SECTION: Directory
// ============================================================================

/// In-memory collaborator for one caller.
#[derive(Debug, Clone)]
pub struct InMemoryDirectory {
    /// Identity returned for every non-empty token.
    identity: Identity,
    /// Role overrides.
    policy: RolePolicy,
    /// Shared state.
    state: Arc<Mutex<DirectoryState>>,
}

impl InMemoryDirectory {
    /// Creates a directory seeded with the sample organisation.
    #[must_use]
    pub fn from_config(config: &DirectoryConfig) -> Self {
        let seed =
            DirectorySeed::sample(&config.identity.user_id, &config.identity.display_name);
        Self::with_seed(config, seed)
    }

    /// Creates a directory over explicit seed data.
    #[must_use]
    pub fn with_seed(config: &DirectoryConfig, seed: DirectorySeed) -> Self {
        Self {
            identity: Identity {
                user_id: config.identity.user_id.clone(),
                display_name: config.identity.display_name.clone(),
                principal_name: config.identity.principal_name.clone(),
                tenant_id: String::new(),
            },
            policy: RolePolicy {
                owner_permissive: config.owner_permissive,
                default_role: config.default_role,
                team_roles: config.team_roles.clone(),
                organizer_meetings: config.organizer_meetings.iter().cloned().collect(),
            },
            state: Arc::new(Mutex::new(DirectoryState {
                seed,
                messages: BTreeMap::new(),
                next_message: 1,
            })),
        }
    }

    /// Sets the tenant reported on the caller identity.
    #[must_use]
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.identity.tenant_id = tenant_id.into();
        self
    }

    /// Returns the messages posted to `channel_id`, oldest first.
    #[must_use]
    pub fn channel_messages(&self, channel_id: &str) -> Vec<ChannelMessage> {
        self.lock()
            .map(|state| state.messages.get(channel_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Locks the state.
    fn lock(&self) -> Result<MutexGuard<'_, DirectoryState>, UpstreamError> {
        self.state
            .lock()
            .map_err(|_| UpstreamError::Failed("directory state mutex poisoned".to_string()))
    }

    /// Rejects calls without a bearer token.
    fn check_token(token: &AccessToken) -> Result<(), UpstreamError> {
        if token.expose().trim().is_empty() {
            return Err(UpstreamError::Forbidden("missing bearer token".to_string()));
        }
        Ok(())
    }

    /// Resolves the caller's role in `team_id`.
    fn role_in(&self, state: &DirectoryState, team_id: &str) -> Option<TeamRole> {
        if self.policy.owner_permissive {
            return Some(TeamRole::Owner);
        }
        if let Some(role) = self.policy.team_roles.get(team_id) {
            return Some(*role);
        }
        state
            .seed
            .teams
            .get(team_id)
            .and_then(|team| team.members.get(&self.identity.user_id))
            .map(|member| member.role)
            .or(self.policy.default_role)
    }

    /// Requires the caller to hold at least `Member` in `team_id`.
    fn require_member(&self, state: &DirectoryState, team_id: &str) -> Result<(), UpstreamError> {
        if !state.seed.teams.contains_key(team_id) {
            return Err(UpstreamError::NotFound(format!("team {team_id}")));
        }
        match self.role_in(state, team_id) {
            Some(TeamRole::Owner | TeamRole::Member) => Ok(()),
            _ => Err(UpstreamError::Forbidden(format!("not a member of team {team_id}"))),
        }
    }

    /// Requires the caller to own `team_id`.
    fn require_owner(&self, state: &DirectoryState, team_id: &str) -> Result<(), UpstreamError> {
        if !state.seed.teams.contains_key(team_id) {
            return Err(UpstreamError::NotFound(format!("team {team_id}")));
        }
        match self.role_in(state, team_id) {
            Some(TeamRole::Owner) => Ok(()),
            _ => Err(UpstreamError::Forbidden(format!("not an owner of team {team_id}"))),
        }
    }

    /// Returns true when the caller organizes `meeting_id`.
    fn organizes(&self, state: &DirectoryState, meeting_id: &str) -> bool {
        self.policy.organizer_meetings.contains(meeting_id)
            || state
                .seed
                .meetings
                .get(meeting_id)
                .is_some_and(|meeting| meeting.organizer_id == self.identity.user_id)
    }
}

/// Parses an RFC 3339 timestamp field.
fn parse_instant(field: &str, value: &str) -> Result<OffsetDateTime, UpstreamError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|err| UpstreamError::Failed(format!("invalid {field} timestamp: {err}")))
}

// ============================================================================
// SECTION: Collaborator Implementation
// ============================================================================

#[async_trait]
impl CollaborationApi for InMemoryDirectory {
    async fn current_identity(&self, token: &AccessToken) -> Result<Identity, UpstreamError> {
        Self::check_token(token)?;
        Ok(self.identity.clone())
    }

    async fn team_role(
        &self,
        token: &AccessToken,
        team_id: &str,
    ) -> Result<Option<TeamRole>, UpstreamError> {
        Self::check_token(token)?;
        let state = self.lock()?;
        let role = self.role_in(&state, team_id);
        drop(state);
        debug!(team_id, role = role.map(TeamRole::as_str), "directory role lookup");
        Ok(role)
    }

    async fn is_meeting_organizer(
        &self,
        token: &AccessToken,
        meeting_id: &str,
    ) -> Result<bool, UpstreamError> {
        Self::check_token(token)?;
        let state = self.lock()?;
        Ok(self.organizes(&state, meeting_id))
    }

    async fn list_teams(&self, token: &AccessToken) -> Result<Vec<Team>, UpstreamError> {
        Self::check_token(token)?;
        let state = self.lock()?;
        Ok(state
            .seed
            .teams
            .values()
            .filter(|team| self.role_in(&state, &team.team.id).is_some())
            .map(|team| team.team.clone())
            .collect())
    }

    async fn list_channels(
        &self,
        token: &AccessToken,
        team_id: &str,
    ) -> Result<Vec<Channel>, UpstreamError> {
        Self::check_token(token)?;
        let state = self.lock()?;
        self.require_member(&state, team_id)?;
        Ok(state.seed.teams.get(team_id).map(|team| team.channels.clone()).unwrap_or_default())
    }

    async fn list_team_members(
        &self,
        token: &AccessToken,
        team_id: &str,
    ) -> Result<Vec<TeamMember>, UpstreamError> {
        Self::check_token(token)?;
        let state = self.lock()?;
        self.require_member(&state, team_id)?;
        Ok(state
            .seed
            .teams
            .get(team_id)
            .map(|team| team.members.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn send_channel_message(
        &self,
        token: &AccessToken,
        team_id: &str,
        channel_id: &str,
        content: &str,
    ) -> Result<ChannelMessage, UpstreamError> {
        Self::check_token(token)?;
        if content.trim().is_empty() {
            return Err(UpstreamError::Failed("message content is empty".to_string()));
        }
        let mut state = self.lock()?;
        self.require_member(&state, team_id)?;
        let known_channel = state
            .seed
            .teams
            .get(team_id)
            .is_some_and(|team| team.channels.iter().any(|channel| channel.id == channel_id));
        if !known_channel {
            return Err(UpstreamError::NotFound(format!("channel {channel_id} in team {team_id}")));
        }
        let message = ChannelMessage {
            id: format!("msg-{:06}", state.next_message),
            channel_id: channel_id.to_string(),
            author_id: self.identity.user_id.clone(),
            content: content.to_string(),
        };
        state.next_message += 1;
        state.messages.entry(channel_id.to_string()).or_default().push(message.clone());
        Ok(message)
    }

    async fn add_team_member(
        &self,
        token: &AccessToken,
        team_id: &str,
        user_id: &str,
        role: TeamRole,
    ) -> Result<TeamMember, UpstreamError> {
        Self::check_token(token)?;
        let mut state = self.lock()?;
        self.require_owner(&state, team_id)?;
        let display_name = state
            .seed
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| UpstreamError::NotFound(format!("user {user_id}")))?;
        let team = state
            .seed
            .teams
            .get_mut(team_id)
            .ok_or_else(|| UpstreamError::NotFound(format!("team {team_id}")))?;
        if team.members.contains_key(user_id) {
            return Err(UpstreamError::Failed(format!(
                "user {user_id} is already a member of team {team_id}"
            )));
        }
        let member = TeamMember {
            user_id: user_id.to_string(),
            display_name,
            role,
        };
        team.members.insert(user_id.to_string(), member.clone());
        Ok(member)
    }

    async fn remove_team_member(
        &self,
        token: &AccessToken,
        team_id: &str,
        user_id: &str,
    ) -> Result<(), UpstreamError> {
        Self::check_token(token)?;
        let mut state = self.lock()?;
        self.require_owner(&state, team_id)?;
        let team = state
            .seed
            .teams
            .get_mut(team_id)
            .ok_or_else(|| UpstreamError::NotFound(format!("team {team_id}")))?;
        let Some(member) = team.members.get(user_id) else {
            return Err(UpstreamError::NotFound(format!("member {user_id} in team {team_id}")));
        };
        let owners =
            team.members.values().filter(|member| member.role == TeamRole::Owner).count();
        if member.role == TeamRole::Owner && owners == 1 {
            return Err(UpstreamError::Failed(format!(
                "cannot remove the last owner of team {team_id}"
            )));
        }
        team.members.remove(user_id);
        Ok(())
    }

    async fn list_meetings(&self, token: &AccessToken) -> Result<Vec<Meeting>, UpstreamError> {
        Self::check_token(token)?;
        let state = self.lock()?;
        Ok(state.seed.meetings.values().cloned().collect())
    }

    async fn update_meeting(
        &self,
        token: &AccessToken,
        meeting_id: &str,
        update: MeetingUpdate,
    ) -> Result<Meeting, UpstreamError> {
        Self::check_token(token)?;
        let mut state = self.lock()?;
        if !state.seed.meetings.contains_key(meeting_id) {
            return Err(UpstreamError::NotFound(format!("meeting {meeting_id}")));
        }
        if !self.organizes(&state, meeting_id) {
            return Err(UpstreamError::Forbidden(format!(
                "not the organizer of meeting {meeting_id}"
            )));
        }
        let meeting = state
            .seed
            .meetings
            .get_mut(meeting_id)
            .ok_or_else(|| UpstreamError::NotFound(format!("meeting {meeting_id}")))?;
        let mut updated = meeting.clone();
        if let Some(subject) = update.subject {
            if subject.trim().is_empty() {
                return Err(UpstreamError::Failed("meeting subject is empty".to_string()));
            }
            updated.subject = subject;
        }
        if let Some(start) = update.start {
            updated.start = start;
        }
        if let Some(end) = update.end {
            updated.end = end;
        }
        let start = parse_instant("start", &updated.start)?;
        let end = parse_instant("end", &updated.end)?;
        if end <= start {
            return Err(UpstreamError::Failed("meeting must end after it starts".to_string()));
        }
        *meeting = updated.clone();
        Ok(updated)
    }
}
