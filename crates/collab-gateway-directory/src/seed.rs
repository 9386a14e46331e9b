// crates/collab-gateway-directory/src/seed.rs
// ============================================================================
// Module: Directory Seed Data
// Description: Initial users, teams, channels, and meetings.
// Purpose: Give the in-memory directory a small, predictable organisation.
// Dependencies: collab-gateway-core
// ============================================================================

//! ## Overview
//! [`DirectorySeed::sample`] builds three teams around the configured caller:
//! the caller owns `team-engineering`, is a member of `team-design`, and is
//! not in `team-marketing`. The caller organizes `meeting-standup` only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use collab_gateway_core::Channel;
use collab_gateway_core::Meeting;
use collab_gateway_core::Team;
use collab_gateway_core::TeamMember;
use collab_gateway_core::TeamRole;

// ============================================================================
// SECTION: Seed Types
// ============================================================================

/// One seeded team with its channels and members.
#[derive(Debug, Clone)]
pub struct SeedTeam {
    /// Team summary.
    pub team: Team,
    /// Channels in the team.
    pub channels: Vec<Channel>,
    /// Members keyed by user id.
    pub members: BTreeMap<String, TeamMember>,
}

/// Initial directory contents.
#[derive(Debug, Clone, Default)]
pub struct DirectorySeed {
    /// Display names keyed by user id.
    pub users: BTreeMap<String, String>,
    /// Teams keyed by team id.
    pub teams: BTreeMap<String, SeedTeam>,
    /// Meetings keyed by meeting id.
    pub meetings: BTreeMap<String, Meeting>,
}

// ============================================================================
// SECTION: Sample Organisation
// ============================================================================

impl DirectorySeed {
    /// Builds the sample organisation around `caller_id`.
    #[must_use]
    pub fn sample(caller_id: &str, caller_name: &str) -> Self {
        let mut seed = Self::default();
        seed.add_user(caller_id, caller_name);
        seed.add_user("user-0002", "Avery Quinn");
        seed.add_user("user-0003", "Jordan Lee");
        seed.add_user("user-0004", "Sam Rivera");
        seed.add_user("user-0005", "Riley Chen");

        seed.add_team(
            "team-engineering",
            "Engineering",
            "Platform and product engineering",
            &[("general", "General"), ("releases", "Releases")],
            &[
                (caller_id, TeamRole::Owner),
                ("user-0002", TeamRole::Member),
                ("user-0005", TeamRole::Guest),
            ],
        );
        seed.add_team(
            "team-design",
            "Design",
            "Product design and research",
            &[("general", "General")],
            &[("user-0003", TeamRole::Owner), (caller_id, TeamRole::Member)],
        );
        seed.add_team(
            "team-marketing",
            "Marketing",
            "Campaigns and communications",
            &[("general", "General")],
            &[("user-0004", TeamRole::Owner), ("user-0002", TeamRole::Member)],
        );

        seed.add_meeting(
            "meeting-standup",
            "Daily standup",
            caller_id,
            ("2026-01-05T09:00:00Z", "2026-01-05T09:15:00Z"),
        );
        seed.add_meeting(
            "meeting-allhands",
            "All hands",
            "user-0003",
            ("2026-01-08T16:00:00Z", "2026-01-08T17:00:00Z"),
        );
        seed.add_meeting(
            "meeting-design-review",
            "Design review",
            "user-0003",
            ("2026-01-06T13:00:00Z", "2026-01-06T14:00:00Z"),
        );
        seed
    }

    /// Adds or renames a user.
    pub fn add_user(&mut self, user_id: &str, display_name: &str) {
        self.users.insert(user_id.to_string(), display_name.to_string());
    }

    /// Adds a team with `(suffix, name)` channels and `(user, role)` members.
    pub fn add_team(
        &mut self,
        team_id: &str,
        display_name: &str,
        description: &str,
        channels: &[(&str, &str)],
        members: &[(&str, TeamRole)],
    ) {
        let short = team_id.strip_prefix("team-").unwrap_or(team_id);
        let channels = channels
            .iter()
            .map(|(suffix, name)| Channel {
                id: format!("channel-{short}-{suffix}"),
                team_id: team_id.to_string(),
                display_name: (*name).to_string(),
            })
            .collect();
        let members = members
            .iter()
            .map(|(user_id, role)| {
                let display_name = self.users.get(*user_id).cloned().unwrap_or_default();
                let member = TeamMember {
                    user_id: (*user_id).to_string(),
                    display_name,
                    role: *role,
                };
                ((*user_id).to_string(), member)
            })
            .collect();
        self.teams.insert(
            team_id.to_string(),
            SeedTeam {
                team: Team {
                    id: team_id.to_string(),
                    display_name: display_name.to_string(),
                    description: description.to_string(),
                },
                channels,
                members,
            },
        );
    }

    /// Adds a meeting spanning `(start, end)`.
    pub fn add_meeting(
        &mut self,
        meeting_id: &str,
        subject: &str,
        organizer_id: &str,
        (start, end): (&str, &str),
    ) {
        self.meetings.insert(
            meeting_id.to_string(),
            Meeting {
                id: meeting_id.to_string(),
                subject: subject.to_string(),
                organizer_id: organizer_id.to_string(),
                start: start.to_string(),
                end: end.to_string(),
            },
        );
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
