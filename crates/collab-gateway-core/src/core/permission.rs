// crates/collab-gateway-core/src/core/permission.rs
// ============================================================================
// Module: Permission Levels
// Description: Caller privilege tiers and the ordering used to gate tools.
// Purpose: Provide a single comparison rule shared by registry and pipeline.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Permission levels form the total order `Guest < Member < Owner`, with
//! `Organizer` as a sibling tier that only meeting-scoped tools may require.
//! Organizer is not comparable with Member or Owner: an organizer context
//! satisfies Guest and Organizer requirements only, and no team tier
//! satisfies an Organizer requirement.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Permission Level
// ============================================================================

/// Caller privilege tier.
///
/// # Invariants
/// - `Guest` is the default for unauthenticated or team-less callers.
/// - Wire labels are stable lowercase strings.
/// - Compared only through [`PermissionLevel::satisfies`]; `Organizer` is
///   not comparable with `Member` or `Owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Lowest tier; needs no team context.
    #[default]
    Guest,
    /// Regular team member.
    Member,
    /// Team owner.
    Owner,
    /// Meeting organizer (sibling tier for meeting-scoped tools).
    Organizer,
}

impl PermissionLevel {
    /// All levels in declaration order.
    pub const ALL: [Self; 4] = [Self::Guest, Self::Member, Self::Owner, Self::Organizer];

    /// Returns a stable label for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Owner => "owner",
            Self::Organizer => "organizer",
        }
    }

    /// Parses a stable label.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|level| level.as_str() == value)
    }

    /// Position in the team tier order, or `None` for the organizer sibling.
    const fn team_tier(self) -> Option<u8> {
        match self {
            Self::Guest => Some(0),
            Self::Member => Some(1),
            Self::Owner => Some(2),
            Self::Organizer => None,
        }
    }

    /// Returns true when a caller at `self` meets the `required` level.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        if matches!(required, Self::Guest) {
            return true;
        }
        match (self.team_tier(), required.team_tier()) {
            (Some(actual), Some(needed)) => actual >= needed,
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the context a caller must have before this level is checked.
    #[must_use]
    pub const fn scope(self) -> PermissionScope {
        match self {
            Self::Guest => PermissionScope::None,
            Self::Member | Self::Owner => PermissionScope::Team,
            Self::Organizer => PermissionScope::Meeting,
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Context a permission lookup is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionScope {
    /// No lookup; the level is granted unconditionally.
    None,
    /// Role lookup against the hinted team.
    Team,
    /// Organizer lookup against the hinted meeting.
    Meeting,
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

    use super::PermissionLevel;
    use super::PermissionScope;

    #[test]
    fn team_tiers_follow_total_order() {
        let tiers = [PermissionLevel::Guest, PermissionLevel::Member, PermissionLevel::Owner];
        for (caller_index, caller) in tiers.iter().enumerate() {
            for (required_index, required) in tiers.iter().enumerate() {
                assert_eq!(
                    caller.satisfies(*required),
                    caller_index >= required_index,
                    "caller {caller} required {required}"
                );
            }
        }
    }

    #[test]
    fn organizer_is_a_sibling_tier() {
        assert!(PermissionLevel::Organizer.satisfies(PermissionLevel::Organizer));
        assert!(PermissionLevel::Organizer.satisfies(PermissionLevel::Guest));
        assert!(!PermissionLevel::Organizer.satisfies(PermissionLevel::Member));
        assert!(!PermissionLevel::Organizer.satisfies(PermissionLevel::Owner));
        assert!(!PermissionLevel::Owner.satisfies(PermissionLevel::Organizer));
        assert!(!PermissionLevel::Guest.satisfies(PermissionLevel::Organizer));
    }

    #[test]
    fn organizer_and_team_tiers_are_incomparable() {
        for team_tier in [PermissionLevel::Member, PermissionLevel::Owner] {
            let upward = team_tier.satisfies(PermissionLevel::Organizer);
            let downward = PermissionLevel::Organizer.satisfies(team_tier);
            assert!(!upward && !downward, "{team_tier} compared with organizer");
        }
    }

    #[test]
    fn every_level_satisfies_guest() {
        for level in PermissionLevel::ALL {
            assert!(level.satisfies(PermissionLevel::Guest));
        }
    }

    #[test]
    fn scopes_match_levels() {
        assert_eq!(PermissionLevel::Guest.scope(), PermissionScope::None);
        assert_eq!(PermissionLevel::Member.scope(), PermissionScope::Team);
        assert_eq!(PermissionLevel::Owner.scope(), PermissionScope::Team);
        assert_eq!(PermissionLevel::Organizer.scope(), PermissionScope::Meeting);
    }

    #[test]
    fn labels_round_trip() {
        for level in PermissionLevel::ALL {
            assert_eq!(PermissionLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(PermissionLevel::parse("admin"), None);
    }
}
