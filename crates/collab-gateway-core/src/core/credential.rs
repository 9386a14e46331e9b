// crates/collab-gateway-core/src/core/credential.rs
// ============================================================================
// Module: Credential Sources
// Description: Detection results for external identity stores.
// Purpose: Define the fixed source priority and the preferred-source rule.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A detection pass probes each external identity store and records one
//! [`CredentialSource`] per store. [`DetectionReport`] keeps the records in
//! fixed priority order (command-line tool, editor extension, platform vault)
//! so the preferred source is the first available one no matter which probe
//! finished first. Reports are recomputed on every pass and never persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

// ============================================================================
// SECTION: Source Kinds
// ============================================================================

/// External identity store kinds, declared in priority order.
///
/// # Invariants
/// - `Ord` follows declaration order, which is the preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSourceKind {
    /// Command-line identity tool with an active login.
    CliTool,
    /// Local editor identity extension token store.
    EditorExtension,
    /// Platform-native credential vault.
    PlatformVault,
}

impl CredentialSourceKind {
    /// All kinds in priority order.
    pub const ALL: [Self; 3] = [Self::CliTool, Self::EditorExtension, Self::PlatformVault];

    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CliTool => "cli_tool",
            Self::EditorExtension => "editor_extension",
            Self::PlatformVault => "platform_vault",
        }
    }
}

impl fmt::Display for CredentialSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Source Records
// ============================================================================

/// Result of probing one identity store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSource {
    /// Store that was probed.
    pub kind: CredentialSourceKind,
    /// Whether the store holds a usable identity.
    pub available: bool,
    /// Tenant hint reported by the store.
    pub tenant_hint: Option<String>,
    /// User hint reported by the store.
    pub user_hint: Option<String>,
    /// Free-form probe details (paths, labels, failure reasons).
    pub details: BTreeMap<String, String>,
}

impl CredentialSource {
    /// Builds an available record with no hints.
    #[must_use]
    pub const fn available(kind: CredentialSourceKind) -> Self {
        Self {
            kind,
            available: true,
            tenant_hint: None,
            user_hint: None,
            details: BTreeMap::new(),
        }
    }

    /// Builds an unavailable record carrying the reason in `details`.
    #[must_use]
    pub fn unavailable(kind: CredentialSourceKind, reason: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert("reason".to_string(), reason.into());
        Self {
            kind,
            available: false,
            tenant_hint: None,
            user_hint: None,
            details,
        }
    }

    /// Returns a copy with a detail entry added.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

// ============================================================================
// SECTION: Detection Report
// ============================================================================

/// Full result of one detection pass.
///
/// # Invariants
/// - `sources` is sorted by [`CredentialSourceKind`] priority.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectionReport {
    /// One record per probed store.
    sources: Vec<CredentialSource>,
}

impl DetectionReport {
    /// Builds a report, ordering records by source priority.
    #[must_use]
    pub fn new(mut sources: Vec<CredentialSource>) -> Self {
        sources.sort_by_key(|source| source.kind);
        Self {
            sources,
        }
    }

    /// Returns every probed record in priority order.
    #[must_use]
    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    /// Returns the available records in priority order.
    pub fn available(&self) -> impl Iterator<Item = &CredentialSource> {
        self.sources.iter().filter(|source| source.available)
    }

    /// Returns the highest-priority available record.
    #[must_use]
    pub fn preferred(&self) -> Option<&CredentialSource> {
        self.available().next()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
