// crates/collab-gateway-auth/src/probe/mod.rs
// ============================================================================
// Module: Credential Probes
// Description: Probe trait and the three identity store probes.
// Purpose: Give the detector a uniform, fault-isolated probe surface.
// Dependencies: async-trait, tokio-util
// ============================================================================

//! ## Overview
//! Each probe inspects one identity store and reports what it found. Probes
//! are read-only: the command-line probe only asks the tool which account is
//! active, the editor probe only checks that the token store exists, and the
//! vault probe only checks whether known entries exist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use collab_gateway_core::CredentialSource;
use collab_gateway_core::CredentialSourceKind;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cli;
pub mod editor;
pub mod vault;

pub use cli::CliToolProbe;
pub use editor::EditorExtensionProbe;
pub use vault::KeyringVaultBackend;
pub use vault::PlatformVaultProbe;
pub use vault::VaultBackend;
pub use vault::VaultLookupError;

// ============================================================================
// SECTION: Probe Trait
// ============================================================================

/// Probe for a single identity store.
#[async_trait]
pub trait CredentialProbe: Send + Sync {
    /// Store this probe inspects.
    fn kind(&self) -> CredentialSourceKind;

    /// Inspects the store.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError`] when the store could not be inspected; the
    /// detector records it as an unavailable source.
    async fn probe(&self, cancel: &CancellationToken) -> Result<CredentialSource, ProbeError>;
}

/// Probe that always reports a fixed record.
#[derive(Debug, Clone)]
pub struct StaticProbe {
    /// Record returned by every probe call.
    source: CredentialSource,
}

impl StaticProbe {
    /// Creates a probe returning `source`.
    #[must_use]
    pub const fn new(source: CredentialSource) -> Self {
        Self {
            source,
        }
    }
}

#[async_trait]
impl CredentialProbe for StaticProbe {
    fn kind(&self) -> CredentialSourceKind {
        self.source.kind
    }

    async fn probe(&self, _cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
        Ok(self.source.clone())
    }
}
