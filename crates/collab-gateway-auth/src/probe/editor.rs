// crates/collab-gateway-auth/src/probe/editor.rs
// ============================================================================
// Module: Editor Identity Extension Probe
// Description: Checks that the editor extension's token store exists.
// Purpose: Report the editor source without reading any credential material.
// Dependencies: tokio
// ============================================================================

//! ## Overview
//! Only the existence of the token-store file is checked. Its contents are
//! never opened, so the probe needs no more access than a directory listing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use collab_gateway_core::CredentialSource;
use collab_gateway_core::CredentialSourceKind;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::probe::CredentialProbe;
use crate::settings::EditorProbeSettings;

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Probe for the editor identity extension token store.
#[derive(Debug, Clone)]
pub struct EditorExtensionProbe {
    /// Probe settings.
    settings: EditorProbeSettings,
}

impl EditorExtensionProbe {
    /// Creates the probe.
    #[must_use]
    pub const fn new(settings: EditorProbeSettings) -> Self {
        Self {
            settings,
        }
    }
}

#[async_trait]
impl CredentialProbe for EditorExtensionProbe {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::EditorExtension
    }

    async fn probe(&self, cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
        let kind = self.kind();
        if !self.settings.enabled {
            return Ok(CredentialSource::unavailable(kind, "disabled"));
        }
        let Some(path) = &self.settings.token_store_path else {
            return Ok(CredentialSource::unavailable(kind, "no token store location"));
        };
        let display = path.display().to_string();
        let exists = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ProbeError::Cancelled),
            result = tokio::fs::try_exists(path) => {
                result.map_err(|err| ProbeError::Io(err.to_string()))?
            }
        };
        if exists {
            Ok(CredentialSource::available(kind).with_detail("path", display))
        } else {
            Ok(CredentialSource::unavailable(kind, "token store not found")
                .with_detail("path", display))
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

    use tokio_util::sync::CancellationToken;

    use super::EditorExtensionProbe;
    use crate::probe::CredentialProbe;
    use crate::settings::EditorProbeSettings;

    #[tokio::test]
    async fn existing_store_is_available() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"opaque").unwrap();
        let probe = EditorExtensionProbe::new(EditorProbeSettings {
            enabled: true,
            token_store_path: Some(path.clone()),
        });
        let source = probe.probe(&CancellationToken::new()).await.unwrap();
        assert!(source.available);
        assert_eq!(source.details.get("path"), Some(&path.display().to_string()));
    }

    #[tokio::test]
    async fn missing_store_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let probe = EditorExtensionProbe::new(EditorProbeSettings {
            enabled: true,
            token_store_path: Some(dir.path().join("absent.json")),
        });
        let source = probe.probe(&CancellationToken::new()).await.unwrap();
        assert!(!source.available);
        assert_eq!(
            source.details.get("reason").map(String::as_str),
            Some("token store not found")
        );
    }
}
