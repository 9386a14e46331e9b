// crates/collab-gateway-auth/src/detector.rs
// ============================================================================
// Module: Credential Source Detector
// Description: Runs every identity store probe and builds a detection report.
// Purpose: Probe independently, tolerate failures, and pick by fixed priority.
// Dependencies: tokio, tracing
// ============================================================================

//! ## Overview
//! Probes run concurrently, each on its own task. A probe that errors or
//! panics is recorded as an unavailable source with the failure as its
//! reason; it never prevents the other probes from reporting. The resulting
//! [`DetectionReport`] orders records by priority, so the preferred source
//! does not depend on which probe finished first.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use collab_gateway_core::CredentialSource;
use collab_gateway_core::CredentialSourceKind;
use collab_gateway_core::DetectionReport;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::warn;

use crate::probe::CliToolProbe;
use crate::probe::CredentialProbe;
use crate::probe::EditorExtensionProbe;
use crate::probe::PlatformVaultProbe;
use crate::probe::StaticProbe;
use crate::settings::AuthSettings;

// ============================================================================
// SECTION: Detector
// ============================================================================

/// Credential source detector.
#[derive(Clone)]
pub struct CredentialDetector {
    /// Probes in no particular order.
    probes: Vec<Arc<dyn CredentialProbe>>,
}

impl CredentialDetector {
    /// Creates a detector over explicit probes.
    #[must_use]
    pub fn new(probes: Vec<Arc<dyn CredentialProbe>>) -> Self {
        Self {
            probes,
        }
    }

    /// Creates the standard three-probe detector from settings.
    #[must_use]
    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(vec![
            Arc::new(CliToolProbe::new(settings.cli.clone())),
            Arc::new(EditorExtensionProbe::new(settings.editor.clone())),
            Arc::new(PlatformVaultProbe::new(settings.vault.clone())),
        ])
    }

    /// Creates a detector that reports a simulated logged-in identity tool.
    #[must_use]
    pub fn simulated(settings: &AuthSettings) -> Self {
        let mut cli = CredentialSource::available(CredentialSourceKind::CliTool)
            .with_detail("mode", "simulation");
        cli.tenant_hint = Some(settings.tenant_id.clone());
        cli.user_hint = Some("simulated-user".to_string());
        Self::new(vec![
            Arc::new(StaticProbe::new(cli)),
            Arc::new(StaticProbe::new(CredentialSource::unavailable(
                CredentialSourceKind::EditorExtension,
                "simulation",
            ))),
            Arc::new(StaticProbe::new(CredentialSource::unavailable(
                CredentialSourceKind::PlatformVault,
                "simulation",
            ))),
        ])
    }

    /// Runs every probe and returns the ordered report.
    pub async fn detect(&self, cancel: &CancellationToken) -> DetectionReport {
        let handles: Vec<_> = self
            .probes
            .iter()
            .map(|probe| {
                let probe = Arc::clone(probe);
                let cancel = cancel.clone();
                let kind = probe.kind();
                (kind, tokio::spawn(async move { probe.probe(&cancel).await }))
            })
            .collect();
        let mut sources = Vec::with_capacity(handles.len());
        for (kind, handle) in handles {
            let source = match handle.await {
                Ok(Ok(source)) => source,
                Ok(Err(err)) => {
                    warn!(source = %kind, error = %err, "credential probe failed");
                    CredentialSource::unavailable(kind, err.to_string())
                }
                Err(err) => {
                    warn!(source = %kind, error = %err, "credential probe task failed");
                    CredentialSource::unavailable(kind, format!("probe task failed: {err}"))
                }
            };
            debug!(source = %kind, available = source.available, "credential probe finished");
            sources.push(source);
        }
        DetectionReport::new(sources)
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

    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use collab_gateway_core::CredentialSource;
    use collab_gateway_core::CredentialSourceKind;
    use tokio_util::sync::CancellationToken;

    use super::CredentialDetector;
    use crate::error::ProbeError;
    use crate::probe::CredentialProbe;
    use crate::probe::StaticProbe;

    /// Probe that reports after a delay.
    struct SlowProbe {
        kind: CredentialSourceKind,
        delay: Duration,
    }

    #[async_trait]
    impl CredentialProbe for SlowProbe {
        fn kind(&self) -> CredentialSourceKind {
            self.kind
        }

        async fn probe(&self, _cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
            tokio::time::sleep(self.delay).await;
            Ok(CredentialSource::available(self.kind))
        }
    }

    /// Probe that always fails.
    struct FailingProbe;

    #[async_trait]
    impl CredentialProbe for FailingProbe {
        fn kind(&self) -> CredentialSourceKind {
            CredentialSourceKind::CliTool
        }

        async fn probe(&self, _cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
            Err(ProbeError::Io("boom".to_string()))
        }
    }

    /// Probe that panics.
    struct PanickingProbe;

    #[async_trait]
    impl CredentialProbe for PanickingProbe {
        fn kind(&self) -> CredentialSourceKind {
            CredentialSourceKind::EditorExtension
        }

        async fn probe(&self, _cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
            panic!("probe exploded");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn preference_ignores_completion_order() {
        let detector = CredentialDetector::new(vec![
            Arc::new(SlowProbe {
                kind: CredentialSourceKind::CliTool,
                delay: Duration::from_secs(5),
            }),
            Arc::new(SlowProbe {
                kind: CredentialSourceKind::PlatformVault,
                delay: Duration::from_millis(1),
            }),
        ]);
        let report = detector.detect(&CancellationToken::new()).await;
        assert_eq!(report.preferred().unwrap().kind, CredentialSourceKind::CliTool);
        assert_eq!(report.available().count(), 2);
    }

    #[tokio::test]
    async fn failing_probes_do_not_block_others() {
        let detector = CredentialDetector::new(vec![
            Arc::new(FailingProbe),
            Arc::new(PanickingProbe),
            Arc::new(StaticProbe::new(CredentialSource::available(
                CredentialSourceKind::PlatformVault,
            ))),
        ]);
        let report = detector.detect(&CancellationToken::new()).await;
        assert_eq!(report.sources().len(), 3);
        let cli = &report.sources()[0];
        assert!(!cli.available);
        assert_eq!(cli.details.get("reason").map(String::as_str), Some("io error: boom"));
        assert!(!report.sources()[1].available);
        assert_eq!(report.preferred().unwrap().kind, CredentialSourceKind::PlatformVault);
    }
}
