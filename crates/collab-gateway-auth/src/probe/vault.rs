// crates/collab-gateway-auth/src/probe/vault.rs
// ============================================================================
// Module: Platform Vault Probe
// Description: Looks for known entries in the platform credential vault.
// Purpose: Report the vault source by entry existence only.
// Dependencies: keyring, tokio
// ============================================================================

//! ## Overview
//! The probe checks each configured `service/account` label against the
//! platform vault. Labels are restricted at configuration time to a small set
//! of known service prefixes. Secret values are discarded as soon as the
//! backend confirms an entry exists and never leave this module.
//!
//! Vault access is blocking on every platform, so lookups run on the blocking
//! pool. A backend outage on one label does not stop the others.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use collab_gateway_core::CredentialSource;
use collab_gateway_core::CredentialSourceKind;
use keyring::Entry;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ProbeError;
use crate::probe::CredentialProbe;
use crate::settings::VaultLabel;
use crate::settings::VaultProbeSettings;

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Vault lookup failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultLookupError {
    /// The vault is temporarily unreachable (locked, no session bus).
    Recoverable(String),
    /// The lookup failed for any other reason.
    Permanent(String),
}

impl VaultLookupError {
    /// Returns a short description.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Recoverable(message) | Self::Permanent(message) => message,
        }
    }
}

impl From<keyring::Error> for VaultLookupError {
    fn from(err: keyring::Error) -> Self {
        match err {
            keyring::Error::PlatformFailure(_) | keyring::Error::NoStorageAccess(_) => {
                Self::Recoverable(err.to_string())
            }
            other => Self::Permanent(other.to_string()),
        }
    }
}

/// Blocking vault backend.
pub trait VaultBackend: Send + Sync {
    /// Returns true when an entry exists for `service`/`account`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultLookupError`] when the vault cannot be queried.
    fn entry_exists(&self, service: &str, account: &str) -> Result<bool, VaultLookupError>;
}

/// Platform-native vault through the `keyring` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringVaultBackend;

impl VaultBackend for KeyringVaultBackend {
    fn entry_exists(&self, service: &str, account: &str) -> Result<bool, VaultLookupError> {
        let entry = Entry::new(service, account)?;
        match entry.get_password() {
            Ok(_) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Probe for the platform credential vault.
#[derive(Clone)]
pub struct PlatformVaultProbe {
    /// Probe settings.
    settings: VaultProbeSettings,
    /// Vault backend.
    backend: Arc<dyn VaultBackend>,
}

impl PlatformVaultProbe {
    /// Creates the probe over the platform keyring.
    #[must_use]
    pub fn new(settings: VaultProbeSettings) -> Self {
        Self::with_backend(settings, Arc::new(KeyringVaultBackend))
    }

    /// Creates the probe over a custom backend.
    #[must_use]
    pub fn with_backend(settings: VaultProbeSettings, backend: Arc<dyn VaultBackend>) -> Self {
        Self {
            settings,
            backend,
        }
    }

    /// Looks up one label on the blocking pool.
    async fn lookup(&self, label: &VaultLabel) -> Result<bool, VaultLookupError> {
        let backend = Arc::clone(&self.backend);
        let service = label.service.clone();
        let account = label.account.clone();
        tokio::task::spawn_blocking(move || backend.entry_exists(&service, &account))
            .await
            .map_err(|err| VaultLookupError::Permanent(err.to_string()))?
    }
}

#[async_trait]
impl CredentialProbe for PlatformVaultProbe {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::PlatformVault
    }

    async fn probe(&self, cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
        let kind = self.kind();
        if !self.settings.enabled {
            return Ok(CredentialSource::unavailable(kind, "disabled"));
        }
        if self.settings.labels.is_empty() {
            return Ok(CredentialSource::unavailable(kind, "no labels configured"));
        }
        let mut failures = Vec::new();
        for label in &self.settings.labels {
            let found = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ProbeError::Cancelled),
                result = self.lookup(label) => result,
            };
            match found {
                Ok(true) => {
                    let mut source =
                        CredentialSource::available(kind).with_detail("label", label.label());
                    source.user_hint = Some(label.account.clone());
                    return Ok(source);
                }
                Ok(false) => {}
                Err(err) => {
                    debug!(label = %label.label(), error = err.message(), "vault lookup failed");
                    failures.push(err);
                }
            }
        }
        if failures.len() == self.settings.labels.len() {
            let messages: Vec<&str> = failures.iter().map(VaultLookupError::message).collect();
            return Err(ProbeError::Vault(messages.join("; ")));
        }
        Ok(CredentialSource::unavailable(kind, "no known vault entries"))
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

    use std::collections::BTreeMap;
    use std::sync::Arc;

    use tokio_util::sync::CancellationToken;

    use super::PlatformVaultProbe;
    use super::VaultBackend;
    use super::VaultLookupError;
    use crate::error::ProbeError;
    use crate::probe::CredentialProbe;
    use crate::settings::VaultLabel;
    use crate::settings::VaultProbeSettings;

    /// Vault backend answering from a fixed table.
    struct FakeVault {
        entries: BTreeMap<String, Result<bool, VaultLookupError>>,
    }

    impl VaultBackend for FakeVault {
        fn entry_exists(&self, service: &str, account: &str) -> Result<bool, VaultLookupError> {
            self.entries.get(&format!("{service}/{account}")).cloned().unwrap_or(Ok(false))
        }
    }

    fn label(service: &str, account: &str) -> VaultLabel {
        VaultLabel {
            service: service.to_string(),
            account: account.to_string(),
        }
    }

    fn probe(
        labels: Vec<VaultLabel>,
        entries: Vec<(&str, Result<bool, VaultLookupError>)>,
    ) -> PlatformVaultProbe {
        let entries =
            entries.into_iter().map(|(key, value)| (key.to_string(), value)).collect();
        PlatformVaultProbe::with_backend(
            VaultProbeSettings {
                enabled: true,
                labels,
            },
            Arc::new(FakeVault {
                entries,
            }),
        )
    }

    #[tokio::test]
    async fn known_entry_marks_vault_available() {
        let probe = probe(
            vec![label("msal", "cache"), label("collab-gateway", "alice")],
            vec![("collab-gateway/alice", Ok(true))],
        );
        let source = probe.probe(&CancellationToken::new()).await.unwrap();
        assert!(source.available);
        assert_eq!(source.user_hint.as_deref(), Some("alice"));
        assert_eq!(
            source.details.get("label").map(String::as_str),
            Some("collab-gateway/alice")
        );
    }

    #[tokio::test]
    async fn one_failing_label_does_not_hide_others() {
        let probe = probe(
            vec![label("msal", "cache"), label("collab-gateway", "alice")],
            vec![
                ("msal/cache", Err(VaultLookupError::Recoverable("locked".to_string()))),
                ("collab-gateway/alice", Ok(true)),
            ],
        );
        let source = probe.probe(&CancellationToken::new()).await.unwrap();
        assert!(source.available);
    }

    #[tokio::test]
    async fn all_labels_failing_is_a_probe_error() {
        let probe = probe(
            vec![label("msal", "cache")],
            vec![("msal/cache", Err(VaultLookupError::Permanent("denied".to_string())))],
        );
        let error = probe.probe(&CancellationToken::new()).await.unwrap_err();
        assert_eq!(error, ProbeError::Vault("denied".to_string()));
    }

    #[tokio::test]
    async fn no_entries_is_unavailable() {
        let probe = probe(vec![label("msal", "cache")], Vec::new());
        let source = probe.probe(&CancellationToken::new()).await.unwrap();
        assert!(!source.available);
    }
}
