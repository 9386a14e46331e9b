// crates/collab-gateway-auth/src/probe/cli.rs
// ============================================================================
// Module: Command-Line Identity Tool Probe
// Description: Asks the identity CLI which account is active.
// Purpose: Report the highest-priority credential source with its hints.
// Dependencies: serde_json, tokio-util
// ============================================================================

//! ## Overview
//! The probe runs the configured account command (by default
//! `az account show --output json`). A successful run means the tool is
//! installed and logged in; its tenant and user are reported as hints. A
//! missing tool or a non-zero exit means the source is unavailable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use collab_gateway_core::CredentialSource;
use collab_gateway_core::CredentialSourceKind;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::ProbeError;
use crate::probe::CredentialProbe;
use crate::process::run_command;
use crate::settings::CliProbeSettings;

// ============================================================================
// SECTION: Output Shape
// ============================================================================

/// Account description printed by the identity CLI.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountOutput {
    /// Tenant of the active account.
    tenant_id: Option<String>,
    /// Signed-in user.
    user: Option<AccountUser>,
    /// Subscription or account display name.
    name: Option<String>,
}

/// User block of the account description.
#[derive(Debug, Deserialize)]
struct AccountUser {
    /// Principal name.
    name: Option<String>,
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Probe for the command-line identity tool.
#[derive(Debug, Clone)]
pub struct CliToolProbe {
    /// Probe settings.
    settings: CliProbeSettings,
}

impl CliToolProbe {
    /// Creates the probe.
    #[must_use]
    pub const fn new(settings: CliProbeSettings) -> Self {
        Self {
            settings,
        }
    }
}

#[async_trait]
impl CredentialProbe for CliToolProbe {
    fn kind(&self) -> CredentialSourceKind {
        CredentialSourceKind::CliTool
    }

    async fn probe(&self, cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
        let kind = self.kind();
        if !self.settings.enabled {
            return Ok(CredentialSource::unavailable(kind, "disabled"));
        }
        let output =
            match run_command(&self.settings.account_command, self.settings.timeout, cancel).await {
                Ok(output) => output,
                Err(ProbeError::NotInstalled(program)) => {
                    return Ok(CredentialSource::unavailable(
                        kind,
                        format!("{program} is not installed"),
                    ));
                }
                Err(ProbeError::Exit {
                    program,
                    status,
                }) => {
                    debug!(program = %program, status = %status, "identity cli not logged in");
                    return Ok(CredentialSource::unavailable(kind, "not logged in"));
                }
                Err(other) => return Err(other),
            };
        let account: AccountOutput = serde_json::from_str(output.stdout.trim())
            .map_err(|err| ProbeError::Parse(err.to_string()))?;
        let mut source = CredentialSource::available(kind);
        source.tenant_hint = account.tenant_id;
        source.user_hint = account.user.and_then(|user| user.name);
        if let Some(name) = account.name {
            source = source.with_detail("account", name);
        }
        Ok(source)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
