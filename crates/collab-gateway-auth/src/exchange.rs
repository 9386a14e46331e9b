// crates/collab-gateway-auth/src/exchange.rs
// ============================================================================
// Module: Credential Exchange
// Description: Turns a detected external credential into an access session.
// Purpose: Let the session manager use an existing login before asking the user.
// Dependencies: rand, serde_json, time, tokio-util
// ============================================================================

//! ## Overview
//! Only the command-line identity tool is exchangeable: its token command
//! prints a bearer token for the configured resource. Editor and vault
//! sources are reported by detection but their secrets are never read, so
//! [`CliTokenExchanger`] declines them and the session manager falls back to
//! the device-code flow. [`SimulatedExchanger`] issues local fake tokens.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use collab_gateway_core::AccessToken;
use collab_gateway_core::Clock;
use collab_gateway_core::CredentialSource;
use collab_gateway_core::CredentialSourceKind;
use collab_gateway_core::Session;
use collab_gateway_core::SessionSource;
use rand::RngCore;
use rand::rngs::OsRng;
use serde::Deserialize;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::error::AuthenticationError;
use crate::process::run_command;
use crate::settings::AuthSettings;

// ============================================================================
// SECTION: Exchanger Trait
// ============================================================================

/// Exchanges a detected credential source for a session.
#[async_trait]
pub trait CredentialExchanger: Send + Sync {
    /// Attempts the exchange.
    ///
    /// Returns `Ok(None)` when the source kind cannot be exchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the exchange was attempted and
    /// failed, or was cancelled.
    async fn exchange(
        &self,
        source: &CredentialSource,
        settings: &AuthSettings,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Option<Session>, AuthenticationError>;
}

// ============================================================================
// SECTION: Command-Line Tool Exchange
// ============================================================================

/// Token printed by the identity CLI token command.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliTokenOutput {
    /// Bearer token.
    access_token: String,
    /// Expiry as a unix timestamp.
    #[serde(default, rename = "expires_on")]
    expires_on_unix: Option<i64>,
    /// Tenant the token was issued for.
    #[serde(default)]
    tenant: Option<String>,
}

/// Exchanges the command-line identity tool's login for a token.
#[derive(Debug, Default, Clone, Copy)]
pub struct CliTokenExchanger;

#[async_trait]
impl CredentialExchanger for CliTokenExchanger {
    async fn exchange(
        &self,
        source: &CredentialSource,
        settings: &AuthSettings,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Option<Session>, AuthenticationError> {
        if source.kind != CredentialSourceKind::CliTool || !source.available {
            return Ok(None);
        }
        let output = run_command(&settings.cli.token_command, settings.cli.timeout, cancel).await?;
        let parsed: CliTokenOutput = serde_json::from_str(output.stdout.trim())
            .map_err(|err| AuthenticationError::Exchange(format!("token output: {err}")))?;
        if parsed.access_token.trim().is_empty() {
            return Err(AuthenticationError::Exchange("token output has empty token".to_string()));
        }
        let expires_on = parsed.expires_on_unix.ok_or_else(|| {
            AuthenticationError::Exchange("token output missing expires_on".to_string())
        })?;
        let expires_at = OffsetDateTime::from_unix_timestamp(expires_on)
            .map_err(|err| AuthenticationError::Exchange(format!("token expiry: {err}")))?;
        if expires_at <= clock.now() {
            return Err(AuthenticationError::Exchange("token already expired".to_string()));
        }
        Ok(Some(Session {
            access_token: AccessToken::new(parsed.access_token),
            expires_at,
            tenant_id: parsed.tenant.or_else(|| source.tenant_hint.clone()),
            scopes: settings.scopes.iter().cloned().collect(),
            account: source.user_hint.clone(),
            source: SessionSource::ExternalCredential(source.kind),
        }))
    }
}

// ============================================================================
// SECTION: Simulated Exchange
// ============================================================================

/// Issues a random fake token of the configured lifetime.
#[must_use]
pub fn simulated_session(
    settings: &AuthSettings,
    clock: &dyn Clock,
    account: Option<String>,
    source: SessionSource,
) -> Session {
    let lifetime = time::Duration::try_from(settings.simulated_token_lifetime)
        .unwrap_or(time::Duration::HOUR);
    Session {
        access_token: AccessToken::new(random_token()),
        expires_at: clock.now().saturating_add(lifetime),
        tenant_id: Some(settings.tenant_id.clone()),
        scopes: settings.scopes.iter().cloned().collect::<BTreeSet<_>>(),
        account,
        source,
    }
}

/// Returns a random hex token with a recognizable prefix.
fn random_token() -> String {
    let mut bytes = [0_u8; 24];
    OsRng.fill_bytes(&mut bytes);
    let mut token = String::from("sim-");
    for byte in bytes {
        let _ = write!(token, "{byte:02x}");
    }
    token
}

/// Exchanger that accepts any available source without I/O.
#[derive(Debug, Clone)]
pub struct SimulatedExchanger {
    /// Artificial exchange latency.
    latency: Duration,
}

impl SimulatedExchanger {
    /// Creates an exchanger with no latency.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            latency: Duration::ZERO,
        }
    }

    /// Creates an exchanger that waits `latency` before answering.
    #[must_use]
    pub const fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
        }
    }
}

impl Default for SimulatedExchanger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialExchanger for SimulatedExchanger {
    async fn exchange(
        &self,
        source: &CredentialSource,
        settings: &AuthSettings,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Option<Session>, AuthenticationError> {
        if !source.available {
            return Ok(None);
        }
        if !self.latency.is_zero() {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
                () = tokio::time::sleep(self.latency) => {}
            }
        }
        Ok(Some(simulated_session(
            settings,
            clock,
            source.user_hint.clone(),
            SessionSource::ExternalCredential(source.kind),
        )))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
