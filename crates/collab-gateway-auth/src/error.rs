// crates/collab-gateway-auth/src/error.rs
// ============================================================================
// Module: Auth Errors
// Description: Error types for probing and session establishment.
// Purpose: Keep probe failures local and surface authentication failures typed.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`ProbeError`] describes why one identity store could not be probed; the
//! detector folds it into an unavailable source record and never propagates
//! it. [`AuthenticationError`] is what a caller sees when no session could be
//! established, and is distinct from any authorization outcome.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// SECTION: Probe Errors
// ============================================================================

/// Failures while probing a single identity store or running its command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// The command could not be started.
    #[error("failed to start {program}: {reason}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Underlying failure.
        reason: String,
    },
    /// The program is not installed.
    #[error("{0} is not installed")]
    NotInstalled(String),
    /// The command exceeded its timeout and was killed.
    #[error("{program} timed out after {timeout_ms} ms")]
    Timeout {
        /// Program that timed out.
        program: String,
        /// Configured timeout.
        timeout_ms: u128,
    },
    /// The caller cancelled the probe.
    #[error("probe cancelled")]
    Cancelled,
    /// The command exited unsuccessfully.
    #[error("{program} exited with status {status}")]
    Exit {
        /// Program that failed.
        program: String,
        /// Exit status description.
        status: String,
    },
    /// Command output could not be parsed.
    #[error("unexpected output: {0}")]
    Parse(String),
    /// Filesystem access failed.
    #[error("io error: {0}")]
    Io(String),
    /// The platform vault could not be queried.
    #[error("vault error: {0}")]
    Vault(String),
    /// The probe panicked or was aborted.
    #[error("probe task failed: {0}")]
    Task(String),
}

// ============================================================================
// SECTION: Authentication Errors
// ============================================================================

/// Failures establishing a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticationError {
    /// The wait was cancelled by the caller or the connection closed.
    #[error("authentication cancelled")]
    Cancelled,
    /// The device code expired or the wait bound elapsed before completion.
    #[error("device code expired before sign-in completed")]
    DeviceCodeExpired,
    /// The user declined the sign-in request.
    #[error("sign-in was declined")]
    AccessDenied,
    /// No external credential was usable and interactive sign-in is disabled.
    #[error("no usable credential found and interactive sign-in is disabled")]
    InteractionRequired,
    /// Required settings are missing.
    #[error("authentication is not configured: {0}")]
    NotConfigured(String),
    /// Exchanging an external credential failed.
    #[error("credential exchange failed: {0}")]
    Exchange(String),
    /// The identity provider returned an error or unreadable response.
    #[error("identity provider error: {0}")]
    Provider(String),
    /// The identity provider could not be reached.
    #[error("identity provider unreachable: {0}")]
    Transport(String),
}

impl From<ProbeError> for AuthenticationError {
    fn from(error: ProbeError) -> Self {
        match error {
            ProbeError::Cancelled => Self::Cancelled,
            other => Self::Exchange(other.to_string()),
        }
    }
}
