// crates/collab-gateway-auth/src/process.rs
// ============================================================================
// Module: Bounded Command Runner
// Description: Runs external identity commands with timeout and cancellation.
// Purpose: Keep a hung identity tool from stalling detection or exchange.
// Dependencies: tokio, tokio-util
// ============================================================================

//! ## Overview
//! Identity tools are external processes and may hang (waiting on a network
//! call, a lock, or a prompt). [`run_command`] runs one with stdin closed,
//! captures its output, and kills it when either the timeout elapses or the
//! caller's cancellation token fires.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum captured stdout size in bytes.
const MAX_STDOUT_BYTES: usize = 256 * 1024;

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Output of a successful command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured stdout decoded as UTF-8 (lossy).
    pub stdout: String,
}

/// Runs `command` (program followed by arguments) under `timeout`.
///
/// The child is killed when the timeout elapses, when `cancel` fires, or when
/// the returned future is dropped.
///
/// # Errors
///
/// Returns [`ProbeError`] when the program is missing, cannot be started,
/// exits unsuccessfully, times out, or is cancelled.
pub async fn run_command(
    command: &[String],
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<CommandOutput, ProbeError> {
    let Some((program, args)) = command.split_first() else {
        return Err(ProbeError::Spawn {
            program: String::new(),
            reason: "empty command".to_string(),
        });
    };
    if cancel.is_cancelled() {
        return Err(ProbeError::Cancelled);
    }
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| match err.kind() {
            ErrorKind::NotFound => ProbeError::NotInstalled(program.clone()),
            _ => ProbeError::Spawn {
                program: program.clone(),
                reason: err.to_string(),
            },
        })?;

    let output = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(ProbeError::Cancelled),
        result = tokio::time::timeout(timeout, child.wait_with_output()) => match result {
            Ok(output) => output.map_err(|err| ProbeError::Io(err.to_string()))?,
            Err(_) => {
                return Err(ProbeError::Timeout {
                    program: program.clone(),
                    timeout_ms: timeout.as_millis(),
                });
            }
        },
    };

    if !output.status.success() {
        return Err(ProbeError::Exit {
            program: program.clone(),
            status: output.status.to_string(),
        });
    }
    if output.stdout.len() > MAX_STDOUT_BYTES {
        return Err(ProbeError::Parse(format!("{program} output exceeds size limit")));
    }
    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
