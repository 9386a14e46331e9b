// crates/collab-gateway-mcp/src/audit.rs
// ============================================================================
// Module: Gateway Audit Logging
// Description: Structured audit events for requests and authorization.
// Purpose: Emit redacted JSON audit lines without a logging pipeline dependency.
// Dependencies: collab-gateway-config, collab-gateway-core, serde
// ============================================================================

//! ## Overview
//! Two event kinds are recorded: one `gateway_request` line per handled
//! envelope and one `tool_authorization` line per permission decision.
//! Events never carry tool arguments or tokens. Sinks write JSON lines to
//! stderr, to an append-only file, or nowhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use collab_gateway_config::ServerAuditConfig;
use collab_gateway_config::ServerTransport;
use collab_gateway_core::PermissionLevel;
use serde::Serialize;

use crate::telemetry::McpMethod;
use crate::telemetry::McpOutcome;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct McpAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Envelope id rendered as a string, when present.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Method classification.
    pub method: McpMethod,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// Server-issued correlation id for `tools/call`.
    pub correlation_id: Option<String>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// Envelope error code when present.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request size in bytes.
    pub request_bytes: usize,
    /// Response size in bytes.
    pub response_bytes: usize,
}

/// Inputs required to construct a request audit event.
pub struct McpAuditEventParams {
    /// Envelope id rendered as a string, when present.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// Peer IP address if known.
    pub peer_ip: Option<String>,
    /// Method classification.
    pub method: McpMethod,
    /// Tool name for `tools/call`.
    pub tool: Option<String>,
    /// Server-issued correlation id for `tools/call`.
    pub correlation_id: Option<String>,
    /// Request outcome.
    pub outcome: McpOutcome,
    /// Envelope error code when present.
    pub error_code: Option<i64>,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request size in bytes.
    pub request_bytes: usize,
    /// Response size in bytes.
    pub response_bytes: usize,
}

impl McpAuditEvent {
    /// Creates a new audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: McpAuditEventParams) -> Self {
        Self {
            event: "gateway_request",
            timestamp_ms: now_ms(),
            request_id: params.request_id,
            transport: params.transport,
            peer_ip: params.peer_ip,
            method: params.method,
            tool: params.tool,
            correlation_id: params.correlation_id,
            outcome: params.outcome,
            error_code: params.error_code,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
        }
    }
}

/// Authorization decision audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Correlation id of the call.
    pub correlation_id: String,
    /// Tool being authorized.
    pub tool: String,
    /// Decision label: `allowed` or `denied`.
    pub decision: &'static str,
    /// Permission level the tool requires.
    pub required: PermissionLevel,
    /// Permission level the caller holds.
    pub actual: PermissionLevel,
    /// Whether the caller had an authenticated session.
    pub authenticated: bool,
    /// Team hint in effect.
    pub team_id: Option<String>,
    /// Meeting hint in effect.
    pub meeting_id: Option<String>,
    /// Denial reason when denied.
    pub reason: Option<String>,
}

/// Inputs required to construct an authorization audit event.
pub struct AuthorizationAuditParams {
    /// Correlation id of the call.
    pub correlation_id: String,
    /// Tool being authorized.
    pub tool: String,
    /// Permission level the tool requires.
    pub required: PermissionLevel,
    /// Permission level the caller holds.
    pub actual: PermissionLevel,
    /// Whether the caller had an authenticated session.
    pub authenticated: bool,
    /// Team hint in effect.
    pub team_id: Option<String>,
    /// Meeting hint in effect.
    pub meeting_id: Option<String>,
    /// Denial reason; `None` means allowed.
    pub denial: Option<String>,
}

impl AuthorizationAuditEvent {
    /// Creates a new authorization event with a consistent timestamp.
    #[must_use]
    pub fn new(params: AuthorizationAuditParams) -> Self {
        let decision = if params.denial.is_some() { "denied" } else { "allowed" };
        Self {
            event: "tool_authorization",
            timestamp_ms: now_ms(),
            correlation_id: params.correlation_id,
            tool: params.tool,
            decision,
            required: params.required,
            actual: params.actual,
            authenticated: params.authenticated,
            team_id: params.team_id,
            meeting_id: params.meeting_id,
            reason: params.denial,
        }
    }
}

/// Milliseconds since the unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for gateway events.
pub trait McpAuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &McpAuditEvent);

    /// Record an authorization audit event.
    fn record_authorization(&self, _event: &AuthorizationAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct McpStderrAuditSink;

impl McpStderrAuditSink {
    /// Writes one serialized event line.
    fn write_line<T: Serialize>(event: &T) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

impl McpAuditSink for McpStderrAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        Self::write_line(event);
    }

    fn record_authorization(&self, event: &AuthorizationAuditEvent) {
        Self::write_line(event);
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct McpFileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl McpFileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends one serialized event line.
    fn write_line<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl McpAuditSink for McpFileAuditSink {
    fn record(&self, event: &McpAuditEvent) {
        self.write_line(event);
    }

    fn record_authorization(&self, event: &AuthorizationAuditEvent) {
        self.write_line(event);
    }
}

/// No-op audit sink.
pub struct McpNoopAuditSink;

impl McpAuditSink for McpNoopAuditSink {
    fn record(&self, _event: &McpAuditEvent) {}
}

/// Builds the sink selected by `[server.audit]`.
///
/// # Errors
///
/// Returns an error when the configured audit file cannot be opened.
pub fn audit_sink_from_config(config: &ServerAuditConfig) -> io::Result<Arc<dyn McpAuditSink>> {
    if !config.enabled {
        return Ok(Arc::new(McpNoopAuditSink));
    }
    match &config.path {
        Some(path) => Ok(Arc::new(McpFileAuditSink::new(Path::new(path))?)),
        None => Ok(Arc::new(McpStderrAuditSink)),
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

    use collab_gateway_config::ServerAuditConfig;
    use collab_gateway_config::ServerTransport;
    use collab_gateway_core::PermissionLevel;
    use serde_json::Value;

    use super::AuthorizationAuditEvent;
    use super::AuthorizationAuditParams;
    use super::McpAuditEvent;
    use super::McpAuditEventParams;
    use super::audit_sink_from_config;
    use crate::telemetry::McpMethod;
    use crate::telemetry::McpOutcome;

    #[test]
    fn file_sink_appends_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let config = ServerAuditConfig {
            enabled: true,
            path: Some(path.to_string_lossy().into_owned()),
        };
        let sink = audit_sink_from_config(&config).unwrap();
        sink.record(&McpAuditEvent::new(McpAuditEventParams {
            request_id: Some("1".to_string()),
            transport: ServerTransport::Stdio,
            peer_ip: None,
            method: McpMethod::ToolsCall,
            tool: Some("list_teams".to_string()),
            correlation_id: Some("cg-1".to_string()),
            outcome: McpOutcome::Ok,
            error_code: None,
            error_kind: None,
            request_bytes: 10,
            response_bytes: 20,
        }));
        sink.record_authorization(&AuthorizationAuditEvent::new(AuthorizationAuditParams {
            correlation_id: "cg-1".to_string(),
            tool: "list_channels".to_string(),
            required: PermissionLevel::Member,
            actual: PermissionLevel::Guest,
            authenticated: false,
            team_id: None,
            meeting_id: None,
            denial: Some("team context required".to_string()),
        }));

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> =
            contents.lines().map(|line| serde_json::from_str(line).unwrap()).collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "gateway_request");
        assert_eq!(lines[0]["method"], "tools_call");
        assert_eq!(lines[0]["transport"], "stdio");
        assert_eq!(lines[1]["event"], "tool_authorization");
        assert_eq!(lines[1]["decision"], "denied");
        assert_eq!(lines[1]["required"], "member");
    }

    #[test]
    fn disabled_audit_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let config = ServerAuditConfig {
            enabled: false,
            path: Some(path.to_string_lossy().into_owned()),
        };
        let _sink = audit_sink_from_config(&config).unwrap();
        assert!(!path.exists());
    }
}
