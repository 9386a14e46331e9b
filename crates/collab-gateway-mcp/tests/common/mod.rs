// crates/collab-gateway-mcp/tests/common/mod.rs
// =============================================================================
// Module: Gateway Test Helpers
// Description: Gateway fixtures over the in-memory directory.
// Purpose: Build authenticated or anonymous gateways and drive envelopes.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::unwrap_used, reason = "Test fixtures fail loudly on setup errors.")]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use collab_gateway_auth::AuthSettings;
use collab_gateway_auth::SessionComponents;
use collab_gateway_auth::SessionManager;
use collab_gateway_auth::SilentPrompt;
use collab_gateway_config::CollabGatewayConfig;
use collab_gateway_config::DirectoryConfig;
use collab_gateway_core::CollaborationApi;
use collab_gateway_core::ManualClock;
use collab_gateway_core::SharedClock;
use collab_gateway_directory::InMemoryDirectory;
use collab_gateway_mcp::ContextResolver;
use collab_gateway_mcp::ProtocolGateway;
use collab_gateway_mcp::RequestContext;
use collab_gateway_mcp::ToolRegistry;
use collab_gateway_mcp::ToolRouter;
use collab_gateway_mcp::ToolServices;
use collab_gateway_mcp::audit::AuthorizationAuditEvent;
use collab_gateway_mcp::audit::McpAuditEvent;
use collab_gateway_mcp::audit::McpAuditSink;
use collab_gateway_mcp::builtin_registry;
use collab_gateway_mcp::telemetry::McpMetricEvent;
use collab_gateway_mcp::telemetry::McpMetrics;
use serde_json::Value;
use serde_json::json;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

/// Caller id configured in the default directory identity.
pub const CALLER: &str = "user-0001";

/// Fixed instant used by the manual clock.
pub fn start_time() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Audit sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingAudit {
    pub requests: Mutex<Vec<McpAuditEvent>>,
    pub authorizations: Mutex<Vec<AuthorizationAuditEvent>>,
}

impl McpAuditSink for RecordingAudit {
    fn record(&self, event: &McpAuditEvent) {
        self.requests.lock().unwrap().push(event.clone());
    }

    fn record_authorization(&self, event: &AuthorizationAuditEvent) {
        self.authorizations.lock().unwrap().push(event.clone());
    }
}

/// Metrics sink that keeps every event in memory.
#[derive(Default)]
pub struct RecordingMetrics {
    pub requests: Mutex<Vec<McpMetricEvent>>,
    pub latencies: Mutex<Vec<(McpMetricEvent, Duration)>>,
}

impl McpMetrics for RecordingMetrics {
    fn record_request(&self, event: McpMetricEvent) {
        self.requests.lock().unwrap().push(event);
    }

    fn record_latency(&self, event: McpMetricEvent, latency: Duration) {
        self.latencies.lock().unwrap().push((event, latency));
    }
}

/// Assembled gateway plus handles for assertions.
pub struct Harness {
    pub gateway: Arc<ProtocolGateway>,
    pub directory: InMemoryDirectory,
    pub sessions: Arc<SessionManager>,
    pub audit: Arc<RecordingAudit>,
    pub metrics: Arc<RecordingMetrics>,
}

/// How the harness session manager obtains tokens.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Caller {
    /// Simulated credential exchange succeeds.
    Authenticated,
    /// Every credential source is disabled and interaction is off.
    Anonymous,
}

/// Builds auth settings for `caller`.
pub fn settings_for(caller: Caller) -> AuthSettings {
    let mut config = CollabGatewayConfig::default();
    config.simulation.enabled = caller == Caller::Authenticated;
    let mut settings = AuthSettings::from_config(&config);
    settings.cli.enabled = false;
    settings.editor.enabled = false;
    settings.vault.enabled = false;
    settings.required = false;
    settings
}

/// Builds a harness over the built-in catalog.
pub fn harness(caller: Caller) -> Harness {
    harness_with(caller, builtin_registry().unwrap(), |_| {})
}

/// Builds a harness over `registry` with a customized directory.
pub fn harness_with(
    caller: Caller,
    registry: ToolRegistry,
    configure: impl FnOnce(&mut DirectoryConfig),
) -> Harness {
    let settings = settings_for(caller);
    let components = SessionComponents::from_settings(&settings, Arc::new(SilentPrompt)).unwrap();
    let clock: SharedClock = Arc::new(ManualClock::new(start_time()));
    let sessions = Arc::new(SessionManager::new(settings, components, Arc::clone(&clock)));

    let mut directory_config = DirectoryConfig::default();
    configure(&mut directory_config);
    let directory = InMemoryDirectory::from_config(&directory_config);
    let collaborator: Arc<dyn CollaborationApi> = Arc::new(directory.clone());

    let audit = Arc::new(RecordingAudit::default());
    let resolver = ContextResolver::new(Arc::clone(&sessions), Arc::clone(&collaborator));
    let services = ToolServices {
        collaborator,
        sessions: Arc::clone(&sessions),
    };
    let router = ToolRouter::new(registry, resolver, services, audit.clone());
    let metrics = Arc::new(RecordingMetrics::default());
    let gateway = Arc::new(
        ProtocolGateway::new(router, clock, audit.clone()).with_metrics(metrics.clone()),
    );
    Harness {
        gateway,
        directory,
        sessions,
        audit,
        metrics,
    }
}

/// Sends raw bytes and parses the response, if any.
pub async fn send_raw(gateway: &ProtocolGateway, bytes: &[u8]) -> Option<Value> {
    let cancel = CancellationToken::new();
    gateway
        .handle(&RequestContext::stdio(), bytes, &cancel)
        .await
        .map(|body| serde_json::from_slice(&body).unwrap())
}

/// Sends one envelope and returns the response.
pub async fn send(gateway: &ProtocolGateway, envelope: Value) -> Value {
    send_raw(gateway, envelope.to_string().as_bytes()).await.unwrap()
}

/// Calls a tool and returns the response envelope.
pub async fn call_tool(gateway: &ProtocolGateway, name: &str, arguments: Value) -> Value {
    send(
        gateway,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments},
        }),
    )
    .await
}

/// Returns the error code of a response.
pub fn error_code(response: &Value) -> i64 {
    response["error"]["code"].as_i64().unwrap()
}
