// crates/collab-gateway-mcp/src/gateway.rs
// ============================================================================
// Module: Protocol Gateway
// Description: JSON-RPC 2.0 envelope parsing, method routing, and responses.
// Purpose: Turn one inbound envelope into at most one outbound envelope.
// Dependencies: serde, serde_json, time, tokio, tokio-util, tracing
// ============================================================================

//! ## Overview
//! [`ProtocolGateway::handle`] is the transport-independent boundary. It
//! accepts raw bytes and never fails: malformed JSON becomes a parse error
//! with a `null` id, a non-object or wrong-version envelope becomes an
//! invalid-request error, and unknown methods become method-not-found.
//! Envelopes without an `id` member are notifications; they are processed
//! and produce no response.
//!
//! `tools/call` runs on its own task so a panicking tool body is reported as
//! an internal error instead of taking the connection down. Every handled
//! envelope is audited and counted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use collab_gateway_core::SharedClock;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;

use crate::audit::McpAuditEvent;
use crate::audit::McpAuditEventParams;
use crate::audit::McpAuditSink;
use crate::registry::ToolDescriptor;
use crate::request::RequestContext;
use crate::telemetry::McpMethod;
use crate::telemetry::McpMetricEvent;
use crate::telemetry::McpMetrics;
use crate::telemetry::McpOutcome;
use crate::telemetry::NoopMetrics;
use crate::tools::ToolRouter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// JSON-RPC protocol version.
pub const JSONRPC_VERSION: &str = "2.0";
/// Protocol versions the gateway speaks, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-06-18", "2025-03-26", "2024-11-05"];
/// Protocol version answered when the client asks for an unknown one.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";
/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "collab-gateway";

/// Invalid JSON.
pub const PARSE_ERROR: i64 = -32_700;
/// Envelope is not a valid request.
pub const INVALID_REQUEST: i64 = -32_600;
/// Unknown method.
pub const METHOD_NOT_FOUND: i64 = -32_601;
/// Malformed method parameters.
pub const INVALID_PARAMS: i64 = -32_602;
/// Anything escaping the pipeline.
pub const INTERNAL_ERROR: i64 = -32_603;

// ============================================================================
// SECTION: Envelopes
// ============================================================================

/// JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version.
    pub jsonrpc: &'static str,
    /// Request id echoed back (`null` when unknown).
    pub id: Value,
    /// Successful result payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Builds a success envelope.
    #[must_use]
    pub const fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error envelope.
    #[must_use]
    pub fn failure(id: Value, code: i64, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data,
            }),
        }
    }
}

/// JSON-RPC error payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcError {
    /// Error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Structured detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// `tools/call` parameters.
#[derive(Debug, Deserialize)]
struct ToolCallParams {
    /// Tool name.
    name: String,
    /// Raw arguments; absent means an empty object.
    #[serde(default)]
    arguments: Option<Value>,
}

/// `tools/list` result.
#[derive(Debug, Serialize)]
struct ToolListResult<'a> {
    /// Registered tools in name order.
    tools: &'a [ToolDescriptor],
}

/// Serialized fallback when a response cannot be encoded.
const SERIALIZATION_FALLBACK: &[u8] =
    br#"{"jsonrpc":"2.0","id":null,"error":{"code":-32603,"message":"internal error"}}"#;

/// Encodes a response, falling back to a static internal error.
#[must_use]
pub fn encode_response(response: &JsonRpcResponse) -> Vec<u8> {
    serde_json::to_vec(response).unwrap_or_else(|_| SERIALIZATION_FALLBACK.to_vec())
}

/// Returns the encoded response for an oversized request.
#[must_use]
pub fn oversized_response(limit: usize) -> Vec<u8> {
    encode_response(&JsonRpcResponse::failure(
        Value::Null,
        INVALID_REQUEST,
        format!("request exceeds {limit} bytes"),
        None,
    ))
}

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Outcome of dispatching one envelope.
struct Dispatched {
    /// Method classification.
    method: McpMethod,
    /// Tool name for `tools/call`.
    tool: Option<String>,
    /// Correlation id for `tools/call`.
    correlation_id: Option<String>,
    /// Error kind label when the call failed in the pipeline.
    error_kind: Option<&'static str>,
    /// Response envelope.
    response: JsonRpcResponse,
}

impl Dispatched {
    /// Dispatch outcome with no tool metadata.
    const fn plain(method: McpMethod, response: JsonRpcResponse) -> Self {
        Self {
            method,
            tool: None,
            correlation_id: None,
            error_kind: None,
            response,
        }
    }
}

/// Protocol gateway.
pub struct ProtocolGateway {
    /// Invocation pipeline.
    router: Arc<ToolRouter>,
    /// Clock used for liveness timestamps.
    clock: SharedClock,
    /// Request audit sink.
    audit: Arc<dyn McpAuditSink>,
    /// Metrics sink.
    metrics: Arc<dyn McpMetrics>,
}

impl ProtocolGateway {
    /// Creates a gateway with no-op metrics.
    #[must_use]
    pub fn new(router: ToolRouter, clock: SharedClock, audit: Arc<dyn McpAuditSink>) -> Self {
        Self {
            router: Arc::new(router),
            clock,
            audit,
            metrics: Arc::new(NoopMetrics),
        }
    }

    /// Replaces the metrics sink.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn McpMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the invocation pipeline.
    #[must_use]
    pub fn router(&self) -> &ToolRouter {
        &self.router
    }

    /// Handles one envelope and returns the encoded response, if any.
    pub async fn handle(
        &self,
        request: &RequestContext,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> Option<Vec<u8>> {
        let started = Instant::now();
        let (id, dispatched) = self.dispatch(request, bytes, cancel).await;
        let is_notification = id.is_none();
        let encoded = (!is_notification).then(|| encode_response(&dispatched.response));

        let error_code = dispatched.response.error.as_ref().map(|err| err.code);
        let outcome = if error_code.is_some() { McpOutcome::Error } else { McpOutcome::Ok };
        let method = if is_notification && dispatched.method != McpMethod::Invalid {
            McpMethod::Notification
        } else {
            dispatched.method
        };
        self.audit.record(&McpAuditEvent::new(McpAuditEventParams {
            request_id: id.as_ref().map(ToString::to_string),
            transport: request.transport,
            peer_ip: request.peer_ip.map(|ip| ip.to_string()),
            method,
            tool: dispatched.tool.clone(),
            correlation_id: dispatched.correlation_id.clone(),
            outcome,
            error_code,
            error_kind: dispatched.error_kind,
            request_bytes: bytes.len(),
            response_bytes: encoded.as_ref().map_or(0, Vec::len),
        }));
        let event = McpMetricEvent {
            transport: request.transport,
            method,
            tool: dispatched.tool,
            outcome,
            error_code,
            error_kind: dispatched.error_kind,
            correlation_id: dispatched.correlation_id,
        };
        self.metrics.record_request(event.clone());
        self.metrics.record_latency(event, started.elapsed());
        encoded
    }

    /// Parses the envelope and routes it. Returns the request id (`None` for
    /// notifications) and the dispatch outcome.
    async fn dispatch(
        &self,
        request: &RequestContext,
        bytes: &[u8],
        cancel: &CancellationToken,
    ) -> (Option<Value>, Dispatched) {
        let invalid = |id: Value, message: &str| {
            Dispatched::plain(
                McpMethod::Invalid,
                JsonRpcResponse::failure(id, INVALID_REQUEST, message, None),
            )
        };
        let Ok(envelope) = serde_json::from_slice::<Value>(bytes) else {
            let response = JsonRpcResponse::failure(Value::Null, PARSE_ERROR, "parse error", None);
            return (Some(Value::Null), Dispatched::plain(McpMethod::Invalid, response));
        };
        let Value::Object(mut envelope) = envelope else {
            return (Some(Value::Null), invalid(Value::Null, "request must be an object"));
        };
        let id = envelope.remove("id");
        let reply_id = id.clone().unwrap_or(Value::Null);
        if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return (Some(reply_id.clone()), invalid(reply_id, "invalid json-rpc version"));
        }
        let Some(method) = envelope.get("method").and_then(Value::as_str).map(str::to_string)
        else {
            return (Some(reply_id.clone()), invalid(reply_id, "missing method"));
        };
        let params = envelope.remove("params");
        if id.is_none() {
            debug!(method = %method, "notification received");
        }

        let dispatched = match McpMethod::classify(&method) {
            McpMethod::Initialize => {
                Dispatched::plain(McpMethod::Initialize, initialize(reply_id, params.as_ref()))
            }
            McpMethod::ToolsList => {
                let response = match serde_json::to_value(ToolListResult {
                    tools: self.router.list_tools(),
                }) {
                    Ok(value) => JsonRpcResponse::success(reply_id, value),
                    Err(_) => {
                        JsonRpcResponse::failure(reply_id, INTERNAL_ERROR, "internal error", None)
                    }
                };
                Dispatched::plain(McpMethod::ToolsList, response)
            }
            McpMethod::Ping => Dispatched::plain(McpMethod::Ping, self.ping(reply_id)),
            McpMethod::ToolsCall => self.call_tool(request, reply_id, params, cancel).await,
            _ => Dispatched::plain(
                McpMethod::Other,
                JsonRpcResponse::failure(
                    reply_id,
                    METHOD_NOT_FOUND,
                    format!("method not found: {method}"),
                    None,
                ),
            ),
        };
        (id, dispatched)
    }

    /// Answers the liveness probe.
    fn ping(&self, id: Value) -> JsonRpcResponse {
        match self.clock.now().format(&Rfc3339) {
            Ok(timestamp) => {
                JsonRpcResponse::success(id, json!({"status": "pong", "timestamp": timestamp}))
            }
            Err(_) => JsonRpcResponse::failure(id, INTERNAL_ERROR, "internal error", None),
        }
    }

    /// Runs `tools/call` through the pipeline on its own task.
    async fn call_tool(
        &self,
        request: &RequestContext,
        id: Value,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> Dispatched {
        let call = params.map(serde_json::from_value::<ToolCallParams>);
        let Some(Ok(call)) = call else {
            return Dispatched::plain(
                McpMethod::ToolsCall,
                JsonRpcResponse::failure(id, INVALID_PARAMS, "invalid tool call params", None),
            );
        };
        let arguments = call.arguments.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        let router = Arc::clone(&self.router);
        let request = request.clone();
        let name = call.name.clone();
        let cancel = cancel.clone();
        let task = tokio::spawn(async move {
            router.handle_tool_call(&request, &name, arguments, &cancel).await
        });

        let mut dispatched = Dispatched {
            method: McpMethod::ToolsCall,
            tool: Some(call.name.clone()),
            correlation_id: None,
            error_kind: None,
            response: JsonRpcResponse::failure(Value::Null, INTERNAL_ERROR, "internal error", None),
        };
        dispatched.response = match task.await {
            Ok(Ok(result)) => {
                dispatched.correlation_id = Some(result.meta.correlation_id.clone());
                match serde_json::to_value(&result) {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(_) => JsonRpcResponse::failure(id, INTERNAL_ERROR, "internal error", None),
                }
            }
            Ok(Err(err)) => {
                dispatched.correlation_id = Some(err.correlation_id.clone());
                dispatched.error_kind = Some(err.error.kind());
                JsonRpcResponse::failure(id, err.error.code(), err.to_string(), Some(err.data()))
            }
            Err(join) => {
                error!(tool = %call.name, error = %join, "tool task aborted");
                dispatched.error_kind = Some("internal");
                JsonRpcResponse::failure(id, INTERNAL_ERROR, "internal error", None)
            }
        };
        dispatched
    }
}

/// Builds the `initialize` result.
fn initialize(id: Value, params: Option<&Value>) -> JsonRpcResponse {
    let requested = params.and_then(|params| params.get("protocolVersion")).and_then(Value::as_str);
    let version = requested
        .filter(|version| SUPPORTED_PROTOCOL_VERSIONS.contains(version))
        .unwrap_or(LATEST_PROTOCOL_VERSION);
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": version,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION")},
        }),
    )
}
