// crates/collab-gateway-mcp/src/tools.rs
// ============================================================================
// Module: Invocation Pipeline
// Description: Tool router running lookup, validation, authorization, execution.
// Purpose: Wrap every tool body in the same checks and error normalization.
// Dependencies: async-trait, collab-gateway-auth, collab-gateway-core, serde_json
// ============================================================================

//! ## Overview
//! [`ToolRouter::handle_tool_call`] is the single entry point for tool
//! execution. Each call:
//!
//! 1. gets a fresh correlation id,
//! 2. looks the tool up (unknown tools fail before any context resolution),
//! 3. validates the arguments against the compiled input schema,
//! 4. resolves the execution context,
//! 5. authorizes the caller against the tool's required level,
//! 6. runs the tool body under the connection's cancellation token,
//! 7. normalizes the outcome into a [`ToolCallResult`] or [`ToolCallError`].
//!
//! Tool bodies never see unvalidated arguments and never run for a caller
//! that failed authorization. Every error carries the call's correlation id.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use collab_gateway_auth::SessionManager;
use collab_gateway_core::AccessToken;
use collab_gateway_core::CollaborationApi;
use collab_gateway_core::ContextHints;
use collab_gateway_core::ExecutionContext;
use collab_gateway_core::PermissionLevel;
use collab_gateway_core::PermissionScope;
use collab_gateway_core::UpstreamError;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::audit::AuthorizationAuditEvent;
use crate::audit::AuthorizationAuditParams;
use crate::audit::McpAuditSink;
use crate::context::ContextResolver;
use crate::correlation::CorrelationIdGenerator;
use crate::registry::ToolDescriptor;
use crate::registry::ToolRegistry;
use crate::request::RequestContext;

// ============================================================================
// SECTION: Tool Handler
// ============================================================================

/// Shared services available to tool bodies.
#[derive(Clone)]
pub struct ToolServices {
    /// Collaboration service.
    pub collaborator: Arc<dyn CollaborationApi>,
    /// Session manager (read-only use by tool bodies).
    pub sessions: Arc<SessionManager>,
}

/// Tool body.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Runs the tool with schema-valid `arguments`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the body fails.
    async fn call(
        &self,
        services: &ToolServices,
        context: &ExecutionContext,
        arguments: Value,
    ) -> Result<Value, ToolError>;
}

/// Returns the caller's token or an authentication error.
///
/// # Errors
///
/// Returns [`ToolError::Authentication`] when the context has no session.
pub fn require_token(context: &ExecutionContext) -> Result<&AccessToken, ToolError> {
    context
        .access_token
        .as_ref()
        .ok_or_else(|| ToolError::Authentication("no authenticated session".to_string()))
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pipeline error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    /// No tool is registered under the requested name.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// Arguments failed the input schema.
    #[error("invalid arguments: {}", violations.join("; "))]
    Validation {
        /// One entry per violated constraint.
        violations: Vec<String>,
    },
    /// The caller's permission level is insufficient.
    #[error("permission denied: requires {required}, caller has {actual} ({reason})")]
    Authorization {
        /// Level the tool requires.
        required: PermissionLevel,
        /// Level the caller holds.
        actual: PermissionLevel,
        /// Why the check failed.
        reason: String,
    },
    /// The tool needed a session and none was available.
    #[error("authentication required: {0}")]
    Authentication(String),
    /// The collaboration service failed.
    #[error("{}", upstream_message(.0))]
    Upstream(UpstreamError),
    /// Anything else; detail is logged, not returned.
    #[error("internal error")]
    Internal(String),
    /// The connection went away before the call finished.
    #[error("request cancelled")]
    Cancelled,
}

/// Generic caller-facing message for collaborator failures.
const fn upstream_message(err: &UpstreamError) -> &'static str {
    match err {
        UpstreamError::Forbidden(_) => "the collaboration service denied the operation",
        UpstreamError::NotFound(_) => "the requested resource was not found",
        UpstreamError::Unavailable(_) | UpstreamError::Failed(_) => {
            "the collaboration service request failed"
        }
    }
}

impl ToolError {
    /// Returns the domain error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Validation { .. } => 400,
            Self::Authentication(_) => 401,
            Self::Authorization { .. } | Self::Upstream(UpstreamError::Forbidden(_)) => 403,
            Self::NotFound(_) | Self::Upstream(UpstreamError::NotFound(_)) => 404,
            Self::Upstream(_) => 502,
            Self::Internal(_) | Self::Cancelled => 500,
        }
    }

    /// Returns a stable kind label.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation { .. } => "validation",
            Self::Authorization { .. } => "authorization",
            Self::Authentication(_) => "authentication",
            Self::Upstream(_) => "upstream",
            Self::Internal(_) => "internal",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<UpstreamError> for ToolError {
    fn from(err: UpstreamError) -> Self {
        Self::Upstream(err)
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

/// Tool error tagged with the call's correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{error} (correlation id: {correlation_id})")]
pub struct ToolCallError {
    /// Correlation id of the failed call.
    pub correlation_id: String,
    /// Underlying error.
    pub error: ToolError,
}

impl ToolCallError {
    /// Returns the envelope `data` member.
    #[must_use]
    pub fn data(&self) -> Value {
        let mut data = json!({
            "kind": self.error.kind(),
            "correlationId": self.correlation_id,
        });
        match &self.error {
            ToolError::Validation {
                violations,
            } => {
                data["violations"] = json!(violations);
            }
            ToolError::Authorization {
                required,
                actual,
                ..
            } => {
                data["required"] = json!(required);
                data["actual"] = json!(actual);
            }
            _ => {}
        }
        data
    }
}

// ============================================================================
// SECTION: Results
// ============================================================================

/// Text content item of a tool result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolContent {
    /// Content type tag; always `text`.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Rendered JSON payload.
    pub text: String,
}

/// Result metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallMeta {
    /// Correlation id of the call.
    pub correlation_id: String,
}

/// Normalized successful tool result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    /// Text rendering of the payload.
    pub content: Vec<ToolContent>,
    /// Structured payload.
    pub structured_content: Value,
    /// Call metadata.
    #[serde(rename = "_meta")]
    pub meta: ToolCallMeta,
}

impl ToolCallResult {
    /// Wraps a tool payload.
    #[must_use]
    pub fn success(correlation_id: String, payload: Value) -> Self {
        Self {
            content: vec![ToolContent {
                kind: "text",
                text: payload.to_string(),
            }],
            structured_content: payload,
            meta: ToolCallMeta {
                correlation_id,
            },
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Tool router: the invocation pipeline.
pub struct ToolRouter {
    /// Frozen tool catalog.
    registry: ToolRegistry,
    /// Execution context resolver.
    resolver: ContextResolver,
    /// Services handed to tool bodies.
    services: ToolServices,
    /// Correlation id issuer.
    correlation: CorrelationIdGenerator,
    /// Authorization audit sink.
    audit: Arc<dyn McpAuditSink>,
}

impl ToolRouter {
    /// Creates a router over a frozen registry.
    #[must_use]
    pub fn new(
        registry: ToolRegistry,
        resolver: ContextResolver,
        services: ToolServices,
        audit: Arc<dyn McpAuditSink>,
    ) -> Self {
        Self {
            registry,
            resolver,
            services,
            correlation: CorrelationIdGenerator::default(),
            audit,
        }
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Lists tool descriptors in name order.
    #[must_use]
    pub fn list_tools(&self) -> &[ToolDescriptor] {
        self.registry.list()
    }

    /// Runs one tool call through the full pipeline.
    ///
    /// # Errors
    ///
    /// Returns [`ToolCallError`] for every failure, tagged with the call's
    /// correlation id.
    pub async fn handle_tool_call(
        &self,
        request: &RequestContext,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<ToolCallResult, ToolCallError> {
        let correlation_id = self.correlation.issue();
        debug!(
            correlation_id = %correlation_id,
            tool = name,
            client_correlation_id = request.client_correlation_id.as_deref(),
            "tool call received"
        );
        match self.run(&correlation_id, request, name, arguments, cancel).await {
            Ok(payload) => {
                info!(correlation_id = %correlation_id, tool = name, "tool call succeeded");
                Ok(ToolCallResult::success(correlation_id, payload))
            }
            Err(err) => {
                log_failure(&correlation_id, name, &err);
                Err(ToolCallError {
                    correlation_id,
                    error: err,
                })
            }
        }
    }

    /// Lookup, validation, resolution, authorization, execution.
    async fn run(
        &self,
        correlation_id: &str,
        request: &RequestContext,
        name: &str,
        arguments: Value,
        cancel: &CancellationToken,
    ) -> Result<Value, ToolError> {
        let tool = self.registry.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        let descriptor = tool.descriptor();

        let violations = tool.validator().violations(&arguments);
        if !violations.is_empty() {
            return Err(ToolError::Validation {
                violations,
            });
        }

        let hints = hints_from_arguments(&arguments).or(&request.header_hints);
        let context = self
            .resolver
            .resolve(correlation_id, hints, descriptor.required_permission, cancel)
            .await;
        if cancel.is_cancelled() {
            return Err(ToolError::Cancelled);
        }

        let decision = authorize(descriptor.required_permission, &context);
        self.audit.record_authorization(&AuthorizationAuditEvent::new(AuthorizationAuditParams {
            correlation_id: correlation_id.to_string(),
            tool: name.to_string(),
            required: descriptor.required_permission,
            actual: context.permission,
            authenticated: context.is_authenticated(),
            team_id: context.hints.team_id.clone(),
            meeting_id: context.hints.meeting_id.clone(),
            denial: decision.as_ref().err().map(ToString::to_string),
        }));
        decision?;

        let handler = tool.handler();
        let payload = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ToolError::Cancelled),
            outcome = handler.call(&self.services, &context, arguments) => outcome?,
        };
        self.resolver.remember(&context.hints);
        Ok(payload)
    }
}

/// Reads `teamId`, `channelId`, and `meetingId` string arguments.
#[must_use]
pub fn hints_from_arguments(arguments: &Value) -> ContextHints {
    let field = |key: &str| {
        arguments.get(key).and_then(Value::as_str).filter(|v| !v.is_empty()).map(str::to_string)
    };
    ContextHints {
        team_id: field("teamId"),
        channel_id: field("channelId"),
        meeting_id: field("meetingId"),
    }
}

/// Checks the caller's level and scope against the tool's requirement.
///
/// # Errors
///
/// Returns [`ToolError::Authorization`] when the scope hint is missing or
/// the level does not satisfy the requirement.
pub fn authorize(required: PermissionLevel, context: &ExecutionContext) -> Result<(), ToolError> {
    let actual = context.permission;
    let denied = |reason: &str| ToolError::Authorization {
        required,
        actual,
        reason: reason.to_string(),
    };
    match required.scope() {
        PermissionScope::None => return Ok(()),
        PermissionScope::Team if context.hints.team_id.is_none() => {
            return Err(denied("team context required"));
        }
        PermissionScope::Meeting if context.hints.meeting_id.is_none() => {
            return Err(denied("meeting context required"));
        }
        PermissionScope::Team | PermissionScope::Meeting => {}
    }
    if actual.satisfies(required) { Ok(()) } else { Err(denied("insufficient permission level")) }
}

/// Logs a failed call at the level its kind warrants.
fn log_failure(correlation_id: &str, tool: &str, err: &ToolError) {
    match err {
        ToolError::NotFound(_)
        | ToolError::Validation { .. }
        | ToolError::Authorization { .. }
        | ToolError::Cancelled => {
            debug!(correlation_id, tool, error = %err, kind = err.kind(), "tool call rejected");
        }
        ToolError::Authentication(detail) => {
            warn!(correlation_id, tool, detail = %detail, "tool call needs authentication");
        }
        ToolError::Upstream(upstream) => {
            warn!(correlation_id, tool, upstream = %upstream, "collaborator call failed");
        }
        ToolError::Internal(detail) => {
            error!(correlation_id, tool, detail = %detail, "tool call failed internally");
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
