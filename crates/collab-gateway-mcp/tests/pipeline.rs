//! Invocation pipeline tests for collab-gateway-mcp.
// crates/collab-gateway-mcp/tests/pipeline.rs
// =============================================================================
// Module: Invocation Pipeline Tests
// Description: Lookup, validation, authorization, execution, and error mapping.
// Purpose: Exercise tool calls end to end over the in-memory directory.
// =============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use collab_gateway_config::DirectoryConfig;
use collab_gateway_core::ExecutionContext;
use collab_gateway_core::PermissionLevel;
use collab_gateway_core::SessionState;
use collab_gateway_core::TeamRole;
use collab_gateway_core::UpstreamError;
use collab_gateway_mcp::RequestContext;
use collab_gateway_mcp::ToolCategory;
use collab_gateway_mcp::ToolDescriptor;
use collab_gateway_mcp::ToolError;
use collab_gateway_mcp::ToolHandler;
use collab_gateway_mcp::ToolRegistry;
use collab_gateway_mcp::ToolRegistryBuilder;
use collab_gateway_mcp::ToolServices;
use collab_gateway_mcp::builtin_registry;
use common::CALLER;
use common::Caller;
use common::call_tool;
use common::error_code;
use common::harness;
use common::harness_with;
use serde_json::Value;
use serde_json::json;
use tokio_util::sync::CancellationToken;

// ============================================================================
// SECTION: Test Tools
// ============================================================================

/// How a test tool behaves when called.
#[derive(Clone, Copy)]
enum Behavior {
    /// Collaborator refuses.
    Forbidden,
    /// Body panics.
    Panic,
    /// Body never finishes on its own.
    Hang,
}

/// Guest-level tool with scripted behavior.
struct Scripted(Behavior);

#[async_trait]
impl ToolHandler for Scripted {
    async fn call(
        &self,
        _services: &ToolServices,
        _context: &ExecutionContext,
        _arguments: Value,
    ) -> Result<Value, ToolError> {
        match self.0 {
            Behavior::Forbidden => {
                Err(UpstreamError::Forbidden("policy blocks this tenant".to_string()).into())
            }
            Behavior::Panic => panic!("tool body exploded"),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(300)).await;
                Ok(json!({}))
            }
        }
    }
}

fn scripted_registry() -> ToolRegistry {
    let mut builder = ToolRegistryBuilder::new();
    for (name, behavior) in
        [("forbidden", Behavior::Forbidden), ("panic", Behavior::Panic), ("hang", Behavior::Hang)]
    {
        let descriptor = ToolDescriptor {
            name: name.to_string(),
            description: format!("{name} test tool"),
            input_schema: json!({"type": "object"}),
            category: ToolCategory::General,
            required_permission: PermissionLevel::Guest,
        };
        builder.register(descriptor, Arc::new(Scripted(behavior))).unwrap();
    }
    builder.build()
}

// ============================================================================
// SECTION: Lookup and Validation
// ============================================================================

#[tokio::test]
async fn unknown_tool_fails_before_context_resolution() {
    let h = harness(Caller::Authenticated);
    let response = call_tool(&h.gateway, "delete_everything", json!({})).await;
    assert_eq!(error_code(&response), 404);
    assert_eq!(response["error"]["data"]["kind"], "not_found");
    assert!(response["error"]["data"]["correlationId"].as_str().unwrap().starts_with("cg-"));
    assert_eq!(h.sessions.state(), SessionState::Unauthenticated);
    assert!(h.sessions.last_detection().is_none());
    assert!(h.audit.authorizations.lock().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_arguments_name_every_field() {
    let h = harness(Caller::Authenticated);
    let response =
        call_tool(&h.gateway, "send_channel_message", json!({"content": "", "teamId": 5})).await;
    assert_eq!(error_code(&response), 400);
    let violations = response["error"]["data"]["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 2);
    let rendered: Vec<&str> = violations.iter().filter_map(Value::as_str).collect();
    assert!(rendered.iter().any(|v| v.starts_with("content: ")));
    assert!(rendered.iter().any(|v| v.starts_with("teamId: ")));
    assert_eq!(h.sessions.state(), SessionState::Unauthenticated);
}

// ============================================================================
// SECTION: Authorization
// ============================================================================

#[tokio::test]
async fn anonymous_caller_is_guest() {
    let h = harness(Caller::Anonymous);
    let response =
        call_tool(&h.gateway, "list_channels", json!({"teamId": "team-engineering"})).await;
    assert_eq!(error_code(&response), 403);
    assert_eq!(response["error"]["data"]["required"], "member");
    assert_eq!(response["error"]["data"]["actual"], "guest");

    let authorizations = h.audit.authorizations.lock().unwrap();
    assert_eq!(authorizations.len(), 1);
    assert_eq!(authorizations[0].decision, "denied");
    assert!(!authorizations[0].authenticated);
}

#[tokio::test]
async fn anonymous_guest_tools_still_answer() {
    let h = harness(Caller::Anonymous);
    let response = call_tool(&h.gateway, "list_teams", json!({})).await;
    assert_eq!(response["result"]["structuredContent"]["teams"], json!([]));

    let response = call_tool(&h.gateway, "get_current_user", json!({})).await;
    let payload = &response["result"]["structuredContent"];
    assert_eq!(payload["authenticated"], false);
    assert_eq!(payload["permission"], "guest");
}

#[tokio::test]
async fn member_cannot_run_owner_tools() {
    let h = harness(Caller::Authenticated);
    let response = call_tool(
        &h.gateway,
        "add_team_member",
        json!({"teamId": "team-design", "userId": "user-0004"}),
    )
    .await;
    assert_eq!(error_code(&response), 403);
    assert_eq!(response["error"]["data"]["required"], "owner");
    assert_eq!(response["error"]["data"]["actual"], "member");
}

#[tokio::test]
async fn organizer_is_decided_per_meeting() {
    let h = harness(Caller::Authenticated);
    let response = call_tool(
        &h.gateway,
        "update_meeting",
        json!({"meetingId": "meeting-standup", "subject": "Daily sync"}),
    )
    .await;
    assert_eq!(response["result"]["structuredContent"]["meeting"]["subject"], "Daily sync");

    let response = call_tool(
        &h.gateway,
        "update_meeting",
        json!({"meetingId": "meeting-allhands", "subject": "Renamed"}),
    )
    .await;
    assert_eq!(error_code(&response), 403);
    assert_eq!(response["error"]["data"]["required"], "organizer");
}

// ============================================================================
// SECTION: Execution
// ============================================================================

#[tokio::test]
async fn owner_lists_channels_and_hints_carry_forward() {
    let h = harness(Caller::Authenticated);
    let response =
        call_tool(&h.gateway, "list_channels", json!({"teamId": "team-engineering"})).await;
    let payload = &response["result"]["structuredContent"];
    assert_eq!(payload["teamId"], "team-engineering");
    assert_eq!(payload["channels"].as_array().unwrap().len(), 2);
    assert_eq!(h.sessions.state(), SessionState::Authenticated);

    let response = call_tool(&h.gateway, "list_team_members", json!({})).await;
    let payload = &response["result"]["structuredContent"];
    assert_eq!(payload["teamId"], "team-engineering");
    let members = payload["members"].as_array().unwrap();
    assert!(members.iter().any(|member| member["userId"] == CALLER));
}

#[tokio::test]
async fn message_is_posted_to_selected_channel() {
    let h = harness(Caller::Authenticated);
    let response = call_tool(
        &h.gateway,
        "send_channel_message",
        json!({
            "teamId": "team-engineering",
            "channelId": "channel-engineering-releases",
            "content": "v1.2 is out",
        }),
    )
    .await;
    assert!(response.get("error").is_none(), "unexpected error: {response}");
    let posted = h.directory.channel_messages("channel-engineering-releases");
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].content, "v1.2 is out");
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("v1.2 is out"));
}

#[tokio::test]
async fn result_carries_correlation_id() {
    let h = harness(Caller::Authenticated);
    let response = call_tool(&h.gateway, "auth_status", json!({})).await;
    let result = &response["result"];
    assert!(result["_meta"]["correlationId"].as_str().unwrap().starts_with("cg-"));
    assert_eq!(result["structuredContent"]["state"], "authenticated");
    assert_eq!(result["structuredContent"]["simulation"], true);
}

// ============================================================================
// SECTION: Upstream Errors
// ============================================================================

fn ghost_member(config: &mut DirectoryConfig) {
    config.team_roles.insert("team-ghost".to_string(), TeamRole::Member);
}

#[tokio::test]
async fn missing_team_upstream_is_not_found() {
    let h = harness_with(Caller::Authenticated, builtin_registry().unwrap(), ghost_member);
    let response = call_tool(&h.gateway, "list_channels", json!({"teamId": "team-ghost"})).await;
    assert_eq!(error_code(&response), 404);
    assert_eq!(response["error"]["data"]["kind"], "upstream");
    assert!(!response["error"]["message"].as_str().unwrap().contains("team-ghost"));
}

#[tokio::test]
async fn removing_last_owner_is_upstream_failure() {
    let h = harness(Caller::Authenticated);
    let response = call_tool(
        &h.gateway,
        "remove_team_member",
        json!({"teamId": "team-engineering", "userId": CALLER}),
    )
    .await;
    assert_eq!(error_code(&response), 502);
    assert_eq!(response["error"]["data"]["kind"], "upstream");
}

#[tokio::test]
async fn collaborator_refusal_is_forbidden() {
    let h = harness_with(Caller::Authenticated, scripted_registry(), |_| {});
    let response = call_tool(&h.gateway, "forbidden", json!({})).await;
    assert_eq!(error_code(&response), 403);
    assert!(!response["error"]["message"].as_str().unwrap().contains("policy"));
}

// ============================================================================
// SECTION: Isolation and Cancellation
// ============================================================================

#[tokio::test]
async fn panicking_tool_is_internal_error() {
    let h = harness_with(Caller::Anonymous, scripted_registry(), |_| {});
    let response = call_tool(&h.gateway, "panic", json!({})).await;
    assert_eq!(error_code(&response), -32_603);
    assert_eq!(response["id"], 1);

    let response = call_tool(&h.gateway, "forbidden", json!({})).await;
    assert_eq!(error_code(&response), 403);
}

#[tokio::test]
async fn cancelled_call_reports_cancellation() {
    let h = harness_with(Caller::Anonymous, scripted_registry(), |_| {});
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });
    let envelope = json!({
        "jsonrpc": "2.0",
        "id": 11,
        "method": "tools/call",
        "params": {"name": "hang", "arguments": {}},
    });
    let body = h
        .gateway
        .handle(&RequestContext::stdio(), envelope.to_string().as_bytes(), &cancel)
        .await
        .unwrap();
    let response: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["id"], 11);
    assert_eq!(response["error"]["data"]["kind"], "cancelled");
}
