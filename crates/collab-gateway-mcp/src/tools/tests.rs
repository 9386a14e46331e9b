// crates/collab-gateway-mcp/src/tools/tests.rs
// ============================================================================
// Module: Invocation Pipeline Tests
// Description: Authorization rules, hint extraction, and error rendering.
// ============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

use collab_gateway_core::AccessToken;
use collab_gateway_core::ContextHints;
use collab_gateway_core::ExecutionContext;
use collab_gateway_core::PermissionLevel;
use collab_gateway_core::UpstreamError;
use serde_json::json;

use super::ToolCallError;
use super::ToolError;
use super::authorize;
use super::hints_from_arguments;

fn context(permission: PermissionLevel, hints: ContextHints) -> ExecutionContext {
    let mut context = ExecutionContext::anonymous("cg-test", hints);
    context.permission = permission;
    context.access_token = Some(AccessToken::new("token"));
    context
}

fn team(team_id: &str) -> ContextHints {
    ContextHints {
        team_id: Some(team_id.to_string()),
        ..ContextHints::default()
    }
}

fn reason(err: ToolError) -> String {
    match err {
        ToolError::Authorization {
            reason, ..
        } => reason,
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn guest_tools_pass_without_hints() {
    let context = ExecutionContext::anonymous("cg-test", ContextHints::default());
    assert!(authorize(PermissionLevel::Guest, &context).is_ok());
}

#[test]
fn team_tools_need_a_team_hint() {
    let context = context(PermissionLevel::Owner, ContextHints::default());
    let err = authorize(PermissionLevel::Member, &context).unwrap_err();
    assert_eq!(reason(err), "team context required");
}

#[test]
fn organizer_tools_need_a_meeting_hint() {
    let context = context(PermissionLevel::Organizer, team("team-engineering"));
    let err = authorize(PermissionLevel::Organizer, &context).unwrap_err();
    assert_eq!(reason(err), "meeting context required");
}

#[test]
fn level_must_satisfy_requirement() {
    let member = context(PermissionLevel::Member, team("team-design"));
    assert!(authorize(PermissionLevel::Member, &member).is_ok());
    let err = authorize(PermissionLevel::Owner, &member).unwrap_err();
    assert_eq!(reason(err), "insufficient permission level");

    let owner = context(PermissionLevel::Owner, team("team-engineering"));
    assert!(authorize(PermissionLevel::Member, &owner).is_ok());
}

#[test]
fn hints_come_from_non_empty_string_arguments() {
    let hints = hints_from_arguments(&json!({
        "teamId": "team-engineering",
        "channelId": "",
        "meetingId": 7,
        "content": "hello",
    }));
    assert_eq!(hints.team_id.as_deref(), Some("team-engineering"));
    assert_eq!(hints.channel_id, None);
    assert_eq!(hints.meeting_id, None);
}

#[test]
fn error_codes_follow_kind() {
    assert_eq!(ToolError::NotFound("x".to_string()).code(), 404);
    assert_eq!(ToolError::Authentication("x".to_string()).code(), 401);
    assert_eq!(ToolError::Upstream(UpstreamError::Forbidden("x".to_string())).code(), 403);
    assert_eq!(ToolError::Upstream(UpstreamError::NotFound("x".to_string())).code(), 404);
    assert_eq!(ToolError::Upstream(UpstreamError::Unavailable("x".to_string())).code(), 502);
    assert_eq!(ToolError::Cancelled.code(), 500);
    assert_eq!(ToolError::Cancelled.kind(), "cancelled");
}

#[test]
fn upstream_and_internal_detail_is_not_exposed() {
    let upstream = ToolError::Upstream(UpstreamError::Failed("db password=hunter2".to_string()));
    assert!(!upstream.to_string().contains("hunter2"));
    let internal = ToolError::Internal("stack trace".to_string());
    assert_eq!(internal.to_string(), "internal error");
}

#[test]
fn call_error_carries_correlation_id() {
    let err = ToolCallError {
        correlation_id: "cg-00000001-000001".to_string(),
        error: ToolError::Authorization {
            required: PermissionLevel::Owner,
            actual: PermissionLevel::Member,
            reason: "insufficient permission level".to_string(),
        },
    };
    assert!(err.to_string().ends_with("(correlation id: cg-00000001-000001)"));
    let data = err.data();
    assert_eq!(data["kind"], "authorization");
    assert_eq!(data["correlationId"], "cg-00000001-000001");
    assert_eq!(data["required"], "owner");
    assert_eq!(data["actual"], "member");
}

#[test]
fn validation_data_lists_violations() {
    let err = ToolCallError {
        correlation_id: "cg-1".to_string(),
        error: ToolError::Validation {
            violations: vec!["content: too short".to_string(), "teamId: not a string".to_string()],
        },
    };
    assert_eq!(err.data()["violations"].as_array().unwrap().len(), 2);
    assert!(err.to_string().starts_with("invalid arguments: content: too short; "));
}
