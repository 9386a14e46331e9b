//! Protocol gateway envelope tests for collab-gateway-mcp.
// crates/collab-gateway-mcp/tests/protocol.rs
// =============================================================================
// Module: Protocol Gateway Tests
// Description: Envelope parsing, method routing, and protocol error codes.
// Purpose: Pin the JSON-RPC behaviour clients depend on.
// =============================================================================

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

mod common;

use collab_gateway_config::ServerTransport;
use collab_gateway_mcp::ToolRegistry;
use collab_gateway_mcp::telemetry::McpMethod;
use collab_gateway_mcp::telemetry::McpOutcome;
use common::Caller;
use common::call_tool;
use common::error_code;
use common::harness;
use common::harness_with;
use common::send;
use common::send_raw;
use serde_json::Value;
use serde_json::json;

#[tokio::test]
async fn initialize_echoes_supported_protocol_version() {
    let h = harness(Caller::Anonymous);
    let response = send(
        &h.gateway,
        json!({
            "jsonrpc": "2.0",
            "id": "init-1",
            "method": "initialize",
            "params": {"protocolVersion": "2024-11-05", "capabilities": {}},
        }),
    )
    .await;
    assert_eq!(response["id"], "init-1");
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["serverInfo"]["name"], "collab-gateway");
    assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);
}

#[tokio::test]
async fn initialize_answers_latest_for_unknown_version() {
    let h = harness(Caller::Anonymous);
    let response = send(
        &h.gateway,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {"protocolVersion": "1999-01-01"},
        }),
    )
    .await;
    assert_eq!(response["result"]["protocolVersion"], "2025-06-18");
}

#[tokio::test]
async fn invalid_json_is_parse_error_with_null_id() {
    let h = harness(Caller::Anonymous);
    let response = send_raw(&h.gateway, b"{\"jsonrpc\": \"2.0\", \"id\": 7,").await.unwrap();
    assert_eq!(error_code(&response), -32_700);
    assert_eq!(response["id"], Value::Null);
    assert_eq!(response["jsonrpc"], "2.0");
}

#[tokio::test]
async fn non_object_envelope_is_invalid_request() {
    let h = harness(Caller::Anonymous);
    let response = send_raw(&h.gateway, b"[1, 2, 3]").await.unwrap();
    assert_eq!(error_code(&response), -32_600);
    assert_eq!(response["id"], Value::Null);
}

#[tokio::test]
async fn wrong_version_echoes_id() {
    let h = harness(Caller::Anonymous);
    let response = send(&h.gateway, json!({"jsonrpc": "1.0", "id": 42, "method": "ping"})).await;
    assert_eq!(error_code(&response), -32_600);
    assert_eq!(response["id"], 42);
}

#[tokio::test]
async fn request_ids_are_echoed_unchanged() {
    let h = harness(Caller::Anonymous);
    for id in [
        json!("req-1"),
        json!(17),
        json!(2.5),
        json!({"session": "a", "seq": [1, 2]}),
        json!([1, "two"]),
    ] {
        let response =
            send(&h.gateway, json!({"jsonrpc": "2.0", "id": id.clone(), "method": "ping"})).await;
        assert_eq!(response["id"], id);
        assert_eq!(response["result"]["status"], "pong");
    }
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let h = harness(Caller::Anonymous);
    let response =
        send(&h.gateway, json!({"jsonrpc": "2.0", "id": 3, "method": "resources/list"})).await;
    assert_eq!(error_code(&response), -32_601);
    assert_eq!(response["id"], 3);
    assert!(response.get("result").is_none());
}

#[tokio::test]
async fn notification_produces_no_response() {
    let h = harness(Caller::Anonymous);
    let envelope = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    let response = send_raw(&h.gateway, envelope.to_string().as_bytes()).await;
    assert!(response.is_none());
    let requests = h.audit.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, McpMethod::Notification);
}

#[tokio::test]
async fn empty_registry_lists_empty_array() {
    let h = harness_with(Caller::Anonymous, ToolRegistry::empty(), |_| {});
    let envelope = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    let response = send(&h.gateway, envelope).await;
    assert_eq!(response["result"]["tools"], json!([]));
}

#[tokio::test]
async fn tools_list_describes_every_builtin_tool() {
    let h = harness(Caller::Anonymous);
    let envelope = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
    let response = send(&h.gateway, envelope).await;
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 10);
    let update = tools.iter().find(|tool| tool["name"] == "update_meeting").unwrap();
    assert_eq!(update["requiredPermission"], "organizer");
    assert_eq!(update["category"], "meeting");
    assert!(update["inputSchema"]["properties"]["meetingId"].is_object());
    assert!(update["description"].as_str().is_some_and(|text| !text.is_empty()));
}

#[tokio::test]
async fn ping_reports_clock_time() {
    let h = harness(Caller::Anonymous);
    let response = send(&h.gateway, json!({"jsonrpc": "2.0", "id": 9, "method": "ping"})).await;
    assert_eq!(response["result"]["status"], "pong");
    assert_eq!(response["result"]["timestamp"], "2023-11-14T22:13:20Z");
}

#[tokio::test]
async fn malformed_tool_call_params_are_invalid_params() {
    let h = harness(Caller::Anonymous);
    let response = send(
        &h.gateway,
        json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"arguments": {}}}),
    )
    .await;
    assert_eq!(error_code(&response), -32_602);
    assert_eq!(response["id"], 5);
}

#[tokio::test]
async fn each_request_is_audited() {
    let h = harness(Caller::Anonymous);
    send(&h.gateway, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"})).await;
    send(&h.gateway, json!({"jsonrpc": "2.0", "id": 2, "method": "nope"})).await;
    let requests = h.audit.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, McpMethod::Ping);
    assert_eq!(requests[0].outcome, McpOutcome::Ok);
    assert_eq!(requests[1].outcome, McpOutcome::Error);
    assert_eq!(requests[1].error_code, Some(-32_601));
}

#[tokio::test]
async fn metrics_label_each_request() {
    let h = harness(Caller::Authenticated);
    call_tool(&h.gateway, "list_teams", json!({})).await;
    call_tool(&h.gateway, "delete_everything", json!({})).await;
    let envelope = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    assert!(send_raw(&h.gateway, envelope.to_string().as_bytes()).await.is_none());

    let requests = h.metrics.requests.lock().unwrap();
    assert_eq!(requests.len(), 3);

    let ok = &requests[0];
    assert_eq!(ok.transport, ServerTransport::Stdio);
    assert_eq!(ok.method, McpMethod::ToolsCall);
    assert_eq!(ok.tool.as_deref(), Some("list_teams"));
    assert_eq!(ok.outcome, McpOutcome::Ok);
    assert_eq!(ok.error_code, None);
    assert!(ok.correlation_id.as_deref().is_some_and(|id| id.starts_with("cg-")));

    let failed = &requests[1];
    assert_eq!(failed.method, McpMethod::ToolsCall);
    assert_eq!(failed.tool.as_deref(), Some("delete_everything"));
    assert_eq!(failed.outcome, McpOutcome::Error);
    assert_eq!(failed.error_code, Some(404));
    assert_eq!(failed.error_kind, Some("not_found"));

    let notification = &requests[2];
    assert_eq!(notification.method, McpMethod::Notification);
    assert_eq!(notification.tool, None);
    assert_eq!(notification.outcome, McpOutcome::Ok);
    drop(requests);

    let latencies = h.metrics.latencies.lock().unwrap();
    assert_eq!(latencies.len(), 3);
    assert_eq!(latencies[1].0.error_code, Some(404));
}
