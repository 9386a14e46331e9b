// crates/collab-gateway-mcp/src/lib.rs
// ============================================================================
// Module: Collab Gateway MCP Library
// Description: Protocol gateway, tool registry, and invocation pipeline.
// Purpose: Expose the collaboration tool catalog over JSON-RPC 2.0.
// Dependencies: collab-gateway-auth, collab-gateway-core, axum, jsonschema, tokio
// ============================================================================

//! ## Overview
//! Requests enter through the [`ProtocolGateway`], which parses envelopes and
//! routes `initialize`, `tools/list`, `tools/call`, and `ping`. Tool calls go
//! through the [`ToolRouter`]: registry lookup, schema validation, context
//! resolution by the [`ContextResolver`], authorization, execution, and error
//! normalization. [`McpServer`] assembles these from configuration and runs
//! the stdio or HTTP transport.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod catalog;
pub mod context;
pub mod correlation;
pub mod gateway;
pub mod registry;
pub mod request;
pub mod server;
pub mod telemetry;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::McpAuditSink;
pub use catalog::BuiltinTool;
pub use catalog::builtin_registry;
pub use context::ContextResolver;
pub use gateway::JsonRpcResponse;
pub use gateway::ProtocolGateway;
pub use registry::RegistryError;
pub use registry::ToolCategory;
pub use registry::ToolDescriptor;
pub use registry::ToolRegistry;
pub use registry::ToolRegistryBuilder;
pub use request::RequestContext;
pub use server::McpServer;
pub use server::McpServerError;
pub use server::serve_lines;
pub use tools::ToolCallError;
pub use tools::ToolError;
pub use tools::ToolHandler;
pub use tools::ToolRouter;
pub use tools::ToolServices;
