// crates/collab-gateway-core/src/core/mod.rs
// ============================================================================
// Module: Collab Gateway Core Types
// Description: Canonical identity, permission, session, and credential types.
// Purpose: Provide stable types shared by the auth, directory, and MCP crates.
// Dependencies: serde, sha2, time
// ============================================================================

//! ## Overview
//! Core types describe who is calling, what they may do, and how their
//! session was obtained. They are plain values; the crates that own the
//! behaviour (session manager, context resolver, pipeline) build and consume
//! them.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod context;
pub mod credential;
pub mod identity;
pub mod permission;
pub mod session;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::ContextHints;
pub use context::ExecutionContext;
pub use credential::CredentialSource;
pub use credential::CredentialSourceKind;
pub use credential::DetectionReport;
pub use identity::AccessToken;
pub use identity::Identity;
pub use permission::PermissionLevel;
pub use permission::PermissionScope;
pub use session::SESSION_SAFETY_MARGIN;
pub use session::Session;
pub use session::SessionSource;
pub use session::SessionState;
pub use time::Clock;
pub use time::ManualClock;
pub use time::SharedClock;
pub use time::SystemClock;
