// crates/collab-gateway-core/src/lib.rs
// ============================================================================
// Module: Collab Gateway Core Library
// Description: Public API surface for the Collab Gateway core.
// Purpose: Expose shared domain types and collaborator interfaces.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! Collab Gateway core holds the types every other crate agrees on: permission
//! levels, caller identity, the per-call execution context, the cached session
//! record, credential source reports, and the collaborator interface tool
//! bodies call into. It performs no I/O and never reads ambient state.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::Channel;
pub use interfaces::ChannelMessage;
pub use interfaces::CollaborationApi;
pub use interfaces::Meeting;
pub use interfaces::MeetingUpdate;
pub use interfaces::Team;
pub use interfaces::TeamMember;
pub use interfaces::TeamRole;
pub use interfaces::UpstreamError;
