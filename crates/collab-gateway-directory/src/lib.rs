// crates/collab-gateway-directory/src/lib.rs
// ============================================================================
// Module: Collab Gateway Directory Library
// Description: In-memory collaborator for local and simulated deployments.
// Purpose: Serve teams, channels, members, and meetings without a backend.
// Dependencies: collab-gateway-core, collab-gateway-config
// ============================================================================

//! ## Overview
//! The directory crate provides [`InMemoryDirectory`], a
//! [`collab_gateway_core::CollaborationApi`] implementation seeded with a
//! small organisation. Caller roles come from the seed data, overridden by
//! the `[directory]` configuration section.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod directory;
pub mod seed;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use directory::InMemoryDirectory;
pub use seed::DirectorySeed;
