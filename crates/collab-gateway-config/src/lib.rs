// crates/collab-gateway-config/src/lib.rs
// ============================================================================
// Module: Collab Gateway Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for collab-gateway.toml semantics.
// Dependencies: collab-gateway-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `collab-gateway-config` defines the configuration model for the gateway:
//! transport, authentication settings and probe sources, simulation mode,
//! the in-memory directory, and logging. Loading is strict and fails closed;
//! the host reads the file once at startup and passes explicit values inward.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
