// crates/collab-gateway-mcp/src/request.rs
// ============================================================================
// Module: Request Context
// Description: Transport metadata attached to each inbound envelope.
// Purpose: Carry peer, header hints, and client correlation into the pipeline.
// Dependencies: collab-gateway-config, collab-gateway-core
// ============================================================================

//! ## Overview
//! A [`RequestContext`] describes where an envelope came from. Stdio requests
//! carry nothing beyond the transport; HTTP requests may carry the peer
//! address, a sanitized client correlation id, and `x-team-id` /
//! `x-channel-id` header hints that apply when the tool arguments name no
//! scope of their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::IpAddr;

use collab_gateway_config::ServerTransport;
use collab_gateway_core::ContextHints;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying a team hint.
pub const TEAM_HINT_HEADER: &str = "x-team-id";
/// Header carrying a channel hint.
pub const CHANNEL_HINT_HEADER: &str = "x-channel-id";

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request transport metadata.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Transport used by the caller.
    pub transport: ServerTransport,
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Sanitized client correlation id, when the caller sent one.
    pub client_correlation_id: Option<String>,
    /// Scope hints supplied outside the tool arguments.
    pub header_hints: ContextHints,
}

impl RequestContext {
    /// Builds a stdio request context.
    #[must_use]
    pub fn stdio() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            peer_ip: None,
            client_correlation_id: None,
            header_hints: ContextHints::default(),
        }
    }

    /// Builds an HTTP request context.
    #[must_use]
    pub fn http(peer_ip: Option<IpAddr>, header_hints: ContextHints) -> Self {
        Self {
            transport: ServerTransport::Http,
            peer_ip,
            client_correlation_id: None,
            header_hints,
        }
    }

    /// Returns a copy with the client correlation id set.
    #[must_use]
    pub fn with_client_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.client_correlation_id = Some(id.into());
        self
    }
}
