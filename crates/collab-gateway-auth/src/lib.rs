// crates/collab-gateway-auth/src/lib.rs
// ============================================================================
// Module: Collab Gateway Auth Library
// Description: Credential detection, exchange, device code, and sessions.
// Purpose: Turn explicit auth settings into a cached, validated session.
// Dependencies: collab-gateway-core, collab-gateway-config, keyring, reqwest, tokio
// ============================================================================

//! ## Overview
//! The auth crate owns everything between "a call needs a token" and "here is
//! a valid session". [`CredentialDetector`] probes the external identity
//! stores, [`CredentialExchanger`] turns a detected credential into a token,
//! [`DeviceCodeFlow`] runs the interactive fallback, and [`SessionManager`]
//! drives the state machine with at most one refresh in flight.
//!
//! Settings arrive as an explicit [`AuthSettings`] value; nothing here reads
//! the process environment.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod detector;
pub mod device_code;
pub mod error;
pub mod exchange;
pub mod probe;
pub mod process;
pub mod session;
pub mod settings;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use detector::CredentialDetector;
pub use device_code::DeviceCodeChallenge;
pub use device_code::DeviceCodeFlow;
pub use device_code::DeviceCodePrompt;
pub use device_code::HttpDeviceCodeFlow;
pub use device_code::SilentPrompt;
pub use device_code::SimulatedDeviceCodeFlow;
pub use device_code::StderrPrompt;
pub use error::AuthenticationError;
pub use error::ProbeError;
pub use exchange::CliTokenExchanger;
pub use exchange::CredentialExchanger;
pub use exchange::SimulatedExchanger;
pub use probe::CredentialProbe;
pub use session::SessionComponents;
pub use session::SessionManager;
pub use settings::AuthSettings;
