// crates/collab-gateway-directory/tests/common/mod.rs
// =============================================================================
// Module: Directory Test Helpers
// Description: Shared fixtures for in-memory directory tests.
// Purpose: Build directories and tokens with minimal boilerplate.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use collab_gateway_config::DirectoryConfig;
use collab_gateway_core::AccessToken;
use collab_gateway_directory::InMemoryDirectory;

/// Caller user id used by the default configuration.
pub const CALLER: &str = "user-0001";

/// Returns a non-empty bearer token.
pub fn token() -> AccessToken {
    AccessToken::new("directory-test-token")
}

/// Returns a directory over the sample organisation with default policy.
pub fn directory() -> InMemoryDirectory {
    InMemoryDirectory::from_config(&DirectoryConfig::default())
}

/// Returns a directory built from `configure`d defaults.
pub fn directory_with(configure: impl FnOnce(&mut DirectoryConfig)) -> InMemoryDirectory {
    let mut config = DirectoryConfig::default();
    configure(&mut config);
    InMemoryDirectory::from_config(&config)
}
