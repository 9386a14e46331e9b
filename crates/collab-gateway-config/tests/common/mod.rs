// crates/collab-gateway-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for collab-gateway-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use collab_gateway_config::CollabGatewayConfig;
use collab_gateway_config::ConfigError;

/// Test result alias used across suites.
pub type TestResult = Result<(), String>;

/// Parses a TOML string into a `CollabGatewayConfig` without validation.
pub fn config_from_toml(toml_str: &str) -> Result<CollabGatewayConfig, String> {
    toml::from_str(toml_str).map_err(|err| err.to_string())
}

/// Returns a minimal config with all defaults applied.
pub fn minimal_config() -> Result<CollabGatewayConfig, String> {
    config_from_toml("")
}

/// Asserts that a validation result fails with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
