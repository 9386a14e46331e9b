//! File loading limit tests for collab-gateway-config.
// crates/collab-gateway-config/tests/limits_validation.rs
// =============================================================================
// Module: Config Load Limit Tests
// Description: Validate path, size, and encoding limits when loading files.
// Purpose: Ensure oversized or malformed config files fail closed.
// =============================================================================

use std::fs;

use collab_gateway_config::CollabGatewayConfig;
use collab_gateway_config::ConfigError;

mod common;

use common::TestResult;
use common::assert_invalid;

#[test]
fn load_reads_explicit_file() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("collab-gateway.toml");
    fs::write(&path, "[simulation]\nenabled = true\n").map_err(|err| err.to_string())?;
    let config = CollabGatewayConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if !config.simulation.enabled {
        return Err("simulation flag not loaded".to_string());
    }
    if config.source_path.as_deref() != Some(path.as_path()) {
        return Err("source path not recorded".to_string());
    }
    Ok(())
}

#[test]
fn missing_explicit_file_is_io_error() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("absent.toml");
    match CollabGatewayConfig::load(Some(&path)) {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(err) => Err(format!("expected io error, got {err}")),
        Ok(_) => Err("expected io error, got a config".to_string()),
    }
}

#[test]
fn oversized_file_rejected() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    assert_invalid(CollabGatewayConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn non_utf8_file_rejected() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("binary.toml");
    fs::write(&path, [0xff_u8, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(CollabGatewayConfig::load(Some(&path)), "must be utf-8")
}

#[test]
fn long_path_component_rejected() -> TestResult {
    let path = std::path::PathBuf::from(format!("{}.toml", "c".repeat(300)));
    assert_invalid(CollabGatewayConfig::load(Some(&path)), "component too long")
}

#[test]
fn invalid_file_contents_fail_validation() -> TestResult {
    let dir = tempfile::tempdir().map_err(|err| err.to_string())?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[server]\ntransport = \"http\"\n").map_err(|err| err.to_string())?;
    assert_invalid(CollabGatewayConfig::load(Some(&path)), "server.bind is required")
}
