// crates/collab-gateway-cli/src/logging.rs
// ============================================================================
// Module: CLI Logging
// Description: Installs the tracing subscriber for the binary.
// Purpose: Route diagnostics to stderr with a configurable filter and format.
// Dependencies: tracing-subscriber, collab-gateway-config
// ============================================================================

//! ## Overview
//! Diagnostics always go to stderr because stdout carries protocol traffic
//! under `serve`. The filter comes from `RUST_LOG` when it is set and
//! non-empty, else from `[logging] level`.

use collab_gateway_config::LogFormat;
use collab_gateway_config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::CliError;
use crate::CliResult;

/// Builds the filter from an explicit `RUST_LOG` value or the configured level.
pub(crate) fn build_filter(env: Option<&str>, level: &str) -> CliResult<EnvFilter> {
    let directives = env.map(str::trim).filter(|value| !value.is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives)
        .map_err(|err| CliError::new(format!("invalid log filter '{directives}': {err}")))
}

/// Installs the global subscriber.
pub(crate) fn init(config: &LoggingConfig) -> CliResult<()> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env.as_deref(), &config.level)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed.map_err(|err| CliError::new(format!("failed to install logging: {err}")))
}
