// crates/collab-gateway-cli/src/main.rs
// ============================================================================
// Module: Collab Gateway CLI Entry Point
// Description: Command dispatcher for the gateway server and auth tooling.
// Purpose: Run the gateway and inspect credentials, tools, and configuration.
// Dependencies: clap, collab-gateway-auth, collab-gateway-mcp, tokio, tracing
// ============================================================================

//! ## Overview
//! The `collab-gateway` binary loads one configuration file, applies the
//! tenant and client environment overrides, installs logging on stderr, and
//! dispatches a subcommand:
//!
//! - `serve` runs the gateway on the configured transport,
//! - `detect` prints the credential detection report,
//! - `login` drives the session manager interactively,
//! - `tools` prints the built-in tool descriptors,
//! - `config check` validates a configuration file.
//!
//! Stdout carries only command output (or protocol traffic under `serve`);
//! diagnostics and the device-code prompt go to stderr.

// ============================================================================
// SECTION: Modules
// ============================================================================

mod logging;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use collab_gateway_auth::AuthSettings;
use collab_gateway_auth::SessionComponents;
use collab_gateway_auth::SessionManager;
use collab_gateway_auth::SilentPrompt;
use collab_gateway_auth::StderrPrompt;
use collab_gateway_config::CollabGatewayConfig;
use collab_gateway_config::ServerTransport;
use collab_gateway_core::SessionSource;
use collab_gateway_core::SharedClock;
use collab_gateway_core::SystemClock;
use collab_gateway_mcp::McpServer;
use collab_gateway_mcp::builtin_registry;
use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tokio_util::sync::CancellationToken;
use tracing::info;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable overriding `[auth] tenant_id`.
const TENANT_ENV: &str = "COLLAB_GATEWAY_TENANT_ID";
/// Environment variable overriding `[auth] client_id`.
const CLIENT_ENV: &str = "COLLAB_GATEWAY_CLIENT_ID";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "collab-gateway", version, disable_help_subcommand = true)]
struct Cli {
    /// Configuration file (defaults to `COLLAB_GATEWAY_CONFIG`, then
    /// `collab-gateway.toml`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway server.
    Serve(ServeCommand),
    /// Probe credential sources and print the detection report.
    Detect,
    /// Sign in and print the resulting session metadata.
    Login,
    /// Print the built-in tool descriptors.
    Tools,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Override the configured transport.
    #[arg(long, value_enum)]
    transport: Option<TransportArg>,
    /// Override the HTTP bind address.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

/// Transport selector for `serve --transport`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum TransportArg {
    /// Newline-delimited JSON-RPC on stdin/stdout.
    Stdio,
    /// JSON-RPC over `POST /rpc`.
    Http,
}

impl From<TransportArg> for ServerTransport {
    fn from(value: TransportArg) -> Self {
        match value {
            TransportArg::Stdio => Self::Stdio,
            TransportArg::Http => Self::Http,
        }
    }
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a configuration file.
    Check,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a printable message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;
    if let Commands::Serve(command) = &cli.command {
        apply_serve_overrides(&mut config, command)?;
    }
    logging::init(&config.logging)?;

    match cli.command {
        Commands::Serve(_) => command_serve(config).await,
        Commands::Detect => command_detect(&config).await,
        Commands::Login => command_login(&config).await,
        Commands::Tools => command_tools(),
        Commands::Config {
            command: ConfigCommand::Check,
        } => command_config_check(&config),
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Loads configuration and applies the environment overrides.
fn load_config(path: Option<&Path>) -> CliResult<CollabGatewayConfig> {
    let mut config = CollabGatewayConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let tenant = std::env::var(TENANT_ENV).ok();
    let client = std::env::var(CLIENT_ENV).ok();
    apply_env_overrides(&mut config, tenant, client)?;
    Ok(config)
}

/// Replaces tenant and client ids with non-empty override values.
fn apply_env_overrides(
    config: &mut CollabGatewayConfig,
    tenant: Option<String>,
    client: Option<String>,
) -> CliResult<()> {
    let non_empty = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
    let tenant = non_empty(tenant);
    let client = non_empty(client);
    if tenant.is_none() && client.is_none() {
        return Ok(());
    }
    if let Some(tenant) = tenant {
        config.auth.tenant_id = tenant;
    }
    if let Some(client) = client {
        config.auth.client_id = Some(client);
    }
    config
        .validate()
        .map_err(|err| CliError::new(format!("invalid environment override: {err}")))
}

/// Applies `serve` flag overrides and re-validates.
fn apply_serve_overrides(
    config: &mut CollabGatewayConfig,
    command: &ServeCommand,
) -> CliResult<()> {
    if command.transport.is_none() && command.bind.is_none() {
        return Ok(());
    }
    if let Some(transport) = command.transport {
        config.server.transport = transport.into();
    }
    if let Some(bind) = &command.bind {
        config.server.bind = Some(bind.clone());
    }
    config.validate().map_err(|err| CliError::new(format!("invalid serve options: {err}")))
}

/// Builds a session manager from configuration.
fn session_manager(
    config: &CollabGatewayConfig,
    interactive: bool,
) -> CliResult<(AuthSettings, SessionManager)> {
    let settings = AuthSettings::from_config(config);
    let components = if interactive {
        SessionComponents::from_settings(&settings, Arc::new(StderrPrompt))
    } else {
        SessionComponents::from_settings(&settings, Arc::new(SilentPrompt))
    }
    .map_err(|err| CliError::new(format!("failed to initialize authentication: {err}")))?;
    let clock: SharedClock = Arc::new(SystemClock);
    let manager = SessionManager::new(settings.clone(), components, clock);
    Ok((settings, manager))
}

/// Returns a token cancelled on Ctrl-C.
fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(config: CollabGatewayConfig) -> CliResult<ExitCode> {
    let transport = config.server.transport;
    let server = McpServer::from_config(config, None, Arc::new(StderrPrompt))
        .map_err(|err| CliError::new(format!("failed to initialize server: {err}")))?;
    info!(transport = transport_label(transport), "collab gateway starting");
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `detect` command.
async fn command_detect(config: &CollabGatewayConfig) -> CliResult<ExitCode> {
    let settings = AuthSettings::from_config(config);
    let components = SessionComponents::from_settings(&settings, Arc::new(SilentPrompt))
        .map_err(|err| CliError::new(format!("failed to initialize authentication: {err}")))?;
    let cancel = interrupt_token();
    let report = components.detector.detect(&cancel).await;
    if cancel.is_cancelled() {
        return Err(CliError::new("detection interrupted".to_string()));
    }
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Session metadata printed by `login`; never contains the token itself.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginReport {
    /// Session manager state after sign-in.
    state: &'static str,
    /// Account label, when known.
    account: Option<String>,
    /// Tenant the token was issued for.
    tenant_id: Option<String>,
    /// Credential path that produced the session.
    source: SessionSource,
    /// Expiry in RFC 3339.
    expires_at: String,
    /// Granted scopes.
    scopes: BTreeSet<String>,
    /// Short SHA-256 fingerprint of the token.
    token_fingerprint: String,
    /// Whether simulation mode issued the token.
    simulation: bool,
}

/// Executes the `login` command.
async fn command_login(config: &CollabGatewayConfig) -> CliResult<ExitCode> {
    let (settings, manager) = session_manager(config, true)?;
    let cancel = interrupt_token();
    let session =
        manager.login(&cancel).await.map_err(|err| CliError::new(format!("login failed: {err}")))?;
    let expires_at = session
        .expires_at
        .format(&Rfc3339)
        .map_err(|err| CliError::new(format!("failed to format expiry: {err}")))?;
    let report = LoginReport {
        state: manager.state().as_str(),
        account: session.account.clone(),
        tenant_id: session.tenant_id.clone(),
        source: session.source,
        expires_at,
        scopes: session.scopes.clone(),
        token_fingerprint: session.access_token.fingerprint(),
        simulation: settings.simulation,
    };
    write_json(&report)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `tools` command.
fn command_tools() -> CliResult<ExitCode> {
    let registry = builtin_registry()
        .map_err(|err| CliError::new(format!("failed to build tool catalog: {err}")))?;
    write_json(registry.list())?;
    Ok(ExitCode::SUCCESS)
}

/// Executes the `config check` command.
fn command_config_check(config: &CollabGatewayConfig) -> CliResult<ExitCode> {
    let source = config
        .source_path
        .as_ref()
        .map_or_else(|| "built-in defaults".to_string(), |path| path.display().to_string());
    write_stdout_line(&format!(
        "config ok: {source} (transport {}, tenant {}, simulation {})",
        transport_label(config.server.transport),
        config.auth.tenant_id,
        if config.simulation.enabled { "on" } else { "off" },
    ))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Output
// ============================================================================

/// Returns a stable label for a transport.
const fn transport_label(transport: ServerTransport) -> &'static str {
    match transport {
        ServerTransport::Stdio => "stdio",
        ServerTransport::Http => "http",
    }
}

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> CliResult<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
        .map_err(|err| CliError::new(format!("failed to write stdout: {err}")))
}

/// Writes pretty JSON to stdout.
fn write_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    write_stdout_line(&rendered)
}

/// Writes an error message to stderr and returns a failure code.
fn emit_error(message: &str) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(&mut stderr, "error: {message}");
    ExitCode::FAILURE
}
