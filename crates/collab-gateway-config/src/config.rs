// crates/collab-gateway-config/src/config.rs
// ============================================================================
// Module: Collab Gateway Configuration
// Description: Configuration loading and validation for the gateway.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: collab-gateway-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and defaults to a loopback-only stdio server with
//! credential probing enabled. Invalid configuration fails closed with an
//! error naming the offending key.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use collab_gateway_core::TeamRole;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "collab-gateway.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "COLLAB_GATEWAY_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of tenant and client identifiers.
pub(crate) const MAX_IDENTIFIER_LENGTH: usize = 128;
/// Maximum number of requested scopes.
pub(crate) const MAX_SCOPES: usize = 32;
/// Maximum length of a single scope.
pub(crate) const MAX_SCOPE_LENGTH: usize = 256;
/// Maximum number of vault labels probed.
pub(crate) const MAX_VAULT_LABELS: usize = 16;
/// Maximum number of arguments in a probe command.
pub(crate) const MAX_COMMAND_ARGS: usize = 32;
/// Minimum probe command timeout in milliseconds.
pub(crate) const MIN_COMMAND_TIMEOUT_MS: u64 = 100;
/// Maximum probe command timeout in milliseconds.
pub(crate) const MAX_COMMAND_TIMEOUT_MS: u64 = 120_000;
/// Minimum device-code wait in seconds.
pub(crate) const MIN_DEVICE_CODE_WAIT_SECS: u64 = 30;
/// Maximum device-code wait in seconds.
pub(crate) const MAX_DEVICE_CODE_WAIT_SECS: u64 = 3_600;
/// Minimum simulated token lifetime in seconds.
pub(crate) const MIN_SIMULATED_TOKEN_LIFETIME_SECS: u64 = 600;
/// Maximum simulated token lifetime in seconds.
pub(crate) const MAX_SIMULATED_TOKEN_LIFETIME_SECS: u64 = 86_400;
/// Maximum number of directory role overrides.
pub(crate) const MAX_DIRECTORY_ENTRIES: usize = 256;

/// Vault service prefixes the platform vault probe recognises.
pub const KNOWN_VAULT_SERVICE_PREFIXES: [&str; 4] =
    ["collab-gateway", "MicrosoftOffice", "msal", "Microsoft.Developer.IdentityService"];

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Collab Gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollabGatewayConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication configuration.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Simulation-mode configuration.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// In-memory directory configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Path the configuration was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl CollabGatewayConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order is the explicit `path`, then [`CONFIG_ENV_VAR`], then
    /// [`DEFAULT_CONFIG_NAME`]. Built-in defaults are used only when neither an
    /// explicit path nor the environment variable was given and the default
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved.path)?;
        if !resolved.explicit && !resolved.path.exists() {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved.path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_path = Some(resolved.path);
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.auth.validate()?;
        self.simulation.validate()?;
        self.directory.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Transport types for the protocol gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// Line-delimited JSON-RPC over stdin/stdout.
    #[default]
    Stdio,
    /// JSON-RPC over HTTP `POST /rpc`.
    Http,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Transport binding.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the HTTP transport.
    #[serde(default)]
    pub bind: Option<String>,
    /// Allows binding the HTTP transport to a non-loopback address.
    #[serde(default)]
    pub allow_non_loopback: bool,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Structured audit logging.
    #[serde(default)]
    pub audit: ServerAuditConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            allow_non_loopback: false,
            max_body_bytes: default_max_body_bytes(),
            audit: ServerAuditConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address, when one is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the address cannot be parsed.
    pub fn bind_addr(&self) -> Result<Option<SocketAddr>, ConfigError> {
        let Some(bind) = self.bind.as_deref().map(str::trim).filter(|bind| !bind.is_empty())
        else {
            return Ok(None);
        };
        bind.parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid("server.bind is not a valid address".to_string()))
    }

    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_CONFIG_FILE_SIZE * 16 {
            return Err(ConfigError::Invalid("server.max_body_bytes too large".to_string()));
        }
        self.audit.validate()?;
        match self.transport {
            ServerTransport::Http => {
                let Some(addr) = self.bind_addr()? else {
                    return Err(ConfigError::Invalid(
                        "server.bind is required for http transport".to_string(),
                    ));
                };
                if !addr.ip().is_loopback() && !self.allow_non_loopback {
                    return Err(ConfigError::Invalid(
                        "server.bind is non-loopback; set server.allow_non_loopback = true"
                            .to_string(),
                    ));
                }
            }
            ServerTransport::Stdio => {
                if self.bind.is_some() {
                    return Err(ConfigError::Invalid(
                        "server.bind is only valid for http transport".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerAuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when unset.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for ServerAuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl ServerAuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("server.audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Authentication
// ============================================================================

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Directory tenant identifier.
    #[serde(default = "default_tenant_id")]
    pub tenant_id: String,
    /// Public client identifier used by the device-code flow.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Scopes requested for the access token.
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    /// Identity provider authority base URL.
    #[serde(default = "default_authority")]
    pub authority: String,
    /// When false, calls never start the interactive device-code flow.
    #[serde(default = "default_auth_required")]
    pub required: bool,
    /// Upper bound on the device-code wait, in seconds.
    #[serde(default = "default_device_code_max_wait_secs")]
    pub device_code_max_wait_secs: u64,
    /// Command-line identity tool probe.
    #[serde(default)]
    pub cli: CliProbeConfig,
    /// Editor identity extension probe.
    #[serde(default)]
    pub editor: EditorProbeConfig,
    /// Platform credential vault probe.
    #[serde(default)]
    pub vault: VaultProbeConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            tenant_id: default_tenant_id(),
            client_id: None,
            scopes: default_scopes(),
            authority: default_authority(),
            required: default_auth_required(),
            device_code_max_wait_secs: default_device_code_max_wait_secs(),
            cli: CliProbeConfig::default(),
            editor: EditorProbeConfig::default(),
            vault: VaultProbeConfig::default(),
        }
    }
}

impl AuthConfig {
    /// Validates authentication configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("auth.tenant_id", &self.tenant_id)?;
        if let Some(client_id) = &self.client_id {
            validate_identifier("auth.client_id", client_id)?;
        }
        if self.scopes.is_empty() {
            return Err(ConfigError::Invalid("auth.scopes must be non-empty".to_string()));
        }
        if self.scopes.len() > MAX_SCOPES {
            return Err(ConfigError::Invalid("auth.scopes has too many entries".to_string()));
        }
        for scope in &self.scopes {
            let trimmed = scope.trim();
            if trimmed.is_empty() || trimmed.len() > MAX_SCOPE_LENGTH {
                return Err(ConfigError::Invalid(format!("auth.scopes entry invalid: {scope}")));
            }
            if trimmed.chars().any(char::is_whitespace) {
                return Err(ConfigError::Invalid(format!(
                    "auth.scopes entry must not contain whitespace: {scope}"
                )));
            }
        }
        let authority = Url::parse(self.authority.trim())
            .map_err(|_| ConfigError::Invalid("auth.authority must be a valid url".to_string()))?;
        if authority.scheme() != "https" {
            return Err(ConfigError::Invalid("auth.authority must use https".to_string()));
        }
        if !(MIN_DEVICE_CODE_WAIT_SECS..=MAX_DEVICE_CODE_WAIT_SECS)
            .contains(&self.device_code_max_wait_secs)
        {
            return Err(ConfigError::Invalid(format!(
                "auth.device_code_max_wait_secs must be between {MIN_DEVICE_CODE_WAIT_SECS} and \
                 {MAX_DEVICE_CODE_WAIT_SECS}"
            )));
        }
        self.cli.validate()?;
        self.editor.validate()?;
        self.vault.validate()?;
        Ok(())
    }
}

/// Command-line identity tool probe configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CliProbeConfig {
    /// Enables the probe.
    #[serde(default = "default_probe_enabled")]
    pub enabled: bool,
    /// Command (program and arguments) printing the active account as JSON.
    #[serde(default = "default_account_command")]
    pub account_command: Vec<String>,
    /// Command (program and arguments) printing an access token as JSON.
    #[serde(default = "default_token_command")]
    pub token_command: Vec<String>,
    /// Per-command timeout in milliseconds.
    #[serde(default = "default_command_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CliProbeConfig {
    fn default() -> Self {
        Self {
            enabled: default_probe_enabled(),
            account_command: default_account_command(),
            token_command: default_token_command(),
            timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl CliProbeConfig {
    /// Validates command probe configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_command("auth.cli.account_command", &self.account_command)?;
        validate_command("auth.cli.token_command", &self.token_command)?;
        if !(MIN_COMMAND_TIMEOUT_MS..=MAX_COMMAND_TIMEOUT_MS).contains(&self.timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "auth.cli.timeout_ms must be between {MIN_COMMAND_TIMEOUT_MS} and \
                 {MAX_COMMAND_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Editor identity extension probe configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EditorProbeConfig {
    /// Enables the probe.
    #[serde(default = "default_probe_enabled")]
    pub enabled: bool,
    /// Token-store file path; a platform default is used when unset.
    #[serde(default)]
    pub token_store_path: Option<String>,
}

impl Default for EditorProbeConfig {
    fn default() -> Self {
        Self {
            enabled: default_probe_enabled(),
            token_store_path: None,
        }
    }
}

impl EditorProbeConfig {
    /// Validates editor probe configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.token_store_path {
            validate_path_string("auth.editor.token_store_path", path)?;
        }
        Ok(())
    }
}

/// Platform credential vault probe configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultProbeConfig {
    /// Enables the probe.
    #[serde(default = "default_probe_enabled")]
    pub enabled: bool,
    /// Vault entries to look for, as `service/account` labels.
    #[serde(default = "default_vault_labels")]
    pub labels: Vec<String>,
}

impl Default for VaultProbeConfig {
    fn default() -> Self {
        Self {
            enabled: default_probe_enabled(),
            labels: default_vault_labels(),
        }
    }
}

impl VaultProbeConfig {
    /// Validates vault probe configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.labels.len() > MAX_VAULT_LABELS {
            return Err(ConfigError::Invalid("auth.vault.labels has too many entries".to_string()));
        }
        for label in &self.labels {
            let Some((service, account)) = split_vault_label(label) else {
                return Err(ConfigError::Invalid(format!(
                    "auth.vault.labels entry must be service/account: {label}"
                )));
            };
            if account.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "auth.vault.labels entry has empty account: {label}"
                )));
            }
            if !KNOWN_VAULT_SERVICE_PREFIXES.iter().any(|prefix| service.starts_with(prefix)) {
                return Err(ConfigError::Invalid(format!(
                    "auth.vault.labels entry has unknown service prefix: {label}"
                )));
            }
        }
        Ok(())
    }
}

/// Splits a `service/account` vault label at its first slash.
#[must_use]
pub fn split_vault_label(label: &str) -> Option<(&str, &str)> {
    let (service, account) = label.trim().split_once('/')?;
    if service.is_empty() {
        return None;
    }
    Some((service, account))
}

// ============================================================================
// SECTION: Simulation
// ============================================================================

/// Simulation-mode configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Replaces credential exchange and device code with local fakes.
    #[serde(default)]
    pub enabled: bool,
    /// Lifetime of simulated tokens in seconds.
    #[serde(default = "default_simulated_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            token_lifetime_secs: default_simulated_token_lifetime_secs(),
        }
    }
}

impl SimulationConfig {
    /// Validates simulation configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_SIMULATED_TOKEN_LIFETIME_SECS..=MAX_SIMULATED_TOKEN_LIFETIME_SECS)
            .contains(&self.token_lifetime_secs)
        {
            return Err(ConfigError::Invalid(format!(
                "simulation.token_lifetime_secs must be between \
                 {MIN_SIMULATED_TOKEN_LIFETIME_SECS} and {MAX_SIMULATED_TOKEN_LIFETIME_SECS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Directory
// ============================================================================

/// In-memory directory configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectoryConfig {
    /// Treats every team-scoped role lookup as Owner.
    #[serde(default)]
    pub owner_permissive: bool,
    /// Role used for teams without an explicit entry; non-member when unset.
    #[serde(default)]
    pub default_role: Option<TeamRole>,
    /// Caller role per team id, overriding the seeded roles.
    #[serde(default)]
    pub team_roles: BTreeMap<String, TeamRole>,
    /// Additional meeting ids the caller organizes.
    #[serde(default)]
    pub organizer_meetings: Vec<String>,
    /// Identity reported for the signed-in caller.
    #[serde(default)]
    pub identity: DirectoryIdentityConfig,
}

impl DirectoryConfig {
    /// Validates directory configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.team_roles.len() > MAX_DIRECTORY_ENTRIES
            || self.organizer_meetings.len() > MAX_DIRECTORY_ENTRIES
        {
            return Err(ConfigError::Invalid("directory has too many entries".to_string()));
        }
        for team_id in self.team_roles.keys() {
            validate_identifier("directory.team_roles key", team_id)?;
        }
        for meeting_id in &self.organizer_meetings {
            validate_identifier("directory.organizer_meetings entry", meeting_id)?;
        }
        self.identity.validate()
    }
}

/// Identity reported by the in-memory directory.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryIdentityConfig {
    /// User identifier.
    #[serde(default = "default_identity_user_id")]
    pub user_id: String,
    /// Display name.
    #[serde(default = "default_identity_display_name")]
    pub display_name: String,
    /// Principal name.
    #[serde(default = "default_identity_principal_name")]
    pub principal_name: String,
}

impl Default for DirectoryIdentityConfig {
    fn default() -> Self {
        Self {
            user_id: default_identity_user_id(),
            display_name: default_identity_display_name(),
            principal_name: default_identity_principal_name(),
        }
    }
}

impl DirectoryIdentityConfig {
    /// Validates the directory identity.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_identifier("directory.identity.user_id", &self.user_id)?;
        if self.display_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "directory.identity.display_name must be non-empty".to_string(),
            ));
        }
        if self.principal_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "directory.identity.principal_name must be non-empty".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Diagnostic line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Full format with targets and fields.
    #[default]
    Full,
    /// Compact single-line format.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Line format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Full,
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Config path plus whether the caller asked for it explicitly.
struct ResolvedPath {
    /// Path to read.
    path: PathBuf,
    /// True when the path came from the caller or the environment.
    explicit: bool,
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<ResolvedPath, ConfigError> {
    if let Some(path) = path {
        return Ok(ResolvedPath {
            path: path.to_path_buf(),
            explicit: true,
        });
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(ResolvedPath {
            path: PathBuf::from(env_path),
            explicit: true,
        });
    }
    Ok(ResolvedPath {
        path: PathBuf::from(DEFAULT_CONFIG_NAME),
        explicit: false,
    })
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    let path = Path::new(trimmed);
    for component in path.components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates tenant, client, team, and meeting identifiers.
fn validate_identifier(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    if !trimmed.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')) {
        return Err(ConfigError::Invalid(format!("{field} contains invalid characters")));
    }
    Ok(())
}

/// Validates a probe command vector.
fn validate_command(field: &str, command: &[String]) -> Result<(), ConfigError> {
    let Some(program) = command.first() else {
        return Err(ConfigError::Invalid(format!("{field} must name a program")));
    };
    if program.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must name a program")));
    }
    if command.len() > MAX_COMMAND_ARGS {
        return Err(ConfigError::Invalid(format!("{field} has too many arguments")));
    }
    Ok(())
}

/// Default maximum request body size.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default audit logging enabled.
pub(crate) const fn default_audit_enabled() -> bool {
    true
}

/// Default tenant: any organizational account.
pub(crate) fn default_tenant_id() -> String {
    "organizations".to_string()
}

/// Default requested scopes.
pub(crate) fn default_scopes() -> Vec<String> {
    [
        "User.Read",
        "Team.ReadBasic.All",
        "Channel.ReadBasic.All",
        "ChannelMessage.Send",
        "TeamMember.ReadWrite.All",
        "OnlineMeetings.ReadWrite",
        "offline_access",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Default identity provider authority.
pub(crate) fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

/// Authentication is required by default.
pub(crate) const fn default_auth_required() -> bool {
    true
}

/// Default device-code wait bound in seconds.
pub(crate) const fn default_device_code_max_wait_secs() -> u64 {
    900
}

/// Probes are enabled by default.
pub(crate) const fn default_probe_enabled() -> bool {
    true
}

/// Default account command for the command-line identity tool.
pub(crate) fn default_account_command() -> Vec<String> {
    ["az", "account", "show", "--output", "json"].into_iter().map(str::to_string).collect()
}

/// Default token command for the command-line identity tool.
pub(crate) fn default_token_command() -> Vec<String> {
    ["az", "account", "get-access-token", "--resource-type", "ms-graph", "--output", "json"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Default probe command timeout in milliseconds.
pub(crate) const fn default_command_timeout_ms() -> u64 {
    10_000
}

/// Default vault labels probed.
pub(crate) fn default_vault_labels() -> Vec<String> {
    vec!["collab-gateway/default".to_string()]
}

/// Default simulated token lifetime.
pub(crate) const fn default_simulated_token_lifetime_secs() -> u64 {
    3_600
}

/// Default directory user id.
pub(crate) fn default_identity_user_id() -> String {
    "user-0001".to_string()
}

/// Default directory display name.
pub(crate) fn default_identity_display_name() -> String {
    "Dev User".to_string()
}

/// Default directory principal name.
pub(crate) fn default_identity_principal_name() -> String {
    "dev.user@example.com".to_string()
}

/// Default log filter.
pub(crate) fn default_log_level() -> String {
    "info".to_string()
}
