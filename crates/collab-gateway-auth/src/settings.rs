// crates/collab-gateway-auth/src/settings.rs
// ============================================================================
// Module: Auth Settings
// Description: Explicit settings value consumed by the session subsystem.
// Purpose: Convert validated configuration once into typed auth parameters.
// Dependencies: collab-gateway-config, directories
// ============================================================================

//! ## Overview
//! [`AuthSettings`] is built once at startup from the validated
//! configuration and threaded into the session manager and context resolver.
//! The process environment is never consulted here; host-level overrides are
//! applied to the configuration before conversion.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::time::Duration;

use collab_gateway_config::CollabGatewayConfig;
use collab_gateway_config::split_vault_label;
use directories::BaseDirs;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Editor token-store location relative to the user configuration directory.
const EDITOR_TOKEN_STORE_SUFFIX: [&str; 5] =
    ["Code", "User", "globalStorage", "ms-vscode.azure-account", "tokens.json"];

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Command-line identity tool probe settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliProbeSettings {
    /// Whether the probe runs.
    pub enabled: bool,
    /// Program and arguments printing the active account.
    pub account_command: Vec<String>,
    /// Program and arguments printing an access token.
    pub token_command: Vec<String>,
    /// Per-command timeout.
    pub timeout: Duration,
}

/// Editor identity extension probe settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorProbeSettings {
    /// Whether the probe runs.
    pub enabled: bool,
    /// Token-store file whose existence is checked.
    pub token_store_path: Option<PathBuf>,
}

/// One platform vault entry to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultLabel {
    /// Vault service name.
    pub service: String,
    /// Vault account name.
    pub account: String,
}

impl VaultLabel {
    /// Returns the `service/account` label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.service, self.account)
    }
}

/// Platform credential vault probe settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultProbeSettings {
    /// Whether the probe runs.
    pub enabled: bool,
    /// Entries to look for.
    pub labels: Vec<VaultLabel>,
}

/// Explicit authentication settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Directory tenant identifier.
    pub tenant_id: String,
    /// Public client identifier for the device-code flow.
    pub client_id: Option<String>,
    /// Requested scopes.
    pub scopes: Vec<String>,
    /// Identity provider authority base URL (no trailing slash).
    pub authority: String,
    /// Whether calls may start the interactive device-code flow.
    pub required: bool,
    /// Whether simulated exchange and device code replace the real ones.
    pub simulation: bool,
    /// Lifetime of simulated tokens.
    pub simulated_token_lifetime: Duration,
    /// Upper bound on the device-code wait.
    pub device_code_max_wait: Duration,
    /// Command-line identity tool probe.
    pub cli: CliProbeSettings,
    /// Editor extension probe.
    pub editor: EditorProbeSettings,
    /// Platform vault probe.
    pub vault: VaultProbeSettings,
}

impl AuthSettings {
    /// Builds settings from validated configuration.
    #[must_use]
    pub fn from_config(config: &CollabGatewayConfig) -> Self {
        let auth = &config.auth;
        let labels = auth
            .vault
            .labels
            .iter()
            .filter_map(|label| split_vault_label(label))
            .map(|(service, account)| VaultLabel {
                service: service.to_string(),
                account: account.to_string(),
            })
            .collect();
        let token_store_path = auth
            .editor
            .token_store_path
            .as_deref()
            .map(|path| PathBuf::from(path.trim()))
            .or_else(default_editor_token_store);
        Self {
            tenant_id: auth.tenant_id.trim().to_string(),
            client_id: auth.client_id.as_deref().map(|id| id.trim().to_string()),
            scopes: auth.scopes.iter().map(|scope| scope.trim().to_string()).collect(),
            authority: auth.authority.trim().trim_end_matches('/').to_string(),
            required: auth.required,
            simulation: config.simulation.enabled,
            simulated_token_lifetime: Duration::from_secs(config.simulation.token_lifetime_secs),
            device_code_max_wait: Duration::from_secs(auth.device_code_max_wait_secs),
            cli: CliProbeSettings {
                enabled: auth.cli.enabled,
                account_command: auth.cli.account_command.clone(),
                token_command: auth.cli.token_command.clone(),
                timeout: Duration::from_millis(auth.cli.timeout_ms),
            },
            editor: EditorProbeSettings {
                enabled: auth.editor.enabled,
                token_store_path,
            },
            vault: VaultProbeSettings {
                enabled: auth.vault.enabled,
                labels,
            },
        }
    }

    /// Returns the scopes joined for an OAuth `scope` parameter.
    #[must_use]
    pub fn scope_param(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Returns the platform default editor token-store path, when resolvable.
#[must_use]
pub fn default_editor_token_store() -> Option<PathBuf> {
    let dirs = BaseDirs::new()?;
    let mut path = dirs.config_dir().to_path_buf();
    path.extend(EDITOR_TOKEN_STORE_SUFFIX);
    Some(path)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
