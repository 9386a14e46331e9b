// crates/collab-gateway-auth/src/device_code.rs
// ============================================================================
// Module: Device Code Flow
// Description: Interactive out-of-band sign-in with a URL and short code.
// Purpose: Establish a session when no external credential is usable.
// Dependencies: reqwest, serde, time, tokio, tokio-util, url
// ============================================================================

//! ## Overview
//! The device-code flow asks the identity provider for a user code, shows the
//! verification URL and code through a [`DeviceCodePrompt`], then polls the
//! token endpoint until the user completes sign-in elsewhere. The wait is
//! bounded by the smaller of the provider's `expires_in` and the configured
//! maximum, and is aborted as soon as the caller's cancellation token fires.
//!
//! Polling honours the provider's `interval`, adds five seconds on
//! `slow_down`, keeps waiting on `authorization_pending`, and stops on
//! `expired_token` or `access_denied`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use collab_gateway_core::AccessToken;
use collab_gateway_core::Clock;
use collab_gateway_core::Session;
use collab_gateway_core::SessionSource;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::error::AuthenticationError;
use crate::exchange::simulated_session;
use crate::settings::AuthSettings;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// OAuth grant type for device-code token polling.
pub const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
/// Extra delay added to the polling interval on `slow_down`.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);
/// Default polling interval when the provider does not send one.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default HTTP request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Challenge and Prompt
// ============================================================================

/// Verification details shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCodeChallenge {
    /// URL the user opens.
    pub verification_uri: String,
    /// Short code the user enters.
    pub user_code: String,
    /// Provider-supplied instruction text.
    pub message: Option<String>,
    /// Time until the code expires.
    #[serde(skip)]
    pub expires_in: Duration,
}

/// Sink that shows the verification details to a human.
pub trait DeviceCodePrompt: Send + Sync {
    /// Displays the challenge.
    fn show(&self, challenge: &DeviceCodeChallenge);
}

/// Prompt writing to stderr; stdout is reserved for the protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrPrompt;

impl DeviceCodePrompt for StderrPrompt {
    fn show(&self, challenge: &DeviceCodeChallenge) {
        let mut stderr = std::io::stderr();
        let text = challenge.message.clone().unwrap_or_else(|| {
            format!(
                "To sign in, open {} and enter the code {}",
                challenge.verification_uri, challenge.user_code
            )
        });
        let _ = writeln!(&mut stderr, "{text}");
    }
}

/// Prompt that only logs the challenge.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPrompt;

impl DeviceCodePrompt for SilentPrompt {
    fn show(&self, challenge: &DeviceCodeChallenge) {
        info!(
            verification_uri = %challenge.verification_uri,
            user_code = %challenge.user_code,
            "device code sign-in pending"
        );
    }
}

// ============================================================================
// SECTION: Flow Trait
// ============================================================================

/// Interactive device-code sign-in.
#[async_trait]
pub trait DeviceCodeFlow: Send + Sync {
    /// Runs the flow to completion.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when sign-in fails, is declined, times
    /// out, or is cancelled.
    async fn authenticate(
        &self,
        settings: &AuthSettings,
        prompt: &dyn DeviceCodePrompt,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Session, AuthenticationError>;
}

// ============================================================================
// SECTION: HTTP Flow
// ============================================================================

/// Device authorization response.
#[derive(Debug, Deserialize)]
struct DeviceAuthorizationResponse {
    /// Code used when polling.
    device_code: String,
    /// Code the user enters.
    user_code: String,
    /// Verification URL.
    verification_uri: String,
    /// Seconds until the code expires.
    expires_in: u64,
    /// Minimum polling interval in seconds.
    #[serde(default)]
    interval: Option<u64>,
    /// Instruction text.
    #[serde(default)]
    message: Option<String>,
}

/// Successful token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    /// Bearer token.
    access_token: String,
    /// Seconds until the token expires.
    expires_in: u64,
    /// Space-separated granted scopes.
    #[serde(default)]
    scope: Option<String>,
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    /// Error code.
    error: String,
    /// Human-readable description.
    #[serde(default)]
    error_description: Option<String>,
}

/// One poll outcome.
enum PollOutcome {
    /// Sign-in finished.
    Complete(TokenResponse),
    /// User has not finished yet.
    Pending,
    /// Provider asked for a longer interval.
    SlowDown,
}

/// Device-code flow against an OAuth 2.0 identity provider.
#[derive(Debug, Clone)]
pub struct HttpDeviceCodeFlow {
    /// HTTP client.
    client: Client,
    /// Lower bound on the polling interval.
    min_poll_interval: Duration,
}

impl HttpDeviceCodeFlow {
    /// Creates the flow with a default HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::Transport`] when the client cannot be
    /// built.
    pub fn new() -> Result<Self, AuthenticationError> {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AuthenticationError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            min_poll_interval: Duration::from_secs(1),
        })
    }

    /// Overrides the lower bound on the polling interval.
    #[must_use]
    pub fn with_min_poll_interval(mut self, interval: Duration) -> Self {
        self.min_poll_interval = interval;
        self
    }

    /// Returns the tenant-scoped OAuth endpoint `{authority}/{tenant}/oauth2/v2.0/{leaf}`.
    fn endpoint(settings: &AuthSettings, leaf: &str) -> String {
        format!("{}/{}/oauth2/v2.0/{leaf}", settings.authority, settings.tenant_id)
    }

    /// Posts a form body and returns the status plus raw body.
    async fn post_form(
        &self,
        url: &str,
        pairs: &[(&str, &str)],
    ) -> Result<(reqwest::StatusCode, String), AuthenticationError> {
        let body =
            url::form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|err| AuthenticationError::Transport(err.to_string()))?;
        let status = response.status();
        let text =
            response.text().await.map_err(|err| AuthenticationError::Transport(err.to_string()))?;
        Ok((status, text))
    }

    /// Requests a device code.
    async fn start(
        &self,
        settings: &AuthSettings,
        client_id: &str,
    ) -> Result<DeviceAuthorizationResponse, AuthenticationError> {
        let scope = settings.scope_param();
        let (status, body) = self
            .post_form(
                &Self::endpoint(settings, "devicecode"),
                &[("client_id", client_id), ("scope", scope.as_str())],
            )
            .await?;
        if !status.is_success() {
            return Err(provider_error(&body, status));
        }
        serde_json::from_str(&body).map_err(|err| {
            AuthenticationError::Provider(format!("invalid device code response: {err}"))
        })
    }

    /// Polls the token endpoint once.
    async fn poll(
        &self,
        settings: &AuthSettings,
        client_id: &str,
        device_code: &str,
    ) -> Result<PollOutcome, AuthenticationError> {
        let (status, body) = self
            .post_form(
                &Self::endpoint(settings, "token"),
                &[
                    ("grant_type", DEVICE_CODE_GRANT_TYPE),
                    ("client_id", client_id),
                    ("device_code", device_code),
                ],
            )
            .await?;
        if status.is_success() {
            let token: TokenResponse = serde_json::from_str(&body).map_err(|err| {
                AuthenticationError::Provider(format!("invalid token response: {err}"))
            })?;
            return Ok(PollOutcome::Complete(token));
        }
        let error: OAuthErrorResponse = serde_json::from_str(&body).map_err(|_| {
            AuthenticationError::Provider(format!("token endpoint returned {status}"))
        })?;
        match error.error.as_str() {
            "authorization_pending" => Ok(PollOutcome::Pending),
            "slow_down" => Ok(PollOutcome::SlowDown),
            "expired_token" | "code_expired" => Err(AuthenticationError::DeviceCodeExpired),
            "access_denied" | "authorization_declined" => Err(AuthenticationError::AccessDenied),
            other => Err(AuthenticationError::Provider(
                error.error_description.unwrap_or_else(|| other.to_string()),
            )),
        }
    }
}

#[async_trait]
impl DeviceCodeFlow for HttpDeviceCodeFlow {
    async fn authenticate(
        &self,
        settings: &AuthSettings,
        prompt: &dyn DeviceCodePrompt,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Session, AuthenticationError> {
        let client_id = settings.client_id.as_deref().filter(|id| !id.is_empty()).ok_or_else(
            || AuthenticationError::NotConfigured("auth.client_id is required".to_string()),
        )?;
        let authorization = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
            result = self.start(settings, client_id) => result?,
        };
        let expires_in = Duration::from_secs(authorization.expires_in);
        prompt.show(&DeviceCodeChallenge {
            verification_uri: authorization.verification_uri.clone(),
            user_code: authorization.user_code.clone(),
            message: authorization.message.clone(),
            expires_in,
        });
        let deadline = Instant::now() + expires_in.min(settings.device_code_max_wait);
        let mut interval = authorization
            .interval
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs)
            .max(self.min_poll_interval);
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
                () = tokio::time::sleep_until(deadline) => {
                    return Err(AuthenticationError::DeviceCodeExpired);
                }
                () = tokio::time::sleep(interval) => {}
            }
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
                () = tokio::time::sleep_until(deadline) => {
                    return Err(AuthenticationError::DeviceCodeExpired);
                }
                result = self.poll(settings, client_id, &authorization.device_code) => result?,
            };
            match outcome {
                PollOutcome::Complete(token) => {
                    debug!("device code sign-in completed");
                    return token_session(token, settings, clock);
                }
                PollOutcome::Pending => {}
                PollOutcome::SlowDown => {
                    interval += SLOW_DOWN_STEP;
                    debug!(interval_ms = interval.as_millis(), "device code polling slowed down");
                }
            }
        }
    }
}

/// Builds a session from a token response.
///
/// A token whose lifetime does not outlast the session safety margin is a
/// provider error.
fn token_session(
    token: TokenResponse,
    settings: &AuthSettings,
    clock: &dyn Clock,
) -> Result<Session, AuthenticationError> {
    let lifetime = time::Duration::seconds(i64::try_from(token.expires_in).unwrap_or(i64::MAX));
    let scopes = token.scope.map_or_else(
        || settings.scopes.iter().cloned().collect(),
        |scope| scope.split_whitespace().map(str::to_string).collect(),
    );
    let now = clock.now();
    let session = Session {
        access_token: AccessToken::new(token.access_token),
        expires_at: now.saturating_add(lifetime),
        tenant_id: Some(settings.tenant_id.clone()),
        scopes,
        account: None,
        source: SessionSource::DeviceCode,
    };
    if !session.is_valid_at(now) {
        warn!(expires_in = token.expires_in, "device code token expires inside the safety margin");
        return Err(AuthenticationError::Provider(format!(
            "token lifetime of {}s is too short to use",
            token.expires_in
        )));
    }
    Ok(session)
}

/// Maps a non-success provider response to an error.
fn provider_error(body: &str, status: reqwest::StatusCode) -> AuthenticationError {
    match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(error) => AuthenticationError::Provider(error.error_description.unwrap_or(error.error)),
        Err(_) => AuthenticationError::Provider(format!("device code endpoint returned {status}")),
    }
}

// ============================================================================
// SECTION: Simulated Flow
// ============================================================================

/// Device-code flow that completes locally after an optional delay.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDeviceCodeFlow {
    /// Simulated time until the user completes sign-in.
    completion_delay: Duration,
}

impl SimulatedDeviceCodeFlow {
    /// Creates a flow completing after `completion_delay`.
    #[must_use]
    pub const fn new(completion_delay: Duration) -> Self {
        Self {
            completion_delay,
        }
    }
}

#[async_trait]
impl DeviceCodeFlow for SimulatedDeviceCodeFlow {
    async fn authenticate(
        &self,
        settings: &AuthSettings,
        prompt: &dyn DeviceCodePrompt,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Session, AuthenticationError> {
        prompt.show(&DeviceCodeChallenge {
            verification_uri: "https://simulation.invalid/devicelogin".to_string(),
            user_code: "SIM-CODE".to_string(),
            message: None,
            expires_in: settings.device_code_max_wait,
        });
        if self.completion_delay >= settings.device_code_max_wait {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
                () = tokio::time::sleep(settings.device_code_max_wait) => {
                    return Err(AuthenticationError::DeviceCodeExpired);
                }
            }
        }
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
            () = tokio::time::sleep(self.completion_delay) => {}
        }
        Ok(simulated_session(
            settings,
            clock,
            Some("simulated-user".to_string()),
            SessionSource::DeviceCode,
        ))
    }
}
