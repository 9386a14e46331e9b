// crates/collab-gateway-auth/src/session.rs
// ============================================================================
// Module: Session Manager
// Description: Owns the cached session and drives the authentication states.
// Purpose: Hand out valid tokens with at most one refresh in flight.
// Dependencies: tokio, tokio-util, tracing, collab-gateway-core
// ============================================================================

//! ## Overview
//! The session manager holds at most one [`Session`]. Every token request
//! first checks the cache against the validity rule
//! (`now < expires_at - 5 minutes`). On a miss it takes the refresh gate, so
//! concurrent callers wait for the single in-flight refresh instead of
//! starting their own, and re-checks the cache once it holds the gate.
//! Each settled refresh bumps a generation counter; a caller that queued
//! behind a refresh takes that refresh's outcome, including its error, so a
//! failed device-code wait is reported once per burst instead of replayed by
//! every waiter. A cancelled refresh settles nothing and the next waiter runs
//! its own.
//!
//! A refresh walks Detecting, then UsingExternalCredential for each available
//! source in priority order, then DeviceCodePending when no external
//! credential could be exchanged. A stale cached session is discarded and
//! reported as Expired until the next refresh starts.
//!
//! Every wait is bounded by the caller's cancellation token. A cancelled or
//! failed refresh leaves the manager Unauthenticated with no cached token.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use collab_gateway_core::DetectionReport;
use collab_gateway_core::Session;
use collab_gateway_core::SessionState;
use collab_gateway_core::SharedClock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::detector::CredentialDetector;
use crate::device_code::DeviceCodeFlow;
use crate::device_code::DeviceCodePrompt;
use crate::device_code::HttpDeviceCodeFlow;
use crate::device_code::SimulatedDeviceCodeFlow;
use crate::error::AuthenticationError;
use crate::exchange::CliTokenExchanger;
use crate::exchange::CredentialExchanger;
use crate::exchange::SimulatedExchanger;
use crate::settings::AuthSettings;

// ============================================================================
// SECTION: Components
// ============================================================================

/// Pluggable collaborators of the session manager.
#[derive(Clone)]
pub struct SessionComponents {
    /// Credential source detector.
    pub detector: CredentialDetector,
    /// Credential exchanger.
    pub exchanger: Arc<dyn CredentialExchanger>,
    /// Interactive device-code flow.
    pub device_code: Arc<dyn DeviceCodeFlow>,
    /// Sink for device-code instructions.
    pub prompt: Arc<dyn DeviceCodePrompt>,
}

impl SessionComponents {
    /// Builds the standard components for `settings`.
    ///
    /// Simulation mode swaps in the simulated detector, exchanger, and device
    /// code flow; otherwise the real probes and HTTP flow are used.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when the HTTP client cannot be built.
    pub fn from_settings(
        settings: &AuthSettings,
        prompt: Arc<dyn DeviceCodePrompt>,
    ) -> Result<Self, AuthenticationError> {
        if settings.simulation {
            return Ok(Self {
                detector: CredentialDetector::simulated(settings),
                exchanger: Arc::new(SimulatedExchanger::new()),
                device_code: Arc::new(SimulatedDeviceCodeFlow::default()),
                prompt,
            });
        }
        Ok(Self {
            detector: CredentialDetector::from_settings(settings),
            exchanger: Arc::new(CliTokenExchanger),
            device_code: Arc::new(HttpDeviceCodeFlow::new()?),
            prompt,
        })
    }
}

// ============================================================================
// SECTION: Session Manager
// ============================================================================

/// Mutable session state guarded by a short-lived lock.
#[derive(Debug, Default)]
struct SessionSlot {
    /// Current lifecycle state.
    state: SessionState,
    /// Cached session, if any.
    session: Option<Session>,
    /// Most recent detection report.
    last_detection: Option<DetectionReport>,
    /// Number of refreshes that settled with a session or a failure.
    refresh_generation: u64,
    /// Failure of the most recently settled refresh.
    last_failure: Option<AuthenticationError>,
}

/// Whether a refresh may fall back to the device-code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interaction {
    /// Device code allowed.
    Allowed,
    /// Only cached or externally exchanged credentials.
    Forbidden,
}

/// Session manager.
///
/// # Invariants
/// - At most one cached session.
/// - At most one refresh runs at a time.
pub struct SessionManager {
    /// Explicit settings value.
    settings: AuthSettings,
    /// Detector, exchanger, device code, and prompt.
    components: SessionComponents,
    /// Wall clock used for validity checks.
    clock: SharedClock,
    /// Cached session and observable state.
    slot: Mutex<SessionSlot>,
    /// Held for the duration of a refresh.
    refresh_gate: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Creates a manager in the Unauthenticated state.
    #[must_use]
    pub fn new(settings: AuthSettings, components: SessionComponents, clock: SharedClock) -> Self {
        Self {
            settings,
            components,
            clock,
            slot: Mutex::new(SessionSlot::default()),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the settings this manager was built with.
    #[must_use]
    pub const fn settings(&self) -> &AuthSettings {
        &self.settings
    }

    /// Returns the current state, reporting Expired for a stale cached session.
    #[must_use]
    pub fn state(&self) -> SessionState {
        let now = self.clock.now();
        let slot = self.lock_slot();
        match (&slot.session, slot.state) {
            (Some(session), SessionState::Authenticated) if !session.is_valid_at(now) => {
                SessionState::Expired
            }
            (_, state) => state,
        }
    }

    /// Returns the cached session when it is still valid.
    #[must_use]
    pub fn cached_session(&self) -> Option<Session> {
        let now = self.clock.now();
        self.lock_slot().session.as_ref().filter(|session| session.is_valid_at(now)).cloned()
    }

    /// Returns the most recent detection report.
    #[must_use]
    pub fn last_detection(&self) -> Option<DetectionReport> {
        self.lock_slot().last_detection.clone()
    }

    /// Discards any cached token and returns to Unauthenticated.
    pub fn clear_session(&self) {
        let mut slot = self.lock_slot();
        slot.session = None;
        slot.state = SessionState::Unauthenticated;
        info!("session cleared");
    }

    /// Returns a valid session, refreshing when needed.
    ///
    /// The device-code fallback is used only when the settings require
    /// authentication.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when no session can be established.
    pub async fn get_access_token(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Session, AuthenticationError> {
        let interaction =
            if self.settings.required { Interaction::Allowed } else { Interaction::Forbidden };
        self.acquire(cancel, interaction).await
    }

    /// Returns a valid session without ever starting the device-code flow.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError::InteractionRequired`] when no cached or
    /// external credential is usable.
    pub async fn get_access_token_silent(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Session, AuthenticationError> {
        self.acquire(cancel, Interaction::Forbidden).await
    }

    /// Returns a valid session, always allowing the device-code fallback.
    ///
    /// # Errors
    ///
    /// Returns [`AuthenticationError`] when no session can be established.
    pub async fn login(&self, cancel: &CancellationToken) -> Result<Session, AuthenticationError> {
        self.acquire(cancel, Interaction::Allowed).await
    }

    /// Cache check, single-flight gate, double check, refresh.
    async fn acquire(
        &self,
        cancel: &CancellationToken,
        interaction: Interaction,
    ) -> Result<Session, AuthenticationError> {
        let observed = self.lock_slot().refresh_generation;
        if let Some(session) = self.take_valid_or_expire() {
            return Ok(session);
        }
        let _gate = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
            guard = self.refresh_gate.lock() => guard,
        };
        if let Some(session) = self.take_valid_or_expire() {
            return Ok(session);
        }
        if let Some(err) = self.failure_since(observed, interaction) {
            debug!(error = %err, "sharing the failure of the refresh this caller waited on");
            return Err(err);
        }
        match self.refresh(cancel, interaction).await {
            Ok(session) => {
                info!(
                    source = ?session.source,
                    token = %session.access_token,
                    "session established"
                );
                let mut slot = self.lock_slot();
                slot.session = Some(session.clone());
                slot.state = SessionState::Authenticated;
                slot.last_failure = None;
                slot.refresh_generation = slot.refresh_generation.wrapping_add(1);
                Ok(session)
            }
            Err(err) => {
                warn!(error = %err, "session refresh failed");
                let mut slot = self.lock_slot();
                slot.session = None;
                slot.state = SessionState::Unauthenticated;
                if err != AuthenticationError::Cancelled {
                    slot.last_failure = Some(err.clone());
                    slot.refresh_generation = slot.refresh_generation.wrapping_add(1);
                }
                Err(err)
            }
        }
    }

    /// Returns the failure of a refresh that settled after `observed`.
    ///
    /// A non-interactive refresh that found no external credential does not
    /// answer a caller that may start the device-code flow.
    fn failure_since(
        &self,
        observed: u64,
        interaction: Interaction,
    ) -> Option<AuthenticationError> {
        let slot = self.lock_slot();
        if slot.refresh_generation == observed {
            return None;
        }
        match &slot.last_failure {
            Some(AuthenticationError::InteractionRequired)
                if interaction == Interaction::Allowed =>
            {
                None
            }
            failure => failure.clone(),
        }
    }

    /// Returns the cached session when valid; discards it as Expired otherwise.
    fn take_valid_or_expire(&self) -> Option<Session> {
        let now = self.clock.now();
        let mut slot = self.lock_slot();
        match &slot.session {
            Some(session) if session.is_valid_at(now) => Some(session.clone()),
            Some(_) => {
                debug!("cached session passed its safety deadline");
                slot.session = None;
                slot.state = SessionState::Expired;
                None
            }
            None => None,
        }
    }

    /// Runs detection, exchange, and the device-code fallback.
    async fn refresh(
        &self,
        cancel: &CancellationToken,
        interaction: Interaction,
    ) -> Result<Session, AuthenticationError> {
        self.set_state(SessionState::Detecting);
        let report = self.components.detector.detect(cancel).await;
        if cancel.is_cancelled() {
            return Err(AuthenticationError::Cancelled);
        }
        self.lock_slot().last_detection = Some(report.clone());

        for source in report.available() {
            self.set_state(SessionState::UsingExternalCredential);
            match self
                .components
                .exchanger
                .exchange(source, &self.settings, self.clock.as_ref(), cancel)
                .await
            {
                Ok(Some(session)) => return Ok(session),
                Ok(None) => {
                    debug!(source = %source.kind, "credential source is not exchangeable");
                }
                Err(AuthenticationError::Cancelled) => return Err(AuthenticationError::Cancelled),
                Err(err) => {
                    warn!(source = %source.kind, error = %err, "credential exchange failed");
                }
            }
        }

        if interaction == Interaction::Forbidden {
            return Err(AuthenticationError::InteractionRequired);
        }
        self.set_state(SessionState::DeviceCodePending);
        self.components
            .device_code
            .authenticate(
                &self.settings,
                self.components.prompt.as_ref(),
                self.clock.as_ref(),
                cancel,
            )
            .await
    }

    /// Records a state transition.
    fn set_state(&self, state: SessionState) {
        debug!(state = state.as_str(), "session state");
        self.lock_slot().state = state;
    }

    /// Locks the slot, recovering from poisoning.
    fn lock_slot(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
