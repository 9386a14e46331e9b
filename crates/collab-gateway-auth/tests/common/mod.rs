// crates/collab-gateway-auth/tests/common/mod.rs
// =============================================================================
// Module: Auth Test Helpers
// Description: Counting fakes for probes, exchange, and device code.
// Purpose: Observe session manager transitions without real identity stores.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use collab_gateway_auth::AuthSettings;
use collab_gateway_auth::AuthenticationError;
use collab_gateway_auth::CredentialDetector;
use collab_gateway_auth::CredentialExchanger;
use collab_gateway_auth::CredentialProbe;
use collab_gateway_auth::DeviceCodeFlow;
use collab_gateway_auth::DeviceCodePrompt;
use collab_gateway_auth::ProbeError;
use collab_gateway_auth::SessionComponents;
use collab_gateway_auth::SessionManager;
use collab_gateway_auth::SilentPrompt;
use collab_gateway_auth::exchange::simulated_session;
use collab_gateway_config::CollabGatewayConfig;
use collab_gateway_core::Clock;
use collab_gateway_core::CredentialSource;
use collab_gateway_core::CredentialSourceKind;
use collab_gateway_core::ManualClock;
use collab_gateway_core::Session;
use collab_gateway_core::SessionSource;
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

/// Fixed start instant for manual clocks.
pub fn start_time() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

/// Settings with real probes disabled and a one-hour simulated token lifetime.
pub fn test_settings() -> AuthSettings {
    let mut settings = AuthSettings::from_config(&CollabGatewayConfig::default());
    settings.cli.enabled = false;
    settings.editor.enabled = false;
    settings.vault.enabled = false;
    settings.simulated_token_lifetime = Duration::from_secs(3_600);
    settings
}

/// Probe that counts invocations and reports a fixed availability.
pub struct CountingProbe {
    pub kind: CredentialSourceKind,
    pub available: bool,
    pub calls: AtomicUsize,
}

impl CountingProbe {
    pub fn new(kind: CredentialSourceKind, available: bool) -> Arc<Self> {
        Arc::new(Self {
            kind,
            available,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialProbe for CountingProbe {
    fn kind(&self) -> CredentialSourceKind {
        self.kind
    }

    async fn probe(&self, _cancel: &CancellationToken) -> Result<CredentialSource, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.available {
            Ok(CredentialSource::available(self.kind))
        } else {
            Ok(CredentialSource::unavailable(self.kind, "absent"))
        }
    }
}

/// Exchanger that counts calls, optionally sleeps, and may fail.
pub struct CountingExchanger {
    pub calls: AtomicUsize,
    pub latency: Duration,
    pub fail: bool,
    pub exchangeable: Vec<CredentialSourceKind>,
}

impl CountingExchanger {
    pub fn new(latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            latency,
            fail: false,
            exchangeable: CredentialSourceKind::ALL.to_vec(),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
            fail: true,
            exchangeable: CredentialSourceKind::ALL.to_vec(),
        })
    }

    pub fn only(kinds: Vec<CredentialSourceKind>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            latency: Duration::ZERO,
            fail: false,
            exchangeable: kinds,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialExchanger for CountingExchanger {
    async fn exchange(
        &self,
        source: &CredentialSource,
        settings: &AuthSettings,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Option<Session>, AuthenticationError> {
        if !self.exchangeable.contains(&source.kind) {
            return Ok(None);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::select! {
                () = cancel.cancelled() => return Err(AuthenticationError::Cancelled),
                () = tokio::time::sleep(self.latency) => {}
            }
        }
        if self.fail {
            return Err(AuthenticationError::Exchange("refused".to_string()));
        }
        Ok(Some(simulated_session(
            settings,
            clock,
            None,
            SessionSource::ExternalCredential(source.kind),
        )))
    }
}

/// Device-code flow that counts calls and completes after a delay.
pub struct CountingDeviceCode {
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl CountingDeviceCode {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceCodeFlow for CountingDeviceCode {
    async fn authenticate(
        &self,
        settings: &AuthSettings,
        _prompt: &dyn DeviceCodePrompt,
        clock: &dyn Clock,
        cancel: &CancellationToken,
    ) -> Result<Session, AuthenticationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let deadline = settings.device_code_max_wait;
        tokio::select! {
            () = cancel.cancelled() => Err(AuthenticationError::Cancelled),
            () = tokio::time::sleep(deadline), if self.delay >= deadline => {
                Err(AuthenticationError::DeviceCodeExpired)
            }
            () = tokio::time::sleep(self.delay), if self.delay < deadline => {
                Ok(simulated_session(settings, clock, None, SessionSource::DeviceCode))
            }
        }
    }
}

/// Assembled manager plus handles to its fakes.
pub struct Harness {
    pub manager: Arc<SessionManager>,
    pub clock: Arc<ManualClock>,
    pub probes: Vec<Arc<CountingProbe>>,
    pub exchanger: Arc<CountingExchanger>,
    pub device_code: Arc<CountingDeviceCode>,
}

impl Harness {
    /// Total detection passes, read from the first probe.
    pub fn detections(&self) -> usize {
        self.probes.first().map_or(0, |probe| probe.calls())
    }
}

/// Builds a manager over counting fakes.
pub fn harness(
    settings: AuthSettings,
    available: &[CredentialSourceKind],
    exchanger: Arc<CountingExchanger>,
    device_code: Arc<CountingDeviceCode>,
) -> Harness {
    let probes: Vec<Arc<CountingProbe>> = CredentialSourceKind::ALL
        .iter()
        .map(|kind| CountingProbe::new(*kind, available.contains(kind)))
        .collect();
    let detector = CredentialDetector::new(
        probes.iter().map(|probe| Arc::clone(probe) as Arc<dyn CredentialProbe>).collect(),
    );
    let clock = Arc::new(ManualClock::new(start_time()));
    let components = SessionComponents {
        detector,
        exchanger: Arc::clone(&exchanger) as Arc<dyn CredentialExchanger>,
        device_code: Arc::clone(&device_code) as Arc<dyn DeviceCodeFlow>,
        prompt: Arc::new(SilentPrompt),
    };
    let manager =
        Arc::new(SessionManager::new(settings, components, Arc::clone(&clock) as Arc<dyn Clock>));
    Harness {
        manager,
        clock,
        probes,
        exchanger,
        device_code,
    }
}
