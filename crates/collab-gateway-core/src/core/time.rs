// crates/collab-gateway-core/src/core/time.rs
// ============================================================================
// Module: Collab Gateway Time Source
// Description: Injectable wall-clock abstraction.
// Purpose: Keep session expiry decisions testable without sleeping.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Session validity depends on wall-clock time. Components take a
//! [`SharedClock`] instead of calling `OffsetDateTime::now_utc` directly so
//! tests can drive expiry boundaries with [`ManualClock`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use time::Duration;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Clock Trait
// ============================================================================

/// Wall-clock source.
pub trait Clock: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> OffsetDateTime;
}

/// Shared clock handle.
pub type SharedClock = Arc<dyn Clock>;

/// System wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

// ============================================================================
// SECTION: Manual Clock
// ============================================================================

/// Manually advanced clock for deterministic tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    /// Current instant reported by the clock.
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    /// Creates a clock pinned at `start`.
    #[must_use]
    pub const fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Moves the clock forward (or backward for negative durations).
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = guard.saturating_add(by);
    }

    /// Pins the clock at `instant`.
    pub fn set(&self, instant: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
