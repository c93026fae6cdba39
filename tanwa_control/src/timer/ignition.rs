//! Countdown timers of a liquid engine launch.
//!
//! ```text
//!  countdown ───────────── ignition ───────── T-zero
//!      │                       │                 │
//!      │  ignition - countdown │    -ignition    │
//!      ├──────────────────────►│ igniters fire   │
//!      ├────────────────────────────────────────►│ main valves open, FIRE
//!      └ mission clock starts at `countdown`
//! ```
//!
//! The three timers start as one transaction: if any fails, all are
//! stopped and the error is returned for the caller to roll back.

use crate::error::TimerError;
use crate::timer::mission::MissionTimer;
use crate::timer::one_shot::OneShotTimer;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Ignition timer, burn (T-zero) timer and mission clock.
pub struct LiquidIgnitionTimers {
    ignition: OneShotTimer,
    burn: OneShotTimer,
    mission: Arc<MissionTimer>,
}

impl LiquidIgnitionTimers {
    pub fn new(ignition: OneShotTimer, burn: OneShotTimer, mission: Arc<MissionTimer>) -> Self {
        Self {
            ignition,
            burn,
            mission,
        }
    }

    /// Check `countdown_ms < ignition_ms <= 0`.
    pub fn validate(countdown_ms: i64, ignition_ms: i64) -> Result<(), TimerError> {
        if countdown_ms < ignition_ms && ignition_ms <= 0 {
            Ok(())
        } else {
            Err(TimerError::InvalidSchedule {
                countdown_ms,
                ignition_ms,
            })
        }
    }

    /// Start the countdown.
    pub fn start(&self, countdown_ms: i64, ignition_ms: i64) -> Result<(), TimerError> {
        Self::validate(countdown_ms, ignition_ms)?;

        let result = self.start_all(countdown_ms, ignition_ms);
        if let Err(e) = &result {
            warn!("countdown timers failed to start: {e}");
            self.stop();
        } else {
            info!(countdown_ms, ignition_ms, "countdown timers started");
        }
        result
    }

    fn start_all(&self, countdown_ms: i64, ignition_ms: i64) -> Result<(), TimerError> {
        let to_ignition = ignition_ms
            .checked_sub(countdown_ms)
            .ok_or(TimerError::InvalidSchedule {
                countdown_ms,
                ignition_ms,
            })?
            .unsigned_abs();
        let to_t_zero = countdown_ms.unsigned_abs();
        self.ignition.start(Duration::from_millis(to_ignition))?;
        self.burn.start(Duration::from_millis(to_t_zero))?;
        self.mission.start(countdown_ms)
    }

    /// Stop all three. Idempotent.
    pub fn stop(&self) {
        self.ignition.stop();
        self.burn.stop();
        self.mission.stop();
    }

    /// Whether ignition or T-zero is still pending.
    pub fn is_active(&self) -> bool {
        self.ignition.is_active() || self.burn.is_active()
    }

    /// Fires the igniters.
    pub fn ignition_timer(&self) -> &OneShotTimer {
        &self.ignition
    }

    /// Fires at T-zero.
    pub fn burn_timer(&self) -> &OneShotTimer {
        &self.burn
    }

    pub fn mission_timer(&self) -> &Arc<MissionTimer> {
        &self.mission
    }
}
