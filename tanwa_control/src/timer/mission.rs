//! Mission clock anchored to T-zero.
//!
//! Started with a T-minus offset, so [`MissionTimer::get_time`] reads
//! negative during the countdown, zero at T-zero and positive in flight.

use crate::error::TimerError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;
use tanwa_common::consts::MISSION_TIMER_READ_TIMEOUT;
use tracing::debug;

#[derive(Clone, Copy)]
struct Epoch {
    started: Instant,
    offset_ms: i64,
}

/// Mission time source shared by telemetry and the countdown.
pub struct MissionTimer {
    epoch: Mutex<Option<Epoch>>,
    disable_value: AtomicI64,
}

impl MissionTimer {
    /// Disabled timer reading `disable_value`.
    pub fn new(disable_value: i64) -> Self {
        Self {
            epoch: Mutex::new(None),
            disable_value: AtomicI64::new(disable_value),
        }
    }

    /// Start at `offset_ms` (must be `<= 0`). A positive offset disables the
    /// timer and fails.
    pub fn start(&self, offset_ms: i64) -> Result<(), TimerError> {
        let mut epoch = self.epoch.lock();
        if offset_ms > 0 {
            *epoch = None;
            return Err(TimerError::PositiveOffset(offset_ms));
        }
        *epoch = Some(Epoch {
            started: Instant::now(),
            offset_ms,
        });
        debug!(offset_ms, "mission timer started");
        Ok(())
    }

    /// Disable. Idempotent.
    pub fn stop(&self) {
        *self.epoch.lock() = None;
    }

    /// Milliseconds relative to T-zero, or the disable value when stopped
    /// or when the clock cannot be read within its budget.
    pub fn get_time(&self) -> i64 {
        let disabled = self.disable_value.load(Ordering::Relaxed);
        let Some(guard) = self.epoch.try_lock_for(MISSION_TIMER_READ_TIMEOUT) else {
            return disabled;
        };
        match *guard {
            Some(Epoch { started, offset_ms }) => {
                let elapsed = i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX);
                offset_ms.saturating_add(elapsed)
            }
            None => disabled,
        }
    }

    /// Whether the clock has been started.
    pub fn is_enabled(&self) -> bool {
        self.epoch.lock().is_some()
    }

    /// Value reported while the clock is stopped.
    pub fn set_disable_value(&self, value: i64) {
        self.disable_value.store(value, Ordering::Relaxed);
    }

    pub fn disable_value(&self) -> i64 {
        self.disable_value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    const DISABLED: i64 = -1;

    #[test]
    fn positive_offset_fails_and_disables() {
        let timer = MissionTimer::new(DISABLED);
        timer.start(-1_000).unwrap();
        assert_eq!(timer.start(5), Err(TimerError::PositiveOffset(5)));
        assert!(!timer.is_enabled());
        assert_eq!(timer.get_time(), DISABLED);
    }

    #[test]
    fn starts_near_offset_and_increases() {
        let timer = MissionTimer::new(DISABLED);
        timer.start(-50_000).unwrap();
        let first = timer.get_time();
        assert!((-50_000..-49_900).contains(&first), "first = {first}");
        thread::sleep(Duration::from_millis(30));
        let second = timer.get_time();
        assert!(second > first);
    }

    #[test]
    fn stop_is_idempotent_and_sentinel_is_settable() {
        let timer = MissionTimer::new(DISABLED);
        timer.stop();
        timer.start(0).unwrap();
        timer.stop();
        timer.stop();
        timer.set_disable_value(i64::MIN);
        assert_eq!(timer.get_time(), i64::MIN);
    }
}
