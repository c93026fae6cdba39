//! Cancellable one-shot timer.
//!
//! Each `start` spawns a short-lived thread that sleeps on a condition
//! variable until its deadline. A generation counter invalidates older
//! threads, so `stop` and re-`start` never let a stale expiry through.

use crate::error::TimerError;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Expiry action.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Slot {
    generation: u64,
    active: bool,
    period: Option<Duration>,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

/// Named one-shot timer running its callback on a timer thread.
pub struct OneShotTimer {
    name: &'static str,
    callback: TimerCallback,
    shared: Arc<Shared>,
}

impl OneShotTimer {
    /// Idle timer. Nothing runs until [`start`](Self::start).
    pub fn new(name: &'static str, callback: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            name,
            callback: Arc::new(callback),
            shared: Arc::new(Shared::default()),
        }
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Arm the timer, cancelling a pending expiry.
    pub fn start(&self, period: Duration) -> Result<(), TimerError> {
        let deadline = Instant::now()
            .checked_add(period)
            .ok_or(TimerError::PeriodOutOfRange {
                name: self.name,
                period_ms: period.as_millis(),
            })?;
        let generation = {
            let mut slot = self.shared.slot.lock();
            slot.generation = slot.generation.wrapping_add(1);
            slot.active = true;
            slot.period = Some(period);
            slot.generation
        };
        self.shared.wake.notify_all();

        let shared = Arc::clone(&self.shared);
        let callback = Arc::clone(&self.callback);
        let name = self.name;

        let spawned = thread::Builder::new()
            .name(format!("timer-{name}"))
            .spawn(move || {
                let mut slot = shared.slot.lock();
                loop {
                    if slot.generation != generation {
                        trace!(timer = name, "cancelled");
                        return;
                    }
                    if shared.wake.wait_until(&mut slot, deadline).timed_out() {
                        break;
                    }
                }
                if slot.generation != generation {
                    return;
                }
                slot.active = false;
                drop(slot);

                debug!(timer = name, "expired");
                callback();
            });

        if let Err(e) = spawned {
            let mut slot = self.shared.slot.lock();
            if slot.generation == generation {
                slot.active = false;
            }
            return Err(TimerError::SpawnFailed {
                name,
                reason: e.to_string(),
            });
        }

        debug!(timer = name, period_ms = period.as_millis() as u64, "started");
        Ok(())
    }

    /// Cancel a pending expiry. Idempotent.
    pub fn stop(&self) {
        let was_active = {
            let mut slot = self.shared.slot.lock();
            slot.generation = slot.generation.wrapping_add(1);
            std::mem::replace(&mut slot.active, false)
        };
        self.shared.wake.notify_all();
        if was_active {
            debug!(timer = self.name, "stopped");
        }
    }

    /// Whether an expiry is pending.
    pub fn is_active(&self) -> bool {
        self.shared.slot.lock().active
    }

    /// Period of the most recent `start`.
    pub fn period(&self) -> Option<Duration> {
        self.shared.slot.lock().period
    }
}

impl Drop for OneShotTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(name: &'static str) -> (OneShotTimer, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let timer = OneShotTimer::new(name, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (timer, hits)
    }

    #[test]
    fn fires_once_after_period() {
        let (timer, hits) = counting("fire");
        timer.start(Duration::from_millis(20)).unwrap();
        assert!(timer.is_active());
        thread::sleep(Duration::from_millis(150));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(!timer.is_active());
    }

    #[test]
    fn stop_cancels_expiry() {
        let (timer, hits) = counting("cancel");
        timer.start(Duration::from_millis(50)).unwrap();
        timer.stop();
        timer.stop();
        thread::sleep(Duration::from_millis(120));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(!timer.is_active());
    }

    #[test]
    fn unrepresentable_period_is_rejected() {
        let (timer, hits) = counting("huge");
        assert!(matches!(
            timer.start(Duration::MAX),
            Err(TimerError::PeriodOutOfRange { name: "huge", .. })
        ));
        assert!(!timer.is_active());
        assert_eq!(timer.period(), None);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn restart_supersedes_previous_start() {
        let (timer, hits) = counting("restart");
        timer.start(Duration::from_millis(30)).unwrap();
        timer.start(Duration::from_millis(300)).unwrap();
        thread::sleep(Duration::from_millis(120));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(timer.period(), Some(Duration::from_millis(300)));
        timer.stop();
    }
}
