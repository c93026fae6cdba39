//! Solenoid valve driver (fill and depressurization lines).
//!
//! Normally closed valve on a single GPIO. A timed open arms a one-shot
//! timer that closes the valve again; any explicit open or close cancels it.

use super::{hal_err, lock_state};
use crate::error::ActuatorError;
use crate::timer::OneShotTimer;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tanwa_common::hal::driver::GpioPort;
use tanwa_common::mission::telemetry::ValveState;
use tracing::{error, info};

pub struct SolenoidValve {
    name: &'static str,
    gpio: Arc<dyn GpioPort>,
    pin: u8,
    state: Mutex<ValveState>,
    close_timer: OneShotTimer,
}

impl SolenoidValve {
    pub fn new(name: &'static str, gpio: Arc<dyn GpioPort>, pin: u8) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<Self>| {
            let me = me.clone();
            Self {
                name,
                gpio,
                pin,
                state: Mutex::new(ValveState::Unknown),
                close_timer: OneShotTimer::new(name, move || {
                    if let Some(valve) = me.upgrade() {
                        if let Err(e) = valve.drive(ValveState::Closed, true) {
                            error!(valve = valve.name, "timed close failed: {e}");
                        }
                    }
                }),
            }
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Open. Fails if already open.
    pub fn open(&self) -> Result<(), ActuatorError> {
        self.close_timer.stop();
        self.drive(ValveState::Open, false)
    }

    /// Close. Fails if already closed.
    pub fn close(&self) -> Result<(), ActuatorError> {
        self.close_timer.stop();
        self.drive(ValveState::Closed, false)
    }

    /// Open now and close after `duration`.
    pub fn open_timed(&self, duration: Duration) -> Result<(), ActuatorError> {
        if duration.is_zero() {
            return Err(ActuatorError::InvalidArgument(format!(
                "{}: zero open duration",
                self.name
            )));
        }
        self.close_timer.stop();
        self.drive(ValveState::Open, true)?;
        self.close_timer.start(duration).map_err(|e| {
            ActuatorError::InvalidArgument(format!("{}: close timer: {e}", self.name))
        })
    }

    /// Open regardless of state.
    pub fn force_open(&self) -> Result<(), ActuatorError> {
        self.close_timer.stop();
        self.drive(ValveState::Open, true)
    }

    /// Close regardless of state.
    pub fn force_close(&self) -> Result<(), ActuatorError> {
        self.close_timer.stop();
        self.drive(ValveState::Closed, true)
    }

    /// Last commanded position; `Unknown` when the lock is contended.
    pub fn state(&self) -> ValveState {
        lock_state(self.name, &self.state)
            .map(|s| *s)
            .unwrap_or(ValveState::Unknown)
    }

    /// Whether a timed open is pending its close.
    pub fn is_timed_open(&self) -> bool {
        self.close_timer.is_active()
    }

    fn drive(&self, target: ValveState, force: bool) -> Result<(), ActuatorError> {
        let mut state = lock_state(self.name, &self.state)?;
        if !force && *state == target {
            return Err(ActuatorError::InvalidState {
                actuator: self.name,
                operation: if target == ValveState::Open { "open" } else { "close" },
                state: if target == ValveState::Open { "open" } else { "closed" },
            });
        }
        self.gpio
            .set_level(self.pin, target == ValveState::Open)
            .map_err(hal_err(self.name))?;
        if *state != target {
            info!(valve = self.name, state = ?target, "valve moved");
        }
        *state = target;
        Ok(())
    }
}
