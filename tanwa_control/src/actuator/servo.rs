//! Servo-driven main valve (fuel and oxidizer).

use super::{hal_err, lock_state};
use crate::error::ActuatorError;
use parking_lot::Mutex;
use std::sync::Arc;
use tanwa_common::hal::driver::PwmChannel;
use tanwa_common::mission::telemetry::ValveState;
use tracing::info;

pub struct ServoValve {
    name: &'static str,
    pwm: Arc<dyn PwmChannel>,
    open_us: u16,
    close_us: u16,
    state: Mutex<ValveState>,
}

impl ServoValve {
    /// Servo starting in `Unknown`; the first command drives it to a known position.
    pub fn new(name: &'static str, pwm: Arc<dyn PwmChannel>, open_us: u16, close_us: u16) -> Self {
        Self {
            name,
            pwm,
            open_us,
            close_us,
            state: Mutex::new(ValveState::Unknown),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Open. Fails if already open.
    pub fn open(&self) -> Result<(), ActuatorError> {
        self.drive(ValveState::Open, false)
    }

    /// Close. Fails if already closed.
    pub fn close(&self) -> Result<(), ActuatorError> {
        self.drive(ValveState::Closed, false)
    }

    /// Open, re-driving the output even if already open.
    pub fn force_open(&self) -> Result<(), ActuatorError> {
        self.drive(ValveState::Open, true)
    }

    /// Close, re-driving the output even if already closed.
    pub fn force_close(&self) -> Result<(), ActuatorError> {
        self.drive(ValveState::Closed, true)
    }

    /// Last commanded position; `Unknown` when the lock is contended.
    pub fn state(&self) -> ValveState {
        lock_state(self.name, &self.state)
            .map(|s| *s)
            .unwrap_or(ValveState::Unknown)
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
        let pulse = if target == ValveState::Open {
            self.open_us
        } else {
            self.close_us
        };
        self.pwm.set_enabled(true).map_err(hal_err(self.name))?;
        self.pwm
            .set_pulse_width_us(pulse)
            .map_err(hal_err(self.name))?;
        if *state != target {
            info!(valve = self.name, state = ?target, pulse_us = pulse, "servo moved");
        }
        *state = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanwa_hal::drivers::simulation::SimPwm;

    #[test]
    fn pulses_follow_state() {
        let pwm = Arc::new(SimPwm::new(0));
        let valve = ServoValve::new("fuel_valve", pwm.clone(), 2_000, 1_000);

        valve.open().unwrap();
        assert!(pwm.enabled());
        assert_eq!(pwm.pulse_us(), 2_000);
        assert!(valve.open().is_err());

        valve.close().unwrap();
        assert_eq!(pwm.pulse_us(), 1_000);
        valve.force_close().unwrap();
        assert_eq!(valve.state(), ValveState::Closed);
    }

    #[test]
    fn pwm_fault_reported() {
        let pwm = Arc::new(SimPwm::new(1));
        pwm.set_faulty(true);
        let valve = ServoValve::new("oxidizer_valve", pwm, 2_000, 1_000);
        assert!(matches!(
            valve.force_close(),
            Err(ActuatorError::Hal { actuator: "oxidizer_valve", .. })
        ));
        assert_eq!(valve.state(), ValveState::Unknown);
    }
}
