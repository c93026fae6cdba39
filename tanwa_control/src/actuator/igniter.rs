//! Igniter driver.
//!
//! Two outputs per igniter: the arming relay and the firing MOSFET. The fire
//! output is only driven from `Armed`; disarming is always allowed and drops
//! both outputs. The last committed state is mirrored in an atomic so
//! readings never wait on an in-flight transition.

use super::{hal_err, lock_state};
use crate::error::ActuatorError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tanwa_common::hal::driver::{AdcChannel, GpioPort};
use tanwa_common::mission::telemetry::IgniterState;
use tracing::{info, warn};

/// Pin assignment of one igniter.
#[derive(Debug, Clone, Copy)]
pub struct IgniterPins {
    pub arm: u8,
    pub fire: u8,
}

pub struct Igniter {
    name: &'static str,
    gpio: Arc<dyn GpioPort>,
    pins: IgniterPins,
    continuity: Arc<dyn AdcChannel>,
    continuity_threshold_mv: u32,
    state: Mutex<IgniterState>,
    last: AtomicU8,
}

impl Igniter {
    /// Igniter starting `Disarmed`. Pins are not touched until the first command.
    pub fn new(
        name: &'static str,
        gpio: Arc<dyn GpioPort>,
        pins: IgniterPins,
        continuity: Arc<dyn AdcChannel>,
        continuity_threshold_mv: u32,
    ) -> Self {
        Self {
            name,
            gpio,
            pins,
            continuity,
            continuity_threshold_mv,
            state: Mutex::new(IgniterState::Disarmed),
            last: AtomicU8::new(IgniterState::Disarmed as u8),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Close the arming relay. Arming an armed igniter is a no-op.
    pub fn arm(&self) -> Result<(), ActuatorError> {
        let mut state = lock_state(self.name, &self.state)?;
        match *state {
            IgniterState::Armed => Ok(()),
            IgniterState::Fired => Err(self.invalid("arm", "fired")),
            IgniterState::Disarmed => {
                self.gpio
                    .set_level(self.pins.arm, true)
                    .map_err(hal_err(self.name))?;
                self.commit(&mut state, IgniterState::Armed);
                info!(igniter = self.name, "armed");
                Ok(())
            }
        }
    }

    /// Drive the fire output. Requires `Armed`.
    pub fn fire(&self) -> Result<(), ActuatorError> {
        let mut state = lock_state(self.name, &self.state)?;
        match *state {
            IgniterState::Disarmed => Err(self.invalid("fire", "disarmed")),
            IgniterState::Fired => Err(self.invalid("fire", "fired")),
            IgniterState::Armed => {
                self.gpio
                    .set_level(self.pins.fire, true)
                    .map_err(hal_err(self.name))?;
                self.commit(&mut state, IgniterState::Fired);
                info!(igniter = self.name, "fired");
                Ok(())
            }
        }
    }

    /// Drop both outputs from any state. Both pins are attempted even if the
    /// first write fails.
    pub fn disarm(&self) -> Result<(), ActuatorError> {
        let mut state = lock_state(self.name, &self.state)?;
        let fire = self.gpio.set_level(self.pins.fire, false);
        let arm = self.gpio.set_level(self.pins.arm, false);
        match fire.and(arm) {
            Ok(()) => {
                if *state != IgniterState::Disarmed {
                    info!(igniter = self.name, "disarmed");
                }
                self.commit(&mut state, IgniterState::Disarmed);
                Ok(())
            }
            Err(e) => {
                warn!(igniter = self.name, "disarm incomplete: {e}");
                Err(hal_err(self.name)(e))
            }
        }
    }

    /// Bridge wire present.
    pub fn has_continuity(&self) -> Result<bool, ActuatorError> {
        let mv = self.continuity.read_millivolts().map_err(hal_err(self.name))?;
        Ok(mv >= self.continuity_threshold_mv)
    }

    /// Last committed state. Does not block on a transition in progress.
    pub fn state(&self) -> IgniterState {
        // Only valid discriminants are ever stored.
        IgniterState::from_u8(self.last.load(Ordering::Acquire)).unwrap_or(IgniterState::Armed)
    }

    fn commit(&self, state: &mut IgniterState, new: IgniterState) {
        *state = new;
        self.last.store(new as u8, Ordering::Release);
    }

    fn invalid(&self, operation: &'static str, state: &'static str) -> ActuatorError {
        ActuatorError::InvalidState {
            actuator: self.name,
            operation,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tanwa_common::hal::consts::ADC_MAX_RAW;
    use tanwa_hal::drivers::simulation::{SimAdc, SimGpio};

    const PINS: IgniterPins = IgniterPins { arm: 4, fire: 5 };

    fn igniter() -> (Igniter, Arc<SimGpio>, Arc<SimAdc>) {
        let gpio = Arc::new(SimGpio::new());
        let adc = Arc::new(SimAdc::new(5, ADC_MAX_RAW));
        let igniter = Igniter::new("igniter_1", gpio.clone(), PINS, adc.clone(), 1_000);
        (igniter, gpio, adc)
    }

    #[test]
    fn fire_requires_arm() {
        let (igniter, gpio, _) = igniter();
        assert!(matches!(
            igniter.fire(),
            Err(ActuatorError::InvalidState { operation: "fire", .. })
        ));
        assert!(!gpio.get(PINS.fire));

        igniter.arm().unwrap();
        igniter.arm().unwrap();
        igniter.fire().unwrap();
        assert_eq!(igniter.state(), IgniterState::Fired);
        assert!(gpio.get(PINS.arm));
        assert!(gpio.get(PINS.fire));
        assert!(igniter.arm().is_err());
    }

    #[test]
    fn disarm_from_any_state() {
        let (igniter, gpio, _) = igniter();
        igniter.disarm().unwrap();
        igniter.arm().unwrap();
        igniter.fire().unwrap();
        igniter.disarm().unwrap();
        assert_eq!(igniter.state(), IgniterState::Disarmed);
        assert!(!gpio.get(PINS.arm));
        assert!(!gpio.get(PINS.fire));
    }

    #[test]
    fn disarm_attempts_arm_pin_after_fire_pin_fault() {
        let (igniter, gpio, _) = igniter();
        igniter.arm().unwrap();
        gpio.set_faulty(PINS.fire, true);
        assert!(igniter.disarm().is_err());
        assert!(!gpio.get(PINS.arm));
        assert_eq!(igniter.state(), IgniterState::Armed);
    }

    #[test]
    fn state_reads_through_held_lock() {
        let (igniter, _, _) = igniter();
        igniter.arm().unwrap();
        let guard = igniter.state.lock();
        assert_eq!(igniter.state(), IgniterState::Armed);
        drop(guard);

        igniter.fire().unwrap();
        let _guard = igniter.state.lock();
        assert_eq!(igniter.state(), IgniterState::Fired);
        assert!(matches!(
            igniter.disarm(),
            Err(ActuatorError::LockTimeout("igniter_1"))
        ));
        assert_eq!(igniter.state(), IgniterState::Fired);
    }

    #[test]
    fn continuity_threshold() {
        let (igniter, _, adc) = igniter();
        assert!(igniter.has_continuity().unwrap());
        adc.set_raw(0);
        assert!(!igniter.has_continuity().unwrap());
    }
}
