//! Simulated GPIO port.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tanwa_common::hal::driver::{GpioPort, HalError};
use tracing::trace;

#[derive(Default)]
struct GpioState {
    levels: HashMap<u8, bool>,
    faulty: HashSet<u8>,
    writes: Vec<(u8, bool)>,
}

/// GPIO port remembering every write.
///
/// Pins marked with [`SimGpio::set_faulty`] fail on write, which lets tests
/// exercise actuator error paths.
#[derive(Default)]
pub struct SimGpio {
    state: Mutex<GpioState>,
}

impl SimGpio {
    /// All pins low, none faulty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `pin` fail (or succeed again).
    pub fn set_faulty(&self, pin: u8, faulty: bool) {
        let mut state = self.state.lock();
        if faulty {
            state.faulty.insert(pin);
        } else {
            state.faulty.remove(&pin);
        }
    }

    /// Current level of `pin`; unwritten pins read low.
    pub fn get(&self, pin: u8) -> bool {
        self.state.lock().levels.get(&pin).copied().unwrap_or(false)
    }

    /// Successful writes in order.
    pub fn writes(&self) -> Vec<(u8, bool)> {
        self.state.lock().writes.clone()
    }
}

impl GpioPort for SimGpio {
    fn set_level(&self, pin: u8, high: bool) -> Result<(), HalError> {
        let mut state = self.state.lock();
        if state.faulty.contains(&pin) {
            return Err(HalError::Gpio {
                pin,
                reason: "simulated fault".to_string(),
            });
        }
        trace!(pin, high, "sim gpio write");
        state.levels.insert(pin, high);
        state.writes.push((pin, high));
        Ok(())
    }

    fn level(&self, pin: u8) -> Result<bool, HalError> {
        Ok(self.get(pin))
    }
}
