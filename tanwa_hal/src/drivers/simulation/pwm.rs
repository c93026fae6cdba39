//! Simulated servo PWM output.

use parking_lot::Mutex;
use tanwa_common::hal::driver::{HalError, PwmChannel};

#[derive(Default, Clone, Copy)]
struct PwmState {
    enabled: bool,
    pulse_us: u16,
    faulty: bool,
}

/// PWM output recording its last setting.
pub struct SimPwm {
    channel: u8,
    state: Mutex<PwmState>,
}

impl SimPwm {
    /// Disabled output with zero pulse width.
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            state: Mutex::new(PwmState::default()),
        }
    }

    /// Whether the output stage is enabled.
    pub fn enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Last pulse width written.
    pub fn pulse_us(&self) -> u16 {
        self.state.lock().pulse_us
    }

    /// Make every call fail.
    pub fn set_faulty(&self, faulty: bool) {
        self.state.lock().faulty = faulty;
    }

    fn check(&self, state: &PwmState) -> Result<(), HalError> {
        if state.faulty {
            Err(HalError::Pwm {
                channel: self.channel,
                reason: "simulated fault".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

impl PwmChannel for SimPwm {
    fn channel(&self) -> u8 {
        self.channel
    }

    fn set_enabled(&self, enabled: bool) -> Result<(), HalError> {
        let mut state = self.state.lock();
        self.check(&state)?;
        state.enabled = enabled;
        Ok(())
    }

    fn set_pulse_width_us(&self, pulse_us: u16) -> Result<(), HalError> {
        let mut state = self.state.lock();
        self.check(&state)?;
        state.pulse_us = pulse_us;
        Ok(())
    }
}
