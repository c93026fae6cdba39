//! Peripheral traits and HAL error type.
//!
//! Board drivers implement one trait per peripheral class. All traits take
//! `&self` and are `Send + Sync`: drivers own their interior locking so a
//! single handle can be shared between tasks.

use crate::hal::consts::{ADC_MAX_RAW, ADC_REF_MV};
use crate::mission::can::CanFrame;
use std::time::Duration;
use thiserror::Error;

/// Error types for peripheral operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HalError {
    /// GPIO read or write failed.
    #[error("GPIO error on pin {pin}: {reason}")]
    Gpio { pin: u8, reason: String },

    /// I2C transaction failed.
    #[error("I2C error at address {address:#04x}: {reason}")]
    I2c { address: u8, reason: String },

    /// ADC conversion failed.
    #[error("ADC error on channel {channel}: {reason}")]
    Adc { channel: u8, reason: String },

    /// PWM output could not be configured.
    #[error("PWM error on channel {channel}: {reason}")]
    Pwm { channel: u8, reason: String },

    /// CAN controller error.
    #[error("CAN bus error: {0}")]
    Can(String),

    /// Peripheral did not answer in time.
    #[error("Peripheral timeout: {0}")]
    Timeout(String),

    /// Board driver initialization failed.
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// No board driver registered under this name.
    #[error("Board driver not found: {0}")]
    DriverNotFound(String),
}

/// Digital I/O, including pins behind an I/O expander.
pub trait GpioPort: Send + Sync {
    /// Drive an output pin.
    fn set_level(&self, pin: u8, high: bool) -> Result<(), HalError>;

    /// Read back a pin level.
    fn level(&self, pin: u8) -> Result<bool, HalError>;
}

/// Register-oriented I2C bus.
pub trait I2cBus: Send + Sync {
    /// Write `bytes` to the device at `address`.
    fn write(&self, address: u8, bytes: &[u8]) -> Result<(), HalError>;

    /// Write `bytes` then read `buf.len()` bytes in one transaction.
    fn write_read(&self, address: u8, bytes: &[u8], buf: &mut [u8]) -> Result<(), HalError>;

    /// Read a register block starting at `register`.
    fn read_register(&self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), HalError> {
        self.write_read(address, &[register], buf)
    }
}

/// Single analog input channel.
pub trait AdcChannel: Send + Sync {
    /// Hardware channel number (diagnostics only).
    fn channel(&self) -> u8;

    /// Raw conversion result, `0..=ADC_MAX_RAW`.
    fn read_raw(&self) -> Result<u16, HalError>;

    /// Conversion result scaled to millivolts at the ADC pin.
    fn read_millivolts(&self) -> Result<u32, HalError> {
        let raw = self.read_raw()?.min(ADC_MAX_RAW) as u32;
        Ok(raw * ADC_REF_MV / ADC_MAX_RAW as u32)
    }
}

/// Servo-style PWM output.
pub trait PwmChannel: Send + Sync {
    /// Hardware channel number (diagnostics only).
    fn channel(&self) -> u8;

    /// Enable or disable the output stage.
    fn set_enabled(&self, enabled: bool) -> Result<(), HalError>;

    /// Set the high time of each period.
    fn set_pulse_width_us(&self, pulse_us: u16) -> Result<(), HalError>;
}

/// Classic CAN controller with 11-bit identifiers.
pub trait CanBus: Send + Sync {
    /// Queue a frame for transmission, waiting at most `timeout` for space.
    fn transmit(&self, frame: &CanFrame, timeout: Duration) -> Result<(), HalError>;

    /// Wait up to `timeout` for a frame. `Ok(None)` on timeout.
    fn receive(&self, timeout: Duration) -> Result<Option<CanFrame>, HalError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAdc(u16);

    impl AdcChannel for FixedAdc {
        fn channel(&self) -> u8 {
            0
        }

        fn read_raw(&self) -> Result<u16, HalError> {
            Ok(self.0)
        }
    }

    #[test]
    fn millivolts_scale_full_range() {
        assert_eq!(FixedAdc(0).read_millivolts().unwrap(), 0);
        assert_eq!(FixedAdc(ADC_MAX_RAW).read_millivolts().unwrap(), ADC_REF_MV);
        // Out-of-range raw values clamp to full scale.
        assert_eq!(FixedAdc(u16::MAX).read_millivolts().unwrap(), ADC_REF_MV);
    }

    #[test]
    fn hal_error_display() {
        let err = HalError::I2c {
            address: 0x48,
            reason: "nack".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("0x48"));
        assert!(msg.contains("nack"));
    }
}
