//! Board peripheral bundle.
//!
//! A board driver hands the control unit one [`BoardPeripherals`] value at
//! startup. Components receive only the handles they need from it.

use crate::consts::{IGNITER_COUNT, PRESSURE_CHANNELS};
use crate::hal::driver::{AdcChannel, CanBus, GpioPort, HalError, I2cBus, PwmChannel};
use std::sync::Arc;

/// Analog inputs wired on the board.
#[derive(Clone)]
pub struct AdcChannels {
    /// Battery voltage divider.
    pub battery: Arc<dyn AdcChannel>,
    /// Pressure transducers (tank, line, combustion chamber, fill).
    pub pressures: [Arc<dyn AdcChannel>; PRESSURE_CHANNELS],
    /// Igniter continuity sense lines.
    pub igniter_continuity: [Arc<dyn AdcChannel>; IGNITER_COUNT],
}

/// All peripherals of one board.
#[derive(Clone)]
pub struct BoardPeripherals {
    /// Board driver name.
    pub name: &'static str,
    /// Digital I/O (igniters, solenoids, LED, buzzer).
    pub gpio: Arc<dyn GpioPort>,
    /// Sensor I2C bus.
    pub i2c: Arc<dyn I2cBus>,
    /// Analog inputs.
    pub adc: AdcChannels,
    /// Fuel and oxidizer servo outputs.
    pub servo_pwm: [Arc<dyn PwmChannel>; 2],
    /// Rocket CAN bus.
    pub can: Arc<dyn CanBus>,
}

/// Factory function type for creating a board.
pub type BoardFactory = fn() -> Result<BoardPeripherals, HalError>;
