//! Simulation board.
//!
//! Software peripherals with injectable values and faults. Tests keep a
//! [`SimulationBoard`] to drive inputs and inspect outputs while the control
//! unit talks to the same objects through the trait handles of
//! [`BoardPeripherals`].

mod adc;
mod can;
mod gpio;
mod i2c;
mod pwm;

pub use adc::SimAdc;
pub use can::SimCanBus;
pub use gpio::SimGpio;
pub use i2c::SimI2c;
pub use pwm::SimPwm;

use std::sync::Arc;
use tanwa_common::consts::{IGNITER_COUNT, PRESSURE_CHANNELS};
use tanwa_common::hal::board::{AdcChannels, BoardPeripherals};
use tanwa_common::hal::consts::{ADC_MAX_RAW, TMP1075_ADDR_1, TMP1075_ADDR_2};
use tanwa_common::hal::driver::{AdcChannel, HalError, PwmChannel};

/// Board name used in the driver registry.
pub const SIMULATION_BOARD: &str = "simulation";

/// Concrete handles of a simulated board.
#[derive(Clone)]
pub struct SimulationBoard {
    /// Digital I/O.
    pub gpio: Arc<SimGpio>,
    /// I2C bus with two TMP1075 sensors.
    pub i2c: Arc<SimI2c>,
    /// Battery divider input.
    pub battery: Arc<SimAdc>,
    /// Pressure transducer inputs.
    pub pressures: [Arc<SimAdc>; PRESSURE_CHANNELS],
    /// Igniter continuity inputs.
    pub igniter_continuity: [Arc<SimAdc>; IGNITER_COUNT],
    /// Fuel and oxidizer servo outputs.
    pub servos: [Arc<SimPwm>; 2],
    /// CAN bus.
    pub can: Arc<SimCanBus>,
}

impl SimulationBoard {
    /// Board at rest: sensors at room temperature, igniters connected,
    /// pressures at zero.
    pub fn new() -> Self {
        let i2c = SimI2c::new();
        i2c.attach_tmp1075(TMP1075_ADDR_1, 21.5);
        i2c.attach_tmp1075(TMP1075_ADDR_2, 21.5);

        Self {
            gpio: Arc::new(SimGpio::new()),
            i2c: Arc::new(i2c),
            battery: Arc::new(SimAdc::new(0, ADC_MAX_RAW / 2)),
            pressures: std::array::from_fn(|i| Arc::new(SimAdc::new(1 + i as u8, 0))),
            igniter_continuity: std::array::from_fn(|i| {
                Arc::new(SimAdc::new(5 + i as u8, ADC_MAX_RAW))
            }),
            servos: std::array::from_fn(|i| Arc::new(SimPwm::new(i as u8))),
            can: Arc::new(SimCanBus::new()),
        }
    }

    /// Trait-object view handed to the control unit.
    pub fn peripherals(&self) -> BoardPeripherals {
        BoardPeripherals {
            name: SIMULATION_BOARD,
            gpio: self.gpio.clone(),
            i2c: self.i2c.clone(),
            adc: AdcChannels {
                battery: self.battery.clone(),
                pressures: self
                    .pressures
                    .clone()
                    .map(|adc| adc as Arc<dyn AdcChannel>),
                igniter_continuity: self
                    .igniter_continuity
                    .clone()
                    .map(|adc| adc as Arc<dyn AdcChannel>),
            },
            servo_pwm: self.servos.clone().map(|pwm| pwm as Arc<dyn PwmChannel>),
            can: self.can.clone(),
        }
    }
}

impl Default for SimulationBoard {
    fn default() -> Self {
        Self::new()
    }
}

/// Factory registered under [`SIMULATION_BOARD`].
pub fn create_board() -> Result<BoardPeripherals, HalError> {
    Ok(SimulationBoard::new().peripherals())
}
