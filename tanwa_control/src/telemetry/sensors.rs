//! Board-local sensor sampling.
//!
//! Battery and pressure transducers on the ADC, two TMP1075 on I2C and the
//! igniter continuity lines. A failed channel reads NaN (or "no continuity")
//! and is logged; the rest of the sample is still produced.

use crate::config::TelemetryConfig;
use std::sync::Arc;
use tanwa_common::consts::TEMPERATURE_CHANNELS;
use tanwa_common::hal::board::AdcChannels;
use tanwa_common::hal::consts::{TMP1075_ADDR_1, TMP1075_ADDR_2, TMP1075_LSB_C, TMP1075_TEMP_REG};
use tanwa_common::hal::driver::{HalError, I2cBus};
use tanwa_common::mission::telemetry::LocalReadings;
use tracing::debug;

const TEMPERATURE_ADDRESSES: [u8; TEMPERATURE_CHANNELS] = [TMP1075_ADDR_1, TMP1075_ADDR_2];

/// Linear conversion parameters.
#[derive(Debug, Clone, Copy)]
pub struct SensorScaling {
    pub battery_divider: f32,
    pub pressure_scale_bar_per_mv: f32,
    pub pressure_offset_bar: f32,
    pub continuity_threshold_mv: u32,
}

impl From<&TelemetryConfig> for SensorScaling {
    fn from(config: &TelemetryConfig) -> Self {
        Self {
            battery_divider: config.battery_divider,
            pressure_scale_bar_per_mv: config.pressure_scale_bar_per_mv,
            pressure_offset_bar: config.pressure_offset_bar,
            continuity_threshold_mv: config.continuity_threshold_mv,
        }
    }
}

pub struct LocalSensors {
    adc: AdcChannels,
    i2c: Arc<dyn I2cBus>,
    scaling: SensorScaling,
}

impl LocalSensors {
    pub fn new(adc: AdcChannels, i2c: Arc<dyn I2cBus>, scaling: SensorScaling) -> Self {
        Self { adc, i2c, scaling }
    }

    /// Read every local channel once.
    pub fn sample(&self) -> LocalReadings {
        let s = &self.scaling;

        let battery_v = or_nan(
            "battery",
            self.adc
                .battery
                .read_millivolts()
                .map(|mv| mv as f32 / 1000.0 * s.battery_divider),
        );

        let pressures_bar = std::array::from_fn(|i| {
            or_nan(
                "pressure",
                self.adc.pressures[i]
                    .read_millivolts()
                    .map(|mv| mv as f32 * s.pressure_scale_bar_per_mv + s.pressure_offset_bar),
            )
        });

        let temperatures_c = TEMPERATURE_ADDRESSES.map(|address| {
            or_nan("temperature", read_tmp1075(self.i2c.as_ref(), address))
        });

        let igniter_continuity = std::array::from_fn(|i| {
            match self.adc.igniter_continuity[i].read_millivolts() {
                Ok(mv) => mv >= s.continuity_threshold_mv,
                Err(e) => {
                    debug!("continuity read failed: {e}");
                    false
                }
            }
        });

        LocalReadings {
            battery_v,
            pressures_bar,
            temperatures_c,
            igniter_continuity,
        }
    }
}

/// Read a TMP1075 result register in degrees Celsius.
pub fn read_tmp1075(bus: &dyn I2cBus, address: u8) -> Result<f32, HalError> {
    let mut buf = [0u8; 2];
    bus.read_register(address, TMP1075_TEMP_REG, &mut buf)?;
    let counts = i16::from_be_bytes(buf) >> 4;
    Ok(counts as f32 * TMP1075_LSB_C)
}

fn or_nan(channel: &'static str, reading: Result<f32, HalError>) -> f32 {
    reading.unwrap_or_else(|e| {
        debug!(channel, "sensor read failed: {e}");
        f32::NAN
    })
}
