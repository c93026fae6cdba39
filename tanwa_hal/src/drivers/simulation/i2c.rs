//! Simulated I2C bus with TMP1075 temperature sensors.
//!
//! The TMP1075 temperature register holds a 12-bit two's complement value,
//! left aligned in two big-endian bytes, 0.0625 °C per LSB.

use parking_lot::Mutex;
use std::collections::HashMap;
use tanwa_common::hal::consts::{TMP1075_LSB_C, TMP1075_TEMP_REG};
use tanwa_common::hal::driver::{HalError, I2cBus};

/// I2C bus hosting simulated TMP1075 devices.
#[derive(Default)]
pub struct SimI2c {
    sensors: Mutex<HashMap<u8, f32>>,
}

impl SimI2c {
    /// Empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or re-attach) a sensor at `address` reading `celsius`.
    pub fn attach_tmp1075(&self, address: u8, celsius: f32) {
        self.sensors.lock().insert(address, celsius);
    }

    /// Remove a device; further transactions to it NACK.
    pub fn detach(&self, address: u8) {
        self.sensors.lock().remove(&address);
    }

    /// Change a sensor temperature.
    pub fn set_temperature(&self, address: u8, celsius: f32) {
        if let Some(value) = self.sensors.lock().get_mut(&address) {
            *value = celsius;
        }
    }

    fn nack(address: u8) -> HalError {
        HalError::I2c {
            address,
            reason: "no acknowledge".to_string(),
        }
    }
}

/// Encode a temperature the way the TMP1075 result register holds it.
fn encode_tmp1075(celsius: f32) -> [u8; 2] {
    let counts = (celsius / TMP1075_LSB_C).round().clamp(-2048.0, 2047.0) as i16;
    (counts << 4).to_be_bytes()
}

impl I2cBus for SimI2c {
    fn write(&self, address: u8, _bytes: &[u8]) -> Result<(), HalError> {
        if self.sensors.lock().contains_key(&address) {
            Ok(())
        } else {
            Err(Self::nack(address))
        }
    }

    fn write_read(&self, address: u8, bytes: &[u8], buf: &mut [u8]) -> Result<(), HalError> {
        let celsius = *self
            .sensors
            .lock()
            .get(&address)
            .ok_or_else(|| Self::nack(address))?;

        if bytes.first() != Some(&TMP1075_TEMP_REG) {
            buf.fill(0);
            return Ok(());
        }
        for (dst, src) in buf.iter_mut().zip(encode_tmp1075(celsius)) {
            *dst = src;
        }
        Ok(())
    }
}
