//! Simulated ADC channel.

use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use tanwa_common::hal::driver::{AdcChannel, HalError};

/// ADC channel returning a settable raw value.
pub struct SimAdc {
    channel: u8,
    raw: AtomicU16,
    faulty: AtomicBool,
}

impl SimAdc {
    /// Channel reading `raw` until changed.
    pub fn new(channel: u8, raw: u16) -> Self {
        Self {
            channel,
            raw: AtomicU16::new(raw),
            faulty: AtomicBool::new(false),
        }
    }

    /// Set the next conversion result.
    pub fn set_raw(&self, raw: u16) {
        self.raw.store(raw, Ordering::Relaxed);
    }

    /// Make conversions fail.
    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.store(faulty, Ordering::Relaxed);
    }
}

impl AdcChannel for SimAdc {
    fn channel(&self) -> u8 {
        self.channel
    }

    fn read_raw(&self) -> Result<u16, HalError> {
        if self.faulty.load(Ordering::Relaxed) {
            return Err(HalError::Adc {
                channel: self.channel,
                reason: "simulated fault".to_string(),
            });
        }
        Ok(self.raw.load(Ordering::Relaxed))
    }
}
