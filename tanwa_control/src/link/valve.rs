//! Short-range valve module telemetry.
//!
//! `{device u8, valve_state u8, pressure_bar f32, temperature_c f32}`,
//! 10 bytes little-endian. Device 1 is the main valve, 2 the vent valve.

use crate::error::{ProtocolError, TanwaError};
use crate::telemetry::store::{TelemetryStore, ValveModule};
use tanwa_common::mission::telemetry::{ValveModuleReading, ValveState};

pub const VALVE_PAYLOAD_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValvePayload {
    pub module: ValveModule,
    pub reading: ValveModuleReading,
}

impl ValvePayload {
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let bytes: &[u8; VALVE_PAYLOAD_LEN] = bytes
            .try_into()
            .map_err(|_| ProtocolError::BadLength(bytes.len()))?;
        let module = match bytes[0] {
            1 => ValveModule::Main,
            2 => ValveModule::Vent,
            other => return Err(ProtocolError::UnknownDevice(other)),
        };
        let f32_at = |at: usize| {
            f32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Ok(Self {
            module,
            reading: ValveModuleReading {
                valve_state: ValveState::from_u8(bytes[1]),
                pressure_bar: f32_at(2),
                temperature_c: f32_at(6),
            },
        })
    }

    pub fn apply(&self, store: &TelemetryStore) -> Result<(), TanwaError> {
        store.set_valve_module(self.module, self.reading)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(device: u8, state: u8, bar: f32, celsius: f32) -> [u8; VALVE_PAYLOAD_LEN] {
        let mut out = [0u8; VALVE_PAYLOAD_LEN];
        out[0] = device;
        out[1] = state;
        out[2..6].copy_from_slice(&bar.to_le_bytes());
        out[6..10].copy_from_slice(&celsius.to_le_bytes());
        out
    }

    #[test]
    fn vent_payload_lands_in_store() {
        let store = TelemetryStore::new();
        ValvePayload::decode(&payload(2, 1, 4.5, -3.25))
            .unwrap()
            .apply(&store)
            .unwrap();
        let link = store.snapshot().unwrap().link;
        assert_eq!(link.vent_valve.valve_state, ValveState::Open);
        assert_eq!(link.vent_valve.pressure_bar, 4.5);
        assert_eq!(link.vent_valve.temperature_c, -3.25);
        assert_eq!(link.main_valve, ValveModuleReading::default());
    }

    #[test]
    fn rejects_unknown_device_and_bad_length() {
        assert_eq!(
            ValvePayload::decode(&payload(7, 0, 0.0, 0.0)),
            Err(ProtocolError::UnknownDevice(7))
        );
        assert_eq!(
            ValvePayload::decode(&[1, 0, 0]),
            Err(ProtocolError::BadLength(3))
        );
    }
}
