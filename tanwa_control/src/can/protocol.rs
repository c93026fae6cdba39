//! Submodule frame codec.
//!
//! Outbound commands are fixed `(id, dlc)` templates; commands with an
//! argument carry it little-endian in `data[0..4]`. Inbound responses are
//! decoded at fixed offsets into telemetry records, each applied to the
//! store with exactly one update.

use crate::can::queue::CanTxQueue;
use crate::error::{ProtocolError, TanwaError};
use crate::telemetry::store::{TelemetryStore, WeightCell};
use tanwa_common::mission::can::{
    CanFrame, FrameDirection, REMOTE_COMMAND_ID, REQUEST_SOFT_RESET, Submodule, command_offset,
    response_offset,
};
use tanwa_common::mission::telemetry::{
    DisconnectStatus, FillData, FillStatus, ThermalData, ThermalStatus, WeightCalibration,
    WeightData, WeightStatus,
};
use tracing::{debug, info, trace, warn};

// ─── Outbound ───────────────────────────────────────────────────────

/// Command addressed to a rocket submodule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CanCommand {
    SoftReset(Submodule),
    GetStatus(Submodule),
    GetData(Submodule),
    WeightTare(WeightCell),
    WeightSetCalFactor(WeightCell, f32),
    WeightSetOffset(WeightCell, f32),
    /// Reference mass in grams.
    WeightCalibrate(WeightCell, f32),
    HeatingStart,
    HeatingStop,
    /// Heating threshold in degrees Celsius.
    SetHeatingThreshold(f32),
    /// Run the quick-disconnect motor for this many milliseconds.
    Disconnect(u32),
}

impl CanCommand {
    /// Identifier and DLC of the frame template.
    pub const fn template(&self) -> (u16, u8) {
        match *self {
            Self::SoftReset(sub) => (sub.command_id(command_offset::SOFT_RESET), 0),
            Self::GetStatus(sub) => (sub.command_id(command_offset::GET_STATUS), 0),
            Self::GetData(sub) => (sub.command_id(command_offset::GET_DATA), 0),
            Self::WeightTare(cell) => (cell.submodule().command_id(command_offset::WEIGHT_TARE), 0),
            Self::WeightSetCalFactor(cell, _) => (
                cell.submodule()
                    .command_id(command_offset::WEIGHT_SET_CAL_FACTOR),
                4,
            ),
            Self::WeightSetOffset(cell, _) => (
                cell.submodule().command_id(command_offset::WEIGHT_SET_OFFSET),
                4,
            ),
            Self::WeightCalibrate(cell, _) => (
                cell.submodule().command_id(command_offset::WEIGHT_CALIBRATE),
                4,
            ),
            Self::HeatingStart => (
                Submodule::Thermal.command_id(command_offset::THERMAL_HEATING_START),
                0,
            ),
            Self::HeatingStop => (
                Submodule::Thermal.command_id(command_offset::THERMAL_HEATING_STOP),
                0,
            ),
            Self::SetHeatingThreshold(_) => (
                Submodule::Thermal.command_id(command_offset::THERMAL_SET_THRESHOLD),
                4,
            ),
            Self::Disconnect(_) => (
                Submodule::Disconnect.command_id(command_offset::DISCONNECT_RUN),
                4,
            ),
        }
    }

    #[inline]
    pub const fn id(&self) -> u16 {
        self.template().0
    }

    /// Frame ready for transmission.
    pub fn encode(&self) -> CanFrame {
        let (id, dlc) = self.template();
        let mut frame = CanFrame::new(id, dlc);
        let argument = match *self {
            Self::WeightSetCalFactor(_, v)
            | Self::WeightSetOffset(_, v)
            | Self::WeightCalibrate(_, v)
            | Self::SetHeatingThreshold(v) => Some(v.to_le_bytes()),
            Self::Disconnect(ms) => Some(ms.to_le_bytes()),
            _ => None,
        };
        if let Some(bytes) = argument {
            frame.data[..4].copy_from_slice(&bytes);
        }
        frame
    }
}

// ─── Inbound ────────────────────────────────────────────────────────

/// A frame this node understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decoded {
    WeightStatus(WeightCell, WeightStatus),
    WeightData(WeightCell, WeightData),
    WeightCalibration(WeightCell, WeightCalibration),
    FillStatus(FillStatus),
    FillData(FillData),
    ThermalStatus(ThermalStatus),
    ThermalData(ThermalData),
    DisconnectStatus(DisconnectStatus),
    /// Operator command relayed over the bus.
    RemoteCommand { command: u32, payload: i32 },
}

impl Decoded {
    /// Submodule asking to be soft reset, from its status `request` byte.
    pub fn soft_reset_request(&self) -> Option<Submodule> {
        let (submodule, request) = match self {
            Self::WeightStatus(cell, s) => (cell.submodule(), s.request),
            Self::FillStatus(s) => (Submodule::Fill, s.request),
            Self::ThermalStatus(s) => (Submodule::Thermal, s.request),
            Self::DisconnectStatus(s) => (Submodule::Disconnect, s.request),
            _ => return None,
        };
        (request == REQUEST_SOFT_RESET).then_some(submodule)
    }

    /// Write the record into the store.
    pub fn apply(&self, store: &TelemetryStore) -> Result<(), TanwaError> {
        match *self {
            Self::WeightStatus(cell, s) => store.set_weight_status(cell, s),
            Self::WeightData(cell, d) => store.set_weight_data(cell, d),
            Self::WeightCalibration(cell, c) => store.set_weight_calibration(cell, c),
            Self::FillStatus(s) => store.set_fill_status(s),
            Self::FillData(d) => store.set_fill_data(d),
            Self::ThermalStatus(s) => store.set_thermal_status(s),
            Self::ThermalData(d) => store.set_thermal_data(d),
            Self::DisconnectStatus(s) => store.set_disconnect_status(s),
            Self::RemoteCommand { .. } => Ok(()),
        }
    }
}

/// Bounds-checked field access reporting the frame layout on failure.
struct Fields<'a>(&'a CanFrame);

impl Fields<'_> {
    fn short(&self, need: usize) -> ProtocolError {
        ProtocolError::ShortFrame {
            id: self.0.id,
            dlc: self.0.dlc,
            need: need as u8,
        }
    }

    fn u8(&self, at: usize) -> Result<u8, ProtocolError> {
        self.0.u8_at(at).ok_or_else(|| self.short(at + 1))
    }

    fn u16(&self, at: usize) -> Result<u16, ProtocolError> {
        self.0.u16_at(at).ok_or_else(|| self.short(at + 2))
    }

    fn u32(&self, at: usize) -> Result<u32, ProtocolError> {
        self.0.u32_at(at).ok_or_else(|| self.short(at + 4))
    }

    fn i32(&self, at: usize) -> Result<i32, ProtocolError> {
        self.0.i32_at(at).ok_or_else(|| self.short(at + 4))
    }

    fn f32(&self, at: usize) -> Result<f32, ProtocolError> {
        self.0.f32_at(at).ok_or_else(|| self.short(at + 4))
    }
}

/// Decode an inbound frame.
pub fn decode(frame: &CanFrame) -> Result<Decoded, ProtocolError> {
    let f = Fields(frame);

    if frame.id == REMOTE_COMMAND_ID {
        return Ok(Decoded::RemoteCommand {
            command: f.u32(0)?,
            payload: f.i32(4)?,
        });
    }

    let Some((submodule, FrameDirection::Response, offset)) = Submodule::classify(frame.id) else {
        return Err(ProtocolError::UnknownId(frame.id));
    };

    let decoded = match (submodule, offset) {
        (Submodule::WeightRocket | Submodule::WeightOxidizer, _) => {
            let cell = WeightCell::from_submodule(submodule)
                .ok_or(ProtocolError::UnknownId(frame.id))?;
            match offset {
                response_offset::STATUS => Decoded::WeightStatus(
                    cell,
                    WeightStatus {
                        status: f.u16(0)?,
                        request: f.u8(2)?,
                        tared: f.u8(3)? != 0,
                    },
                ),
                response_offset::DATA => Decoded::WeightData(
                    cell,
                    WeightData {
                        weight_kg: f.f32(0)?,
                        raw: f.i32(4)?,
                    },
                ),
                response_offset::CALIBRATION => Decoded::WeightCalibration(
                    cell,
                    WeightCalibration {
                        cal_factor: f.f32(0)?,
                        offset: f.f32(4)?,
                    },
                ),
                _ => return Err(ProtocolError::UnknownId(frame.id)),
            }
        }
        (Submodule::Fill, response_offset::STATUS) => Decoded::FillStatus(FillStatus {
            status: f.u16(0)?,
            request: f.u8(2)?,
            level_flags: f.u8(3)?,
        }),
        (Submodule::Fill, response_offset::DATA) => Decoded::FillData(FillData {
            line_pressure_bar: f.f32(0)?,
            tank_pressure_bar: f.f32(4)?,
        }),
        (Submodule::Thermal, response_offset::STATUS) => Decoded::ThermalStatus(ThermalStatus {
            status: f.u16(0)?,
            request: f.u8(2)?,
            heating: f.u8(3)? != 0,
        }),
        (Submodule::Thermal, response_offset::DATA) => Decoded::ThermalData(ThermalData {
            tank_temperature_c: f.f32(0)?,
            heater_temperature_c: f.f32(4)?,
        }),
        (Submodule::Disconnect, response_offset::STATUS) => {
            Decoded::DisconnectStatus(DisconnectStatus {
                status: f.u16(0)?,
                request: f.u8(2)?,
                motor_state: f.u8(3)?,
                limit_switches: f.u8(4)?,
            })
        }
        _ => return Err(ProtocolError::UnknownId(frame.id)),
    };
    Ok(decoded)
}

/// Decode one received frame, update the store and answer soft-reset
/// requests. Returns a relayed remote command, if the frame carried one.
pub fn handle_frame(
    frame: &CanFrame,
    store: &TelemetryStore,
    tx: &CanTxQueue,
) -> Option<(u32, i32)> {
    let decoded = match decode(frame) {
        Ok(decoded) => decoded,
        Err(ProtocolError::UnknownId(id)) => {
            trace!(id, "frame ignored");
            return None;
        }
        Err(e) => {
            debug!("frame dropped: {e}");
            return None;
        }
    };

    if let Err(e) = decoded.apply(store) {
        warn!(id = frame.id, "store update failed: {e}");
    }

    if let Some(submodule) = decoded.soft_reset_request() {
        info!(submodule = submodule.name(), "submodule requested soft reset");
        tx.push(CanCommand::SoftReset(submodule).encode());
    }

    match decoded {
        Decoded::RemoteCommand { command, payload } => Some((command, payload)),
        _ => None,
    }
}
