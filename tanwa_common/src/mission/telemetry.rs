//! Telemetry record types.
//!
//! [`TelemetryData`] is the aggregate held by the control unit's telemetry
//! store. Every field group is replaced as a whole; readers always get a
//! full copy.

use crate::consts::{IGNITER_COUNT, PRESSURE_CHANNELS, TEMPERATURE_CHANNELS};
use crate::mission::can::Submodule;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Valve position as last commanded or reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ValveState {
    Closed = 0,
    Open = 1,
    /// Not commanded yet or reported out of range.
    #[default]
    Unknown = 2,
}

impl ValveState {
    /// Decode a wire byte. Out-of-range values map to `Unknown`.
    #[inline]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Closed,
            1 => Self::Open,
            _ => Self::Unknown,
        }
    }

    /// Record field value.
    #[inline]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Igniter driver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum IgniterState {
    #[default]
    Disarmed = 0,
    Armed = 1,
    /// Fire pulse issued; only disarming leaves this state.
    Fired = 2,
}

impl IgniterState {
    /// Decode a record byte; `None` for anything but 0..=2.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Disarmed),
            1 => Some(Self::Armed),
            2 => Some(Self::Fired),
            _ => None,
        }
    }
}

bitflags! {
    /// Submodules heard from within the stale timeout.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SubmoduleLinks: u8 {
        const WEIGHT_ROCKET   = 1 << 0;
        const WEIGHT_OXIDIZER = 1 << 1;
        const FILL            = 1 << 2;
        const THERMAL         = 1 << 3;
        const DISCONNECT      = 1 << 4;
    }
}

impl SubmoduleLinks {
    /// Flag for a single submodule.
    #[inline]
    pub const fn of(submodule: Submodule) -> Self {
        Self::from_bits_truncate(1 << submodule as u8)
    }
}

// ─── Local Readings ─────────────────────────────────────────────────

/// Board-local analog and I2C readings.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalReadings {
    pub battery_v: f32,
    pub pressures_bar: [f32; PRESSURE_CHANNELS],
    pub temperatures_c: [f32; TEMPERATURE_CHANNELS],
    pub igniter_continuity: [bool; IGNITER_COUNT],
}

/// Actuator states as held by the drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActuatorReadings {
    pub fill_valve: ValveState,
    pub depr_valve: ValveState,
    pub fuel_valve: ValveState,
    pub oxidizer_valve: ValveState,
    pub igniters: [IgniterState; IGNITER_COUNT],
}

// ─── CAN Submodule Records ──────────────────────────────────────────

/// Weight cell STATUS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WeightStatus {
    pub status: u16,
    pub request: u8,
    pub tared: bool,
}

/// Weight cell DATA frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightData {
    pub weight_kg: f32,
    pub raw: i32,
}

/// Weight cell CALIBRATION frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightCalibration {
    pub cal_factor: f32,
    pub offset: f32,
}

/// Everything known about one weight cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeightRecord {
    pub status: WeightStatus,
    pub data: WeightData,
    pub calibration: WeightCalibration,
}

/// Fill controller STATUS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FillStatus {
    pub status: u16,
    pub request: u8,
    pub level_flags: u8,
}

/// Fill controller DATA frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FillData {
    pub line_pressure_bar: f32,
    pub tank_pressure_bar: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FillRecord {
    pub status: FillStatus,
    pub data: FillData,
}

/// Thermal controller STATUS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThermalStatus {
    pub status: u16,
    pub request: u8,
    pub heating: bool,
}

/// Thermal controller DATA frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThermalData {
    pub tank_temperature_c: f32,
    pub heater_temperature_c: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ThermalRecord {
    pub status: ThermalStatus,
    pub data: ThermalData,
}

/// Disconnect controller STATUS frame. The controller sends no DATA.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisconnectStatus {
    pub status: u16,
    pub request: u8,
    pub motor_state: u8,
    pub limit_switches: u8,
}

// ─── Link Readings ──────────────────────────────────────────────────

/// Reading reported by a short-range valve module.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValveModuleReading {
    pub valve_state: ValveState,
    pub pressure_bar: f32,
    pub temperature_c: f32,
}

/// Valve modules reached over the short-range radio.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkReadings {
    pub main_valve: ValveModuleReading,
    pub vent_valve: ValveModuleReading,
}

// ─── Aggregate ──────────────────────────────────────────────────────

/// Complete telemetry aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetryData {
    pub local: LocalReadings,
    pub actuators: ActuatorReadings,
    pub weight_rocket: WeightRecord,
    pub weight_oxidizer: WeightRecord,
    pub fill: FillRecord,
    pub thermal: ThermalRecord,
    pub disconnect: DisconnectStatus,
    pub link: LinkReadings,
    /// Last frame received from each submodule, by [`Submodule`] index.
    pub last_seen: [Option<Instant>; Submodule::COUNT],
}

impl TelemetryData {
    /// Submodules heard from within `stale_after` of `now`.
    pub fn links(&self, now: Instant, stale_after: Duration) -> SubmoduleLinks {
        Submodule::ALL
            .into_iter()
            .filter(|sub| {
                self.last_seen[*sub as usize]
                    .is_some_and(|seen| now.saturating_duration_since(seen) <= stale_after)
            })
            .fold(SubmoduleLinks::empty(), |acc, sub| acc | SubmoduleLinks::of(sub))
    }
}
