//! Mission state identifiers.
//!
//! Ids are contiguous from zero so they double as state table indices.
//! Ordering matters: "next state" transitions advance by exactly one id and
//! the flight window is expressed as an id range.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Launch campaign state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[repr(u8)]
pub enum MissionState {
    /// Boot, peripherals coming up.
    #[default]
    Init = 0,
    /// Safe, valves closed, nothing armed.
    Idle = 1,
    /// Oxidizer fill in progress.
    Fueling = 2,
    /// Fueling done, igniters may be armed.
    ArmedToLaunch = 3,
    /// Ready for countdown; disconnect timer running.
    RdyToLaunch = 4,
    /// T-minus countdown, ignition timers running.
    Countdown = 5,
    /// Engine burning.
    Fire = 6,
    /// Burn finished.
    AfterBurnout = 7,
    /// Operator hold.
    Hold = 8,
    /// Safed. Never left automatically.
    Abort = 9,
}

impl MissionState {
    /// Number of states in the mission table.
    pub const COUNT: usize = 10;

    /// All states in id order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Init,
        Self::Idle,
        Self::Fueling,
        Self::ArmedToLaunch,
        Self::RdyToLaunch,
        Self::Countdown,
        Self::Fire,
        Self::AfterBurnout,
        Self::Hold,
        Self::Abort,
    ];

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Init),
            1 => Some(Self::Idle),
            2 => Some(Self::Fueling),
            3 => Some(Self::ArmedToLaunch),
            4 => Some(Self::RdyToLaunch),
            5 => Some(Self::Countdown),
            6 => Some(Self::Fire),
            7 => Some(Self::AfterBurnout),
            8 => Some(Self::Hold),
            9 => Some(Self::Abort),
            _ => None,
        }
    }

    /// Convert from a state table index.
    #[inline]
    pub fn from_id(id: usize) -> Option<Self> {
        u8::try_from(id).ok().and_then(Self::from_u8)
    }

    /// State table index.
    #[inline]
    pub const fn id(self) -> usize {
        self as usize
    }

    /// Committed flight: strictly after `Countdown` and strictly before `Hold`.
    #[inline]
    pub const fn is_flight_window(self) -> bool {
        (self as u8) > (Self::Countdown as u8) && (self as u8) < (Self::Hold as u8)
    }

    /// Upper-case name used in logs and persisted records.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Idle => "IDLE",
            Self::Fueling => "FUELING",
            Self::ArmedToLaunch => "ARMED_TO_LAUNCH",
            Self::RdyToLaunch => "RDY_TO_LAUNCH",
            Self::Countdown => "COUNTDOWN",
            Self::Fire => "FIRE",
            Self::AfterBurnout => "AFTER_BURNOUT",
            Self::Hold => "HOLD",
            Self::Abort => "ABORT",
        }
    }
}

impl fmt::Display for MissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
