//! Remote command identifiers and device addressing.
//!
//! A remote command carries `{command: u32, payload: i32}` and is addressed
//! by a logical device id. Bit [`SUDO_BIT`] of the id grants privileged
//! commands.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Privilege bit of a logical device id.
pub const SUDO_BIT: u32 = 0x80;

/// Fleet-wide broadcast id.
pub const BROADCAST_ID: u32 = 0x00;

/// Fleet-wide privileged broadcast id.
pub const ALL_SUDO_ID: u32 = BROADCAST_ID | SUDO_BIT;

/// Default logical id of this node.
pub const DEFAULT_DEVICE_ID: u32 = 0x05;

/// Channel a command arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Long-range radio link.
    Radio,
    /// Rocket CAN bus.
    Can,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radio => f.write_str("radio"),
            Self::Can => f.write_str("can"),
        }
    }
}

/// How a device id relates to this node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Addressing {
    /// Addressed to this node.
    Direct,
    /// Addressed to this node with the privilege bit.
    DirectSudo,
    /// Fleet-wide.
    Broadcast,
    /// Fleet-wide with the privilege bit.
    BroadcastSudo,
    /// Someone else's command.
    Foreign,
}

impl Addressing {
    /// Classify `device_id` against `own_id` (privilege bit ignored in `own_id`).
    pub const fn classify(own_id: u32, device_id: u32) -> Self {
        let own = own_id & !SUDO_BIT;
        let sudo = device_id & SUDO_BIT != 0;
        let target = device_id & !SUDO_BIT;
        match (target == own, target == BROADCAST_ID, sudo) {
            (true, _, false) => Self::Direct,
            (true, _, true) => Self::DirectSudo,
            (false, true, false) => Self::Broadcast,
            (false, true, true) => Self::BroadcastSudo,
            _ => Self::Foreign,
        }
    }

    /// Whether the command should be handled at all.
    #[inline]
    pub const fn is_addressed(self) -> bool {
        !matches!(self, Self::Foreign)
    }

    /// Whether privileged commands are allowed.
    #[inline]
    pub const fn is_sudo(self) -> bool {
        matches!(self, Self::DirectSudo | Self::BroadcastSudo)
    }
}

/// Closed set of remote commands. Numbering is part of the wire protocol.
///
/// Payload meaning per command:
/// - timed valve commands: open duration in milliseconds
/// - igniter commands: `0` both igniters, `1`/`2` a single igniter
/// - `SoftResetSubmodule`: submodule index
/// - weight calibrate: reference mass in grams; weight offset: raw offset
/// - `SetHeatingThreshold`: cut-off temperature in hundredths of °C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u32)]
pub enum RemoteCommand {
    StateChange = 0,
    Abort = 1,
    HoldIn = 2,
    HoldOut = 3,
    FillOpen = 4,
    FillClose = 5,
    FillOpenTimed = 6,
    DeprOpen = 7,
    DeprClose = 8,
    DeprOpenTimed = 9,
    FuelValveOpen = 10,
    FuelValveClose = 11,
    OxidizerValveOpen = 12,
    OxidizerValveClose = 13,
    IgniterArm = 14,
    IgniterDisarm = 15,
    IgniterFire = 16,
    SoftResetSubmodule = 17,
    ResetAllSubmodules = 18,
    RocketWeightTare = 19,
    RocketWeightCalibrate = 20,
    RocketWeightSetOffset = 21,
    OxidizerWeightTare = 22,
    OxidizerWeightCalibrate = 23,
    OxidizerWeightSetOffset = 24,
    HeatingStart = 25,
    HeatingStop = 26,
    SetHeatingThreshold = 27,
    /// Force `Idle` from `Abort` or `AfterBurnout`.
    Restart = 28,
}

impl RemoteCommand {
    /// Number of commands.
    pub const COUNT: usize = 29;

    /// All commands in id order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::StateChange,
        Self::Abort,
        Self::HoldIn,
        Self::HoldOut,
        Self::FillOpen,
        Self::FillClose,
        Self::FillOpenTimed,
        Self::DeprOpen,
        Self::DeprClose,
        Self::DeprOpenTimed,
        Self::FuelValveOpen,
        Self::FuelValveClose,
        Self::OxidizerValveOpen,
        Self::OxidizerValveClose,
        Self::IgniterArm,
        Self::IgniterDisarm,
        Self::IgniterFire,
        Self::SoftResetSubmodule,
        Self::ResetAllSubmodules,
        Self::RocketWeightTare,
        Self::RocketWeightCalibrate,
        Self::RocketWeightSetOffset,
        Self::OxidizerWeightTare,
        Self::OxidizerWeightCalibrate,
        Self::OxidizerWeightSetOffset,
        Self::HeatingStart,
        Self::HeatingStop,
        Self::SetHeatingThreshold,
        Self::Restart,
    ];

    /// Decode a wire command id.
    #[inline]
    pub fn from_u32(value: u32) -> Option<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// Wire command id.
    #[inline]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Commands that need the privilege bit in the sender's device id.
    pub const fn requires_sudo(self) -> bool {
        matches!(
            self,
            Self::FillOpenTimed
                | Self::DeprOpenTimed
                | Self::IgniterArm
                | Self::IgniterDisarm
                | Self::IgniterFire
                | Self::SoftResetSubmodule
                | Self::ResetAllSubmodules
                | Self::RocketWeightTare
                | Self::RocketWeightCalibrate
                | Self::RocketWeightSetOffset
                | Self::OxidizerWeightTare
                | Self::OxidizerWeightCalibrate
                | Self::OxidizerWeightSetOffset
                | Self::SetHeatingThreshold
                | Self::Restart
        )
    }
}

impl fmt::Display for RemoteCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.id())
    }
}
