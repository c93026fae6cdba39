//! CAN frame type and identifier map of the rocket submodules.
//!
//! Each submodule owns 16 consecutive 11-bit identifiers starting at its
//! base: the lower eight carry commands sent by TANWA, the upper eight carry
//! the submodule's responses.
//!
//! ```text
//!  base + 0..8   TX  SOFT_RESET, GET_STATUS, GET_DATA, submodule commands
//!  base + 8..16  RX  STATUS, DATA, CALIBRATION
//! ```
//!
//! All multi-byte fields are little-endian.

use static_assertions::const_assert;

/// Payload capacity of a classic CAN frame.
pub const CAN_DATA_LEN: usize = 8;

/// Largest 11-bit identifier.
pub const CAN_MAX_STD_ID: u16 = 0x7FF;

/// Identifiers reserved per submodule.
pub const SUBMODULE_ID_SPAN: u16 = 16;

/// Command identifiers per submodule; responses start right after.
pub const COMMAND_ID_SPAN: u16 = 8;

/// Identifier of a remote command forwarded over CAN by a bus peer.
/// Payload: `command: u32 @0`, `payload: i32 @4`.
pub const REMOTE_COMMAND_ID: u16 = 0x0F0;

/// Value of the status `request` byte asking TANWA for a soft reset.
pub const REQUEST_SOFT_RESET: u8 = 0xA5;

/// Command offsets within a submodule's TX range.
pub mod command_offset {
    /// Reinitialize without power cycle.
    pub const SOFT_RESET: u16 = 0;
    /// Request a STATUS response.
    pub const GET_STATUS: u16 = 1;
    /// Request a DATA response.
    pub const GET_DATA: u16 = 2;

    /// Weight cell: zero the scale.
    pub const WEIGHT_TARE: u16 = 3;
    /// Weight cell: set calibration factor (`f32`).
    pub const WEIGHT_SET_CAL_FACTOR: u16 = 4;
    /// Weight cell: set raw offset (`f32`).
    pub const WEIGHT_SET_OFFSET: u16 = 5;
    /// Weight cell: calibrate against a known mass in grams (`f32`).
    pub const WEIGHT_CALIBRATE: u16 = 6;

    /// Thermal controller: start heating.
    pub const THERMAL_HEATING_START: u16 = 3;
    /// Thermal controller: stop heating.
    pub const THERMAL_HEATING_STOP: u16 = 4;
    /// Thermal controller: heating cut-off temperature in °C (`f32`).
    pub const THERMAL_SET_THRESHOLD: u16 = 5;

    /// Disconnect controller: run the disconnect motor for `u32` ms.
    pub const DISCONNECT_RUN: u16 = 3;
}

/// Response offsets within a submodule's RX range.
pub mod response_offset {
    /// Status word, request byte and submodule flags.
    pub const STATUS: u16 = 0;
    /// Measurements.
    pub const DATA: u16 = 1;
    /// Weight cell calibration echo.
    pub const CALIBRATION: u16 = 2;
}

const_assert!(COMMAND_ID_SPAN * 2 == SUBMODULE_ID_SPAN);
const_assert!(REMOTE_COMMAND_ID <= CAN_MAX_STD_ID);

/// Rocket ground-support unit reachable over CAN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Submodule {
    /// Load cell under the rocket.
    WeightRocket = 0,
    /// Load cell under the oxidizer tank.
    WeightOxidizer = 1,
    /// Fill line controller.
    Fill = 2,
    /// Tank heating controller.
    Thermal = 3,
    /// Quick-disconnect controller.
    Disconnect = 4,
}

/// Direction of a submodule frame as seen from TANWA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDirection {
    /// TANWA → submodule.
    Command,
    /// Submodule → TANWA.
    Response,
}

impl Submodule {
    /// Number of submodules.
    pub const COUNT: usize = 5;

    /// All submodules in index order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::WeightRocket,
        Self::WeightOxidizer,
        Self::Fill,
        Self::Thermal,
        Self::Disconnect,
    ];

    /// Convert from index. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::WeightRocket),
            1 => Some(Self::WeightOxidizer),
            2 => Some(Self::Fill),
            3 => Some(Self::Thermal),
            4 => Some(Self::Disconnect),
            _ => None,
        }
    }

    /// First identifier of this submodule's range.
    #[inline]
    pub const fn base_id(self) -> u16 {
        match self {
            Self::WeightRocket => 0x0A0,
            Self::WeightOxidizer => 0x0B0,
            Self::Fill => 0x0C0,
            Self::Thermal => 0x0D0,
            Self::Disconnect => 0x0E0,
        }
    }

    /// Identifier of a command at `offset`.
    #[inline]
    pub const fn command_id(self, offset: u16) -> u16 {
        self.base_id() + offset
    }

    /// Identifier of a response at `offset`.
    #[inline]
    pub const fn response_id(self, offset: u16) -> u16 {
        self.base_id() + COMMAND_ID_SPAN + offset
    }

    /// Whether the submodule answers `GET_DATA`.
    #[inline]
    pub const fn has_data(self) -> bool {
        !matches!(self, Self::Disconnect)
    }

    /// Locate an identifier: owning submodule, direction and offset.
    pub fn classify(id: u16) -> Option<(Self, FrameDirection, u16)> {
        Self::ALL.into_iter().find_map(|sub| {
            let base = sub.base_id();
            if id < base || id >= base + SUBMODULE_ID_SPAN {
                return None;
            }
            let offset = id - base;
            if offset < COMMAND_ID_SPAN {
                Some((sub, FrameDirection::Command, offset))
            } else {
                Some((sub, FrameDirection::Response, offset - COMMAND_ID_SPAN))
            }
        })
    }

    /// Short name used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::WeightRocket => "weight_rocket",
            Self::WeightOxidizer => "weight_oxidizer",
            Self::Fill => "fill",
            Self::Thermal => "thermal",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Classic CAN frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanFrame {
    /// 11-bit identifier.
    pub id: u16,
    /// Data length code, `0..=8`.
    pub dlc: u8,
    /// Payload; bytes past `dlc` are zero.
    pub data: [u8; CAN_DATA_LEN],
}

impl CanFrame {
    /// Frame with `dlc` zeroed payload bytes.
    #[inline]
    pub const fn new(id: u16, dlc: u8) -> Self {
        Self {
            id,
            dlc,
            data: [0; CAN_DATA_LEN],
        }
    }

    /// Frame carrying `bytes`. `None` if the id is not 11-bit or the payload
    /// exceeds eight bytes.
    pub fn from_bytes(id: u16, bytes: &[u8]) -> Option<Self> {
        if id > CAN_MAX_STD_ID || bytes.len() > CAN_DATA_LEN {
            return None;
        }
        let mut frame = Self::new(id, bytes.len() as u8);
        frame.data[..bytes.len()].copy_from_slice(bytes);
        Some(frame)
    }

    /// Valid payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.data[..(self.dlc as usize).min(CAN_DATA_LEN)]
    }

    fn field<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        self.payload().get(offset..offset + N)?.try_into().ok()
    }

    /// Byte at `offset`, `None` past the DLC.
    #[inline]
    pub fn u8_at(&self, offset: usize) -> Option<u8> {
        self.payload().get(offset).copied()
    }

    /// Little-endian `u16` at `offset`.
    #[inline]
    pub fn u16_at(&self, offset: usize) -> Option<u16> {
        self.field(offset).map(u16::from_le_bytes)
    }

    /// Little-endian `u32` at `offset`.
    #[inline]
    pub fn u32_at(&self, offset: usize) -> Option<u32> {
        self.field(offset).map(u32::from_le_bytes)
    }

    /// Little-endian `i32` at `offset`.
    #[inline]
    pub fn i32_at(&self, offset: usize) -> Option<i32> {
        self.field(offset).map(i32::from_le_bytes)
    }

    /// Little-endian `f32` at `offset`.
    #[inline]
    pub fn f32_at(&self, offset: usize) -> Option<f32> {
        self.field(offset).map(f32::from_le_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_are_disjoint_and_eleven_bit() {
        for (i, a) in Submodule::ALL.iter().enumerate() {
            assert!(a.base_id() + SUBMODULE_ID_SPAN - 1 <= CAN_MAX_STD_ID);
            for b in &Submodule::ALL[i + 1..] {
                let (lo, hi) = if a.base_id() < b.base_id() { (a, b) } else { (b, a) };
                assert!(lo.base_id() + SUBMODULE_ID_SPAN <= hi.base_id());
            }
            assert!(Submodule::classify(REMOTE_COMMAND_ID).is_none());
        }
    }

    #[test]
    fn classify_round_trips_ids() {
        let id = Submodule::Thermal.command_id(command_offset::THERMAL_HEATING_START);
        assert_eq!(
            Submodule::classify(id),
            Some((
                Submodule::Thermal,
                FrameDirection::Command,
                command_offset::THERMAL_HEATING_START
            ))
        );

        let id = Submodule::WeightOxidizer.response_id(response_offset::CALIBRATION);
        assert_eq!(
            Submodule::classify(id),
            Some((
                Submodule::WeightOxidizer,
                FrameDirection::Response,
                response_offset::CALIBRATION
            ))
        );

        assert_eq!(Submodule::classify(0x010), None);
    }

    #[test]
    fn field_reads_respect_dlc() {
        let frame = CanFrame::from_bytes(0x0A8, &[0x34, 0x12, 0xA5]).unwrap();
        assert_eq!(frame.u16_at(0), Some(0x1234));
        assert_eq!(frame.u8_at(2), Some(REQUEST_SOFT_RESET));
        assert_eq!(frame.u8_at(3), None);
        assert_eq!(frame.u32_at(0), None);
    }

    #[test]
    fn from_bytes_rejects_oversized() {
        assert!(CanFrame::from_bytes(0x800, &[]).is_none());
        assert!(CanFrame::from_bytes(0x100, &[0; 9]).is_none());
    }
}
