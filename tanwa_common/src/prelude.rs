//! Prelude module for common re-exports.
//!
//! Consumers can do `use tanwa_common::prelude::*;` and get the most
//! important types without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};

// ─── Peripherals ────────────────────────────────────────────────────
pub use crate::hal::board::{AdcChannels, BoardFactory, BoardPeripherals};
pub use crate::hal::driver::{AdcChannel, CanBus, GpioPort, HalError, I2cBus, PwmChannel};

// ─── Mission Types ──────────────────────────────────────────────────
pub use crate::mission::can::{CanFrame, Submodule};
pub use crate::mission::command::{Addressing, RemoteCommand, Transport};
pub use crate::mission::state::MissionState;
pub use crate::mission::telemetry::{IgniterState, SubmoduleLinks, TelemetryData, ValveState};
