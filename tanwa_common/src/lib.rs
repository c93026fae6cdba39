//! TANWA Common Library
//!
//! Shared constants, configuration loading, peripheral traits and mission
//! types for all TANWA workspace crates.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide timing and sizing constants
//! - [`hal`] - Peripheral traits, pin map and board bundle
//! - [`mission`] - State ids, CAN frames, remote commands, telemetry records
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use tanwa_common::prelude::*;
//!
//! let state = MissionState::Countdown;
//! assert!(!state.is_flight_window());
//! ```

pub mod config;
pub mod consts;
pub mod hal;
pub mod mission;
pub mod prelude;
