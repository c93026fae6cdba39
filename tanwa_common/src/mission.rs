//! Mission shared types.
//!
//! Everything exchanged between the control unit and the outside world:
//! state identifiers, CAN frames, remote commands and telemetry records.

pub mod can;
pub mod command;
pub mod state;
pub mod telemetry;
