//! Hardware abstraction layer shared types.
//!
//! Peripheral traits implemented by board drivers, the board pin map and the
//! [`board::BoardPeripherals`] bundle injected into the control unit.

pub mod board;
pub mod consts;
pub mod driver;
