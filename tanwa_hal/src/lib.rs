//! # TANWA HAL Library
//!
//! Board drivers implementing the peripheral traits of
//! `tanwa_common::hal::driver`.
//!
//! # Module Structure
//!
//! - [`driver_registry`] - Board factory registration
//! - [`drivers`] - Board driver implementations
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        tanwa_hal                          │
//! │  ┌──────────────────┐        ┌─────────────────────────┐  │
//! │  │  DriverRegistry  │──────► │  BoardFactory           │  │
//! │  │  name → factory  │        │  () -> BoardPeripherals │  │
//! │  └──────────────────┘        └────────────┬────────────┘  │
//! │                                           ▼               │
//! │               GpioPort · I2cBus · AdcChannel · PwmChannel │
//! │               CanBus  (trait objects, Send + Sync)        │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod driver_registry;
pub mod drivers;

pub use crate::driver_registry::DriverRegistry;
pub use crate::drivers::simulation::SimulationBoard;
