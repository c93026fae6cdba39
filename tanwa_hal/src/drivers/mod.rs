//! Board driver implementations.
//!
//! - [`simulation`] - Software board for development and testing
//!
//! # Adding New Boards
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the peripheral traits from `tanwa_common::hal::driver`
//! 3. Expose a [`BoardFactory`](tanwa_common::hal::board::BoardFactory)
//! 4. Register it in [`register_all`]

pub mod simulation;

use crate::driver_registry::DriverRegistry;

/// Register all built-in boards.
pub fn register_all(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_board);
}
