//! Safety-checked actuator drivers.
//!
//! Every driver keeps its own state behind a bounded lock and refuses
//! operations that make no sense in that state. The `force_*` variants skip
//! the state guard and are reserved for safing sequences.

pub mod igniter;
pub mod servo;
pub mod solenoid;

pub use igniter::Igniter;
pub use servo::ServoValve;
pub use solenoid::SolenoidValve;

use crate::error::ActuatorError;
use parking_lot::{Mutex, MutexGuard};
use tanwa_common::consts::ACTUATOR_LOCK_TIMEOUT;
use tanwa_common::hal::driver::HalError;

/// Bounded lock of a driver's state.
fn lock_state<'a, T>(
    actuator: &'static str,
    state: &'a Mutex<T>,
) -> Result<MutexGuard<'a, T>, ActuatorError> {
    state
        .try_lock_for(ACTUATOR_LOCK_TIMEOUT)
        .ok_or(ActuatorError::LockTimeout(actuator))
}

/// Attach the actuator name to a peripheral error.
fn hal_err(actuator: &'static str) -> impl Fn(HalError) -> ActuatorError {
    move |source| ActuatorError::Hal { actuator, source }
}
