//! System-wide constants for the TANWA workspace.
//!
//! Single source of truth for lock budgets, task periods and frame limits.

use std::time::Duration;

/// Upper bound for acquiring the state machine transition lock.
pub const STATE_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Poll interval of the state machine loop while waiting for a signal.
pub const STATE_LOOP_POLL: Duration = Duration::from_millis(10);

/// Upper bound for acquiring the telemetry store lock.
pub const STORE_LOCK_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound for a mission timer read before the sentinel is returned.
pub const MISSION_TIMER_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Upper bound for an actuator driver lock.
pub const ACTUATOR_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Longest long-range link frame accepted before parsing.
pub const MAX_LINK_FRAME_LEN: usize = 40;

/// Number of pressure transducers sampled locally.
pub const PRESSURE_CHANNELS: usize = 4;

/// Number of local temperature sensors.
pub const TEMPERATURE_CHANNELS: usize = 2;

/// Number of igniters.
pub const IGNITER_COUNT: usize = 2;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/tanwa/tanwa.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_budgets_are_ordered() {
        assert!(STATE_LOOP_POLL < STATE_LOCK_TIMEOUT);
        assert!(MISSION_TIMER_READ_TIMEOUT <= STATE_LOOP_POLL);
        assert!(STORE_LOCK_TIMEOUT <= Duration::from_secs(1));
    }

    #[test]
    fn link_frame_limit_fits_a_command() {
        // prefix + 16-byte body + checksum
        assert!(6 + 16 + 1 <= MAX_LINK_FRAME_LEN);
    }
}
