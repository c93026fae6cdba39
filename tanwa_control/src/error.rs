//! Error types of the control unit.
//!
//! One enum per domain plus the umbrella [`TanwaError`] used at wiring and
//! binary level. State errors are returned synchronously and never leave a
//! partially applied transition behind.

use tanwa_common::config::ConfigError;
use tanwa_common::hal::driver::HalError;
use tanwa_common::mission::command::{RemoteCommand, Transport};
use tanwa_common::mission::state::MissionState;
use thiserror::Error;

/// Actuator driver failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ActuatorError {
    /// Peripheral I/O failed.
    #[error("{actuator}: {source}")]
    Hal {
        actuator: &'static str,
        #[source]
        source: HalError,
    },

    /// Operation not allowed in the actuator's current state.
    #[error("{actuator}: cannot {operation} while {state}")]
    InvalidState {
        actuator: &'static str,
        operation: &'static str,
        state: &'static str,
    },

    /// Driver lock not acquired in time.
    #[error("{0}: lock timeout")]
    LockTimeout(&'static str),

    /// Argument out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// State machine failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateMachineError {
    /// State table rejected; the machine stays unconfigured.
    #[error("invalid state table: {0}")]
    InvalidStates(String),

    /// No state table configured.
    #[error("state machine not configured")]
    NotConfigured,

    /// Loop already running.
    #[error("state machine already running")]
    AlreadyRunning,

    /// Loop thread could not be spawned.
    #[error("failed to spawn state machine thread: {0}")]
    SpawnFailed(String),

    /// Transition not allowed from the current state.
    #[error("transition {from} -> {to} not allowed")]
    InvalidTransition { from: usize, to: usize },

    /// Transition lock not acquired in time.
    #[error("transition lock timeout")]
    LockTimeout,
}

/// Timer failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimerError {
    /// Mission timer offsets must be zero or negative.
    #[error("mission timer offset {0} ms must not be positive")]
    PositiveOffset(i64),

    /// Countdown schedule violates `countdown < ignition <= 0`.
    #[error("invalid countdown schedule: countdown {countdown_ms} ms, ignition {ignition_ms} ms")]
    InvalidSchedule { countdown_ms: i64, ignition_ms: i64 },

    /// Deadline not representable on this clock.
    #[error("timer '{name}' period {period_ms} ms out of range")]
    PeriodOutOfRange { name: &'static str, period_ms: u128 },

    /// Timer thread could not be spawned.
    #[error("failed to spawn timer '{name}': {reason}")]
    SpawnFailed { name: &'static str, reason: String },
}

/// Malformed frame on any link.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// CAN identifier not handled by this node.
    #[error("unknown CAN id {0:#05x}")]
    UnknownId(u16),

    /// Frame shorter than its layout.
    #[error("frame {id:#05x} too short: dlc {dlc}, need {need}")]
    ShortFrame { id: u16, dlc: u8, need: u8 },

    /// Link frame over the size limit.
    #[error("frame of {0} bytes exceeds limit")]
    FrameTooLong(usize),

    /// Link frame prefix mismatch.
    #[error("bad frame prefix")]
    BadPrefix,

    /// Link frame body of unexpected length.
    #[error("bad frame length {0}")]
    BadLength(usize),

    /// Link frame checksum mismatch.
    #[error("checksum mismatch: expected {expected:#04x}, got {actual:#04x}")]
    BadChecksum { expected: u8, actual: u8 },

    /// Valve payload from an unknown module.
    #[error("unknown valve module {0}")]
    UnknownDevice(u8),
}

/// Remote command rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommandError {
    /// Command id outside the closed command set.
    #[error("unknown command id {0}")]
    UnknownCommand(u32),

    /// Sender lacks the privilege bit.
    #[error("{0} requires privileged sender")]
    Unprivileged(RemoteCommand),

    /// Command not exposed on this transport.
    #[error("{command} not available over {transport}")]
    NotRegistered {
        transport: Transport,
        command: RemoteCommand,
    },

    /// Command not valid in the current mission state.
    #[error("{command} rejected in state {state}")]
    InvalidState {
        command: RemoteCommand,
        state: MissionState,
    },

    /// Payload out of range for the command.
    #[error("{command}: invalid payload {payload}")]
    InvalidPayload { command: RemoteCommand, payload: i32 },

    /// CAN egress queue full.
    #[error("CAN transmit queue full")]
    QueueFull,

    /// Component gone (shutdown in progress).
    #[error("mission context unavailable")]
    Unavailable,

    #[error(transparent)]
    Actuator(#[from] ActuatorError),

    #[error(transparent)]
    StateMachine(#[from] StateMachineError),

    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Umbrella error of the control unit.
#[derive(Debug, Error)]
pub enum TanwaError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("hal: {0}")]
    Hal(#[from] HalError),

    #[error("actuator: {0}")]
    Actuator(#[from] ActuatorError),

    #[error("state machine: {0}")]
    StateMachine(#[from] StateMachineError),

    #[error("timer: {0}")]
    Timer(#[from] TimerError),

    #[error("protocol: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("command: {0}")]
    Command(#[from] CommandError),

    /// Lock not acquired within its budget.
    #[error("{0}: lock timeout")]
    LockTimeout(&'static str),

    /// Queue, thread or file handle exhausted.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Required value missing.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn actuator_error_keeps_hal_source() {
        let err = ActuatorError::Hal {
            actuator: "igniter_1",
            source: HalError::Gpio {
                pin: 5,
                reason: "stuck".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("igniter_1"));
        assert!(msg.contains("stuck"));
    }

    #[test]
    fn command_error_wraps_domain_errors() {
        let err: CommandError = StateMachineError::InvalidTransition { from: 1, to: 5 }.into();
        assert_eq!(err.to_string(), "transition 1 -> 5 not allowed");

        let err: TanwaError = err.into();
        assert!(matches!(err, TanwaError::Command(_)));
    }
}
