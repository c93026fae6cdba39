//! State machine and the mission state table.

pub mod machine;
pub mod mission;

pub use machine::{StateEntry, StateMachine, TaskConfig};
