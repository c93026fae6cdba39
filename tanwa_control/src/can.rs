//! Rocket CAN bus: frame codec, egress queue and bus tasks.

pub mod protocol;
pub mod queue;
pub mod task;

pub use protocol::{CanCommand, Decoded};
pub use queue::CanTxQueue;
pub use task::{CanTasks, PollRate};
