//! Mission clock and one-shot timers.

pub mod ignition;
pub mod mission;
pub mod one_shot;

pub use ignition::LiquidIgnitionTimers;
pub use mission::MissionTimer;
pub use one_shot::OneShotTimer;
