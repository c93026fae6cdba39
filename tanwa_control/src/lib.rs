//! # TANWA Control Unit Library
//!
//! Ground support control for a liquid-fuel rocket: sequences the launch
//! campaign, drives igniters and valves, talks to the rocket's submodules
//! over CAN and aggregates telemetry for the operators.
//!
//! ## Architecture
//!
//! ```text
//!  radio frame ─► link ─┐
//!  CAN relay ───────────┼─► command ─► context ─┬─► state machine ─► entry callbacks
//!                       │                       ├─► actuators
//!                       │                       └─► timers ─► ignition / T-zero / burnout
//!  CAN responses ─► can ─► telemetry store ◄── sensors
//!                              └─► sampler ─► record ─► logger
//! ```
//!
//! ## Mission States
//!
//! `Init → Idle → Fueling → ArmedToLaunch → RdyToLaunch → Countdown → Fire →
//! AfterBurnout`, with `Hold` and `Abort` reachable by force. Operator
//! commands advance one state at a time up to `Countdown`; from there the
//! countdown timers drive the sequence.

pub mod actuator;
pub mod can;
pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod indicator;
pub mod link;
pub mod state;
pub mod station;
pub mod telemetry;
pub mod timer;
