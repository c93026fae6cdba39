//! Shared fixtures for the integration suites.

mod abort;
mod countdown;
mod flight;
mod state_sequence;
mod station;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tanwa_control::can::CanTxQueue;
use tanwa_control::config::TanwaConfig;
use tanwa_control::context::MissionContext;
use tanwa_control::indicator::GpioIndicators;
use tanwa_control::state::TaskConfig;
use tanwa_control::telemetry::TelemetryStore;
use tanwa_hal::SimulationBoard;

pub const OWN_ID: u32 = 0x05;

/// Default configuration for a node with id [`OWN_ID`].
pub fn test_config() -> TanwaConfig {
    let mut config = TanwaConfig::with_service_name("tanwa-it");
    config.device.device_id = OWN_ID;
    config
}

/// Poll `cond` until it holds or `timeout` passes.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

/// Mission context on a simulation board with its state machine running.
pub struct MissionFixture {
    pub board: SimulationBoard,
    pub ctx: Arc<MissionContext>,
    pub indicators: Arc<GpioIndicators>,
}

impl MissionFixture {
    pub fn start(config: &TanwaConfig) -> Self {
        let board = SimulationBoard::new();
        let peripherals = board.peripherals();
        let indicators = Arc::new(GpioIndicators::new(peripherals.gpio.clone()));
        let ctx = MissionContext::build(
            config,
            &peripherals,
            indicators.clone(),
            Arc::new(TelemetryStore::new()),
            Arc::new(CanTxQueue::new(config.can.tx_queue_len)),
        )
        .unwrap();
        ctx.machine()
            .run(TaskConfig {
                name: "sm-test".to_string(),
                core: None,
            })
            .unwrap();
        Self {
            board,
            ctx,
            indicators,
        }
    }
}

impl Drop for MissionFixture {
    fn drop(&mut self) {
        self.ctx.stop_timers();
        self.ctx.machine().stop();
    }
}
