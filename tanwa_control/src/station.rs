//! Station runtime.
//!
//! Wires one board into a running control unit: mission context, state
//! machine thread, CAN tasks, telemetry sampler and logger, and the command
//! dispatcher. Startup order matters: the state machine runs before the
//! bus tasks so relayed commands never hit an unconfigured machine.

use crate::can::{CanTasks, CanTxQueue};
use crate::command::{CommandRegistry, Dispatcher, ParseOutcome};
use crate::config::TanwaConfig;
use crate::context::MissionContext;
use crate::error::{ProtocolError, TanwaError};
use crate::indicator::{GpioIndicators, Indicators};
use crate::link::ValvePayload;
use crate::state::TaskConfig;
use crate::telemetry::{
    LocalSensors, RecordSink, SamplerHandle, SensorScaling, TelemetryLogger, TelemetrySampler,
    TelemetryStore,
};
use std::sync::Arc;
use std::time::Duration;
use tanwa_common::hal::board::BoardPeripherals;
use tanwa_common::mission::state::MissionState;
use tracing::{error, info};

pub struct Station {
    ctx: Arc<MissionContext>,
    dispatcher: Arc<Dispatcher>,
    can: CanTasks,
    sampler: SamplerHandle,
    logger: Option<Arc<TelemetryLogger>>,
}

impl Station {
    /// Start with GPIO indicators and the file logger.
    pub fn start(config: &TanwaConfig, board: BoardPeripherals) -> Result<Self, TanwaError> {
        let indicators = Arc::new(GpioIndicators::new(board.gpio.clone()));
        let logger = match TelemetryLogger::start(&config.telemetry) {
            Ok(logger) => Some(Arc::new(logger)),
            Err(e) => {
                error!("telemetry persistence disabled: {e}");
                None
            }
        };
        let sinks = logger
            .iter()
            .map(|l| l.clone() as Arc<dyn RecordSink>)
            .collect();
        let mut station = Self::start_with(config, board, indicators, sinks)?;
        station.logger = logger;
        Ok(station)
    }

    /// Start with explicit indicators and record sinks.
    pub fn start_with(
        config: &TanwaConfig,
        board: BoardPeripherals,
        indicators: Arc<dyn Indicators>,
        sinks: Vec<Arc<dyn RecordSink>>,
    ) -> Result<Self, TanwaError> {
        config.validate()?;
        info!(board = board.name, device_id = config.device.device_id, "station starting");

        let store = Arc::new(TelemetryStore::new());
        let can_tx = Arc::new(CanTxQueue::new(config.can.tx_queue_len));
        let ctx = MissionContext::build(config, &board, indicators, store.clone(), can_tx.clone())?;

        ctx.machine().run(TaskConfig {
            name: "state-machine".to_string(),
            core: config.tasks.state_machine_core,
        })?;
        ctx.change_state(MissionState::Idle)?;

        let dispatcher = Arc::new(Dispatcher::new(
            ctx.clone(),
            CommandRegistry::with_defaults(),
            config.device.device_id,
        ));

        let can = CanTasks::spawn(
            board.can.clone(),
            can_tx,
            store,
            &config.can,
            Arc::new({
                let dispatcher = Arc::downgrade(&dispatcher);
                move |command, payload| {
                    if let Some(dispatcher) = dispatcher.upgrade() {
                        dispatcher.handle_can_command(command, payload);
                    }
                }
            }),
        )?;

        let sensors = LocalSensors::new(
            board.adc.clone(),
            board.i2c.clone(),
            SensorScaling::from(&config.telemetry),
        );
        let sampler = TelemetrySampler::new(
            ctx.clone(),
            sensors,
            sinks,
            Duration::from_millis(config.can.stale_after_ms),
        )
        .spawn(Duration::from_millis(config.telemetry.sample_period_ms))?;

        info!("station running");
        Ok(Self {
            ctx,
            dispatcher,
            can,
            sampler,
            logger: None,
        })
    }

    pub fn context(&self) -> &Arc<MissionContext> {
        &self.ctx
    }

    /// Command entry point shared by both links.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Radio command frame.
    pub fn on_link_frame(&self, bytes: &[u8]) -> Result<ParseOutcome, ProtocolError> {
        self.dispatcher.handle_link_frame(bytes)
    }

    /// Valve module telemetry from the short-range link.
    pub fn on_valve_payload(&self, bytes: &[u8]) -> Result<(), TanwaError> {
        ValvePayload::decode(bytes)?.apply(self.ctx.store())
    }

    /// Stop every task. Timers are cancelled; actuators keep their state.
    pub fn shutdown(self) {
        info!("station shutting down");
        self.can.stop();
        self.sampler.stop();
        self.ctx.stop_timers();
        self.ctx.machine().stop();
        if let Some(logger) = &self.logger {
            logger.shutdown();
        }
        info!("station stopped");
    }
}
