//! Periodic telemetry task.
//!
//! Each tick: sample local sensors and actuator states into the store, take
//! one snapshot, render it with the current state and mission time, and
//! offer the line to every sink.

use crate::context::MissionContext;
use crate::error::TanwaError;
use crate::telemetry::logger::RecordSink;
use crate::telemetry::record::TelemetryRecord;
use crate::telemetry::sensors::LocalSensors;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

pub struct TelemetrySampler {
    ctx: Arc<MissionContext>,
    sensors: LocalSensors,
    sinks: Vec<Arc<dyn RecordSink>>,
    stale_after: Duration,
}

impl TelemetrySampler {
    pub fn new(
        ctx: Arc<MissionContext>,
        sensors: LocalSensors,
        sinks: Vec<Arc<dyn RecordSink>>,
        stale_after: Duration,
    ) -> Self {
        Self {
            ctx,
            sensors,
            sinks,
            stale_after,
        }
    }

    /// One sampling pass. Returns the rendered line.
    pub fn sample_once(&self) -> Result<String, TanwaError> {
        let store = self.ctx.store();
        store.set_local(self.sensors.sample())?;
        store.set_actuators(self.ctx.actuator_readings())?;
        let data = store.snapshot()?;

        let line = TelemetryRecord {
            state: self.ctx.state_hint(),
            mission_time_ms: self.ctx.mission_timer().get_time(),
            links: data.links(Instant::now(), self.stale_after),
            data: &data,
        }
        .render();

        for sink in &self.sinks {
            sink.push(&line);
        }
        Ok(line)
    }

    /// Run [`Self::sample_once`] every `period` on its own thread.
    pub fn spawn(self, period: Duration) -> Result<SamplerHandle, TanwaError> {
        let stop = Arc::new((Mutex::new(false), Condvar::new()));
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("telemetry-sampler".to_string())
            .spawn(move || {
                let (stopped, wake) = &*thread_stop;
                let mut next = Instant::now();
                loop {
                    if let Err(e) = self.sample_once() {
                        warn!("telemetry sample skipped: {e}");
                    }
                    next += period;
                    let mut guard = stopped.lock();
                    if !*guard {
                        let _ = wake.wait_until(&mut guard, next);
                    }
                    if *guard {
                        break;
                    }
                    // Fell behind: skip missed ticks instead of bursting.
                    let now = Instant::now();
                    if next < now {
                        next = now;
                    }
                }
                debug!("telemetry sampler finished");
            })
            .map_err(|e| TanwaError::ResourceExhausted(format!("telemetry sampler: {e}")))?;

        info!(period_ms = period.as_millis() as u64, "telemetry sampler started");
        Ok(SamplerHandle {
            stop,
            handle: Mutex::new(Some(handle)),
        })
    }
}

/// Running sampler thread.
pub struct SamplerHandle {
    stop: Arc<(Mutex<bool>, Condvar)>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl SamplerHandle {
    /// Stop and join. Idempotent.
    pub fn stop(&self) {
        let (stopped, wake) = &*self.stop;
        *stopped.lock() = true;
        wake.notify_all();
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                error!("telemetry sampler panicked");
            }
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::can::CanTxQueue;
    use crate::config::TanwaConfig;
    use crate::indicator::GpioIndicators;
    use crate::telemetry::record::RECORD_HEADER;
    use crate::telemetry::sensors::SensorScaling;
    use crate::telemetry::store::TelemetryStore;
    use tanwa_common::mission::state::MissionState;
    use tanwa_hal::drivers::simulation::SimulationBoard;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl RecordSink for Collect {
        fn push(&self, line: &str) -> bool {
            self.0.lock().push(line.to_owned());
            true
        }
    }

    fn sampler(board: &SimulationBoard, sink: Arc<Collect>) -> TelemetrySampler {
        let config = TanwaConfig::with_service_name("test");
        let p = board.peripherals();
        let ctx = MissionContext::build(
            &config,
            &p,
            Arc::new(GpioIndicators::new(p.gpio.clone())),
            Arc::new(TelemetryStore::new()),
            Arc::new(CanTxQueue::new(8)),
        )
        .unwrap();
        ctx.force_state(MissionState::Fueling).unwrap();
        let sensors = LocalSensors::new(p.adc, p.i2c, SensorScaling::from(&config.telemetry));
        TelemetrySampler::new(ctx, sensors, vec![sink], Duration::from_secs(2))
    }

    #[test]
    fn sample_once_feeds_store_and_sinks() {
        let board = SimulationBoard::new();
        let sink = Arc::new(Collect::default());
        let sampler = sampler(&board, sink.clone());

        let line = sampler.sample_once().unwrap();
        assert_eq!(sink.0.lock().as_slice(), [line.clone()]);
        assert!(line.starts_with("2;"));
        assert_eq!(
            line.split(';').count(),
            RECORD_HEADER.split(';').count()
        );
        // Mission clock is disabled before the countdown.
        assert!(line.ends_with(&format!(";{}", i64::MIN)));

        let stored = sampler.ctx.store().snapshot().unwrap();
        assert_eq!(stored.local.temperatures_c, [21.5, 21.5]);
    }

    #[test]
    fn spawned_sampler_ticks_until_stopped() {
        let board = SimulationBoard::new();
        let sink = Arc::new(Collect::default());
        let handle = sampler(&board, sink.clone())
            .spawn(Duration::from_millis(10))
            .unwrap();
        thread::sleep(Duration::from_millis(100));
        handle.stop();
        let count = sink.0.lock().len();
        assert!(count >= 3, "only {count} samples");
        thread::sleep(Duration::from_millis(30));
        assert_eq!(sink.0.lock().len(), count);
        handle.stop();
    }
}
