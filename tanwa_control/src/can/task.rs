//! CAN bus tasks.
//!
//! ```text
//!   CanTxQueue ──► [can-tx] ──transmit──► bus ──► boost RX wait
//!   bus ──receive(wait)──► [can-rx] ──► store / soft reset / relay
//!   [can-poll] ── every period ──► GET_STATUS + GET_DATA per submodule
//! ```
//!
//! The RX wait drops to the boost value after each successful transmit, so
//! responses are picked up quickly, and returns to the baseline on the
//! first RX timeout.

use crate::can::protocol::{self, CanCommand};
use crate::can::queue::CanTxQueue;
use crate::config::CanConfig;
use crate::error::TanwaError;
use crate::telemetry::store::TelemetryStore;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tanwa_common::hal::driver::CanBus;
use tanwa_common::mission::can::Submodule;
use tracing::{debug, error, info, warn};

/// How long the TX task waits for a frame before re-checking shutdown.
const TX_IDLE_WAIT: Duration = Duration::from_millis(100);

/// Receives CAN-relayed remote commands.
pub type RemoteCommandHandler = Arc<dyn Fn(u32, i32) + Send + Sync>;

// ─── Poll Rate ──────────────────────────────────────────────────────

/// Current RX wait, switched between a baseline and a boost value.
#[derive(Debug)]
pub struct PollRate {
    base_ms: u64,
    boost_ms: u64,
    current_ms: AtomicU64,
}

impl PollRate {
    pub fn new(base: Duration, boost: Duration) -> Self {
        let base_ms = base.as_millis() as u64;
        Self {
            base_ms,
            boost_ms: boost.as_millis() as u64,
            current_ms: AtomicU64::new(base_ms),
        }
    }

    pub fn boost(&self) {
        self.current_ms.store(self.boost_ms, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.current_ms.store(self.base_ms, Ordering::Relaxed);
    }

    pub fn current(&self) -> Duration {
        Duration::from_millis(self.current_ms.load(Ordering::Relaxed))
    }
}

// ─── Stop Signal ────────────────────────────────────────────────────

#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn is_stopped(&self) -> bool {
        *self.stopped.lock()
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    /// Sleep for `period` unless stopped first. `true` if stopped.
    fn wait(&self, period: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            let _ = self.wake.wait_for(&mut stopped, period);
        }
        *stopped
    }
}

// ─── Tasks ──────────────────────────────────────────────────────────

/// Running TX, RX and poll threads.
pub struct CanTasks {
    stop: Arc<StopSignal>,
    rate: Arc<PollRate>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl CanTasks {
    pub fn spawn(
        bus: Arc<dyn CanBus>,
        queue: Arc<CanTxQueue>,
        store: Arc<TelemetryStore>,
        config: &CanConfig,
        on_command: RemoteCommandHandler,
    ) -> Result<Self, TanwaError> {
        let tasks = Self {
            stop: Arc::new(StopSignal::default()),
            rate: Arc::new(PollRate::new(
                Duration::from_millis(config.rx_wait_ms),
                Duration::from_millis(config.rx_wait_boost_ms),
            )),
            handles: Mutex::new(Vec::with_capacity(3)),
        };

        let tx_timeout = Duration::from_millis(config.tx_timeout_ms);
        let poll_period = Duration::from_millis(config.poll_period_ms);

        let spawned = tasks
            .spawn_thread("can-tx", {
                let (bus, queue, stop, rate) = (
                    bus.clone(),
                    queue.clone(),
                    tasks.stop.clone(),
                    tasks.rate.clone(),
                );
                move || tx_loop(bus.as_ref(), &queue, &stop, &rate, tx_timeout)
            })
            .and_then(|()| {
                tasks.spawn_thread("can-rx", {
                    let (queue, stop, rate) =
                        (queue.clone(), tasks.stop.clone(), tasks.rate.clone());
                    move || rx_loop(bus.as_ref(), &queue, &store, &stop, &rate, &on_command)
                })
            })
            .and_then(|()| {
                tasks.spawn_thread("can-poll", {
                    let stop = tasks.stop.clone();
                    move || poll_loop(&queue, &stop, poll_period)
                })
            });

        if let Err(e) = spawned {
            tasks.stop();
            return Err(e);
        }
        info!(
            poll_ms = config.poll_period_ms,
            rx_wait_ms = config.rx_wait_ms,
            "CAN tasks started"
        );
        Ok(tasks)
    }

    fn spawn_thread(
        &self,
        name: &str,
        body: impl FnOnce() + Send + 'static,
    ) -> Result<(), TanwaError> {
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(body)
            .map_err(|e| TanwaError::ResourceExhausted(format!("{name}: {e}")))?;
        self.handles.lock().push(handle);
        Ok(())
    }

    pub fn poll_rate(&self) -> &PollRate {
        &self.rate
    }

    /// Stop and join all threads. Idempotent.
    pub fn stop(&self) {
        self.stop.stop();
        for handle in self.handles.lock().drain(..) {
            if handle.join().is_err() {
                error!("CAN task panicked");
            }
        }
    }
}

impl Drop for CanTasks {
    fn drop(&mut self) {
        self.stop();
    }
}

fn tx_loop(
    bus: &dyn CanBus,
    queue: &CanTxQueue,
    stop: &StopSignal,
    rate: &PollRate,
    tx_timeout: Duration,
) {
    while !stop.is_stopped() {
        let Some(frame) = queue.pop_timeout(TX_IDLE_WAIT) else {
            continue;
        };
        match bus.transmit(&frame, tx_timeout) {
            Ok(()) => rate.boost(),
            Err(e) => warn!(id = frame.id, "CAN transmit failed: {e}"),
        }
    }
    debug!("CAN TX task finished");
}

fn rx_loop(
    bus: &dyn CanBus,
    queue: &CanTxQueue,
    store: &TelemetryStore,
    stop: &StopSignal,
    rate: &PollRate,
    on_command: &RemoteCommandHandler,
) {
    while !stop.is_stopped() {
        match bus.receive(rate.current()) {
            Ok(Some(frame)) => {
                if let Some((command, payload)) = protocol::handle_frame(&frame, store, queue) {
                    on_command(command, payload);
                }
            }
            Ok(None) => rate.reset(),
            Err(e) => {
                warn!("CAN receive failed: {e}");
                if stop.wait(rate.current()) {
                    break;
                }
            }
        }
    }
    debug!("CAN RX task finished");
}

fn poll_loop(queue: &CanTxQueue, stop: &StopSignal, period: Duration) {
    loop {
        for submodule in Submodule::ALL {
            queue.push(CanCommand::GetStatus(submodule).encode());
            if submodule.has_data() {
                queue.push(CanCommand::GetData(submodule).encode());
            }
        }
        if stop.wait(period) {
            break;
        }
    }
    debug!("CAN poll task finished");
}
