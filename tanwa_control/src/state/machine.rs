//! Reactive finite-state sequencer.
//!
//! Transitions are synchronous and validated under a bounded lock; entry
//! callbacks run afterwards on the machine's own thread, one at a time, in
//! the order transitions were accepted. Pending signals coalesce: if two
//! transitions land before the loop wakes, only the latest state's callback
//! runs.
//!
//! ```text
//!  caller ── change_state(n) ──► [lock] validate, previous := current,
//!                                 current := n  ──► signal(n)
//!  loop thread ◄──────────── take signal (≤10 ms poll) ── on_enter(n)
//! ```

use crate::error::StateMachineError;
use parking_lot::{Condvar, Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tanwa_common::consts::{STATE_LOCK_TIMEOUT, STATE_LOOP_POLL};
use tracing::{debug, error, info, trace, warn};

/// Entry callback.
pub type EntryCallback = Box<dyn Fn() + Send + Sync>;

/// One row of the state table.
pub struct StateEntry {
    pub id: usize,
    pub name: &'static str,
    pub on_enter: Option<EntryCallback>,
}

impl StateEntry {
    pub fn new(id: usize, name: &'static str) -> Self {
        Self {
            id,
            name,
            on_enter: None,
        }
    }

    pub fn on_enter(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_enter = Some(Box::new(callback));
        self
    }
}

/// Placement of the loop thread.
#[derive(Debug, Clone, Default)]
pub struct TaskConfig {
    pub name: String,
    /// CPU core to pin to (requires the `rt` feature).
    pub core: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Position {
    current: usize,
    previous: usize,
}

struct Shared {
    position: Mutex<Position>,
    table: RwLock<Option<Arc<[StateEntry]>>>,
    pending: Mutex<Option<usize>>,
    wake: Condvar,
    running: AtomicBool,
}

impl Shared {
    fn signal(&self, state: usize) {
        *self.pending.lock() = Some(state);
        self.wake.notify_one();
    }
}

pub struct StateMachine {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StateMachine {
    /// Unconfigured machine; install a table with [`set_states`](Self::set_states).
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                position: Mutex::new(Position::default()),
                table: RwLock::new(None),
                pending: Mutex::new(None),
                wake: Condvar::new(),
                running: AtomicBool::new(false),
            }),
            handle: Mutex::new(None),
        }
    }

    /// Back to state 0 with no history and no table.
    pub fn init(&self) -> Result<(), StateMachineError> {
        if self.is_running() {
            return Err(StateMachineError::AlreadyRunning);
        }
        *self.lock_position()? = Position::default();
        *self.shared.table.write() = None;
        *self.shared.pending.lock() = None;
        Ok(())
    }

    /// Install the state table. Ids must be unique and below the table
    /// length; on failure the machine is left unconfigured.
    pub fn set_states(&self, mut states: Vec<StateEntry>) -> Result<(), StateMachineError> {
        let validation = validate_table(&states);
        let mut table = self.shared.table.write();
        if let Err(e) = validation {
            *table = None;
            return Err(e);
        }
        states.sort_by_key(|entry| entry.id);
        debug!(states = states.len(), "state table installed");
        *table = Some(states.into());
        Ok(())
    }

    /// Spawn the loop thread and run the current state's callback.
    pub fn run(&self, task: TaskConfig) -> Result<(), StateMachineError> {
        let table = self.table()?;
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Err(StateMachineError::AlreadyRunning);
        }

        let shared = Arc::clone(&self.shared);
        let core = task.core;
        let name = if task.name.is_empty() {
            "state-machine".to_string()
        } else {
            task.name
        };

        let spawned = thread::Builder::new().name(name).spawn(move || {
            if let Some(core) = core {
                if let Err(e) = pin_current_thread(core) {
                    warn!("state machine thread not pinned: {e}");
                }
            }
            run_loop(&shared, &table);
        });

        match spawned {
            Ok(handle) => {
                *self.handle.lock() = Some(handle);
                let current = self.lock_position()?.current;
                self.shared.signal(current);
                info!("state machine running");
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                Err(StateMachineError::SpawnFailed(e.to_string()))
            }
        }
    }

    /// Stop the loop and join its thread. Idempotent.
    pub fn stop(&self) {
        if !self.shared.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shared.wake.notify_all();
        if let Some(handle) = self.handle.lock().take() {
            // Stopped from an entry callback: the loop exits on its own.
            if handle.thread().id() != thread::current().id() && handle.join().is_err() {
                error!("state machine thread panicked");
            }
        }
        info!("state machine stopped");
    }

    /// Whether the loop thread is up.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Advance to `new`, which must be exactly `current + 1`.
    pub fn change_state(&self, new: usize) -> Result<(), StateMachineError> {
        let len = self.table()?.len();
        let mut pos = self.lock_position()?;
        if new >= len || new != pos.current + 1 {
            return Err(StateMachineError::InvalidTransition {
                from: pos.current,
                to: new,
            });
        }
        self.commit(&mut pos, new);
        Ok(())
    }

    /// Jump to any valid state.
    pub fn force_change_state(&self, new: usize) -> Result<(), StateMachineError> {
        let len = self.table()?.len();
        let mut pos = self.lock_position()?;
        if new >= len {
            return Err(StateMachineError::InvalidTransition {
                from: pos.current,
                to: new,
            });
        }
        self.commit(&mut pos, new);
        Ok(())
    }

    /// Return to the previous state (one level only), optionally running its
    /// entry callback.
    pub fn change_to_previous_state(&self, run_callback: bool) -> Result<(), StateMachineError> {
        self.return_to_previous(None, run_callback)
    }

    /// Like [`change_to_previous_state`](Self::change_to_previous_state), but
    /// only while the machine is still in `expected`. Checked under the
    /// transition lock.
    pub fn change_to_previous_state_from(
        &self,
        expected: usize,
        run_callback: bool,
    ) -> Result<(), StateMachineError> {
        self.return_to_previous(Some(expected), run_callback)
    }

    fn return_to_previous(
        &self,
        expected: Option<usize>,
        run_callback: bool,
    ) -> Result<(), StateMachineError> {
        self.table()?;
        let mut pos = self.lock_position()?;
        let from = pos.current;
        if let Some(expected) = expected
            && from != expected
        {
            return Err(StateMachineError::InvalidTransition {
                from,
                to: pos.previous,
            });
        }
        pos.current = pos.previous;
        let to = pos.current;
        drop(pos);
        info!(from, to, run_callback, "returned to previous state");
        if run_callback {
            self.shared.signal(to);
        }
        Ok(())
    }

    /// Current state id, read under the transition lock.
    pub fn current_state(&self) -> Result<usize, StateMachineError> {
        Ok(self.lock_position()?.current)
    }

    /// State before the last accepted transition.
    pub fn previous_state(&self) -> Result<usize, StateMachineError> {
        Ok(self.lock_position()?.previous)
    }

    /// Non-blocking read; `None` while a transition holds the lock.
    pub fn try_current_state(&self) -> Option<usize> {
        self.shared.position.try_lock().map(|pos| pos.current)
    }

    /// Name of a state in the installed table.
    pub fn state_name(&self, id: usize) -> Option<&'static str> {
        let table = self.shared.table.read();
        table.as_ref()?.get(id).map(|entry| entry.name)
    }

    fn commit(&self, pos: &mut Position, new: usize) {
        let from = pos.current;
        pos.previous = from;
        pos.current = new;
        info!(
            from = self.state_name(from).unwrap_or("?"),
            to = self.state_name(new).unwrap_or("?"),
            "state transition"
        );
        self.shared.signal(new);
    }

    fn table(&self) -> Result<Arc<[StateEntry]>, StateMachineError> {
        self.shared
            .table
            .read()
            .clone()
            .ok_or(StateMachineError::NotConfigured)
    }

    fn lock_position(&self) -> Result<parking_lot::MutexGuard<'_, Position>, StateMachineError> {
        self.shared
            .position
            .try_lock_for(STATE_LOCK_TIMEOUT)
            .ok_or(StateMachineError::LockTimeout)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StateMachine {
    fn drop(&mut self) {
        self.stop();
    }
}

fn validate_table(states: &[StateEntry]) -> Result<(), StateMachineError> {
    if states.is_empty() {
        return Err(StateMachineError::InvalidStates("empty table".to_string()));
    }
    let mut seen = vec![false; states.len()];
    for entry in states {
        let slot = seen.get_mut(entry.id).ok_or_else(|| {
            StateMachineError::InvalidStates(format!(
                "id {} of '{}' out of range",
                entry.id, entry.name
            ))
        })?;
        if std::mem::replace(slot, true) {
            return Err(StateMachineError::InvalidStates(format!(
                "duplicate id {}",
                entry.id
            )));
        }
    }
    Ok(())
}

fn run_loop(shared: &Shared, table: &[StateEntry]) {
    while shared.running.load(Ordering::SeqCst) {
        let next = {
            let mut pending = shared.pending.lock();
            if pending.is_none() {
                let _ = shared.wake.wait_for(&mut pending, STATE_LOOP_POLL);
            }
            pending.take()
        };
        let Some(state) = next else {
            continue;
        };
        match table.get(state) {
            Some(entry) => {
                trace!(state = entry.name, "entry callback");
                if let Some(callback) = &entry.on_enter {
                    callback();
                }
            }
            None => error!(state, "signal for unknown state"),
        }
    }
}

/// Pin the calling thread to `core`. No-op without the `rt` feature.
#[cfg(feature = "rt")]
fn pin_current_thread(core: usize) -> Result<(), String> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(core)
        .map_err(|e| format!("CpuSet::set({core}) failed: {e}"))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| format!("sched_setaffinity failed: {e}"))
}

#[cfg(not(feature = "rt"))]
fn pin_current_thread(_core: usize) -> Result<(), String> {
    Ok(())
}
