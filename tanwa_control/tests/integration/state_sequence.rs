//! Integration test: generic state machine driven through a five-state
//! launch-like table.
//!
//! Entry callbacks run on the loop thread, so every step waits for the
//! callback before moving on.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tanwa_control::error::StateMachineError;
use tanwa_control::state::{StateEntry, StateMachine, TaskConfig};

use super::wait_until;

// ── Helpers ─────────────────────────────────────────────────────────

const INIT: usize = 0;
const IDLE: usize = 1;
const ARMED: usize = 2;
const COUNTDOWN: usize = 3;
const FIRE: usize = 4;
const NAMES: [&str; 5] = ["INIT", "IDLE", "ARMED", "COUNTDOWN", "FIRE"];

fn machine() -> (StateMachine, Arc<Mutex<Vec<usize>>>) {
    let entered = Arc::new(Mutex::new(Vec::new()));
    let table = NAMES
        .iter()
        .enumerate()
        .map(|(id, &name)| {
            let entered = entered.clone();
            StateEntry::new(id, name).on_enter(move || entered.lock().push(id))
        })
        .collect();
    let sm = StateMachine::new();
    sm.set_states(table).unwrap();
    sm.run(TaskConfig {
        name: "sm-sequence".to_string(),
        core: None,
    })
    .unwrap();
    (sm, entered)
}

fn entered_last(entered: &Mutex<Vec<usize>>, id: usize) -> bool {
    wait_until(Duration::from_secs(2), || entered.lock().last() == Some(&id))
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn run_enters_initial_state() {
    let (sm, entered) = machine();
    assert!(entered_last(&entered, INIT));
    assert_eq!(sm.current_state().unwrap(), INIT);
    assert_eq!(sm.state_name(INIT), Some("INIT"));
    sm.stop();
}

#[test]
fn sequential_walk_runs_each_callback_once() {
    let (sm, entered) = machine();
    assert!(entered_last(&entered, INIT));

    for next in [IDLE, ARMED, COUNTDOWN, FIRE] {
        sm.change_state(next).unwrap();
        assert!(entered_last(&entered, next), "callback for {next} missing");
        assert_eq!(sm.previous_state().unwrap(), next - 1);
    }
    assert_eq!(*entered.lock(), vec![INIT, IDLE, ARMED, COUNTDOWN, FIRE]);
    sm.stop();
}

#[test]
fn skipping_ahead_requires_force() {
    let (sm, entered) = machine();
    assert!(entered_last(&entered, INIT));

    assert!(matches!(
        sm.change_state(COUNTDOWN),
        Err(StateMachineError::InvalidTransition { from: INIT, to: COUNTDOWN })
    ));
    assert_eq!(sm.current_state().unwrap(), INIT);

    sm.force_change_state(FIRE).unwrap();
    assert!(entered_last(&entered, FIRE));
    assert_eq!(sm.previous_state().unwrap(), INIT);

    assert!(sm.force_change_state(NAMES.len()).is_err());
    assert_eq!(sm.current_state().unwrap(), FIRE);
    sm.stop();
}

#[test]
fn backwards_transition_is_rejected_without_force() {
    let (sm, entered) = machine();
    sm.force_change_state(ARMED).unwrap();
    assert!(entered_last(&entered, ARMED));

    assert!(sm.change_state(IDLE).is_err());
    sm.force_change_state(IDLE).unwrap();
    assert!(entered_last(&entered, IDLE));
    sm.stop();
}

#[test]
fn rollback_without_callback_is_silent() {
    let (sm, entered) = machine();
    sm.force_change_state(ARMED).unwrap();
    assert!(entered_last(&entered, ARMED));
    sm.change_state(COUNTDOWN).unwrap();
    assert!(entered_last(&entered, COUNTDOWN));

    sm.change_to_previous_state(false).unwrap();
    assert_eq!(sm.current_state().unwrap(), ARMED);
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(entered.lock().last(), Some(&COUNTDOWN));

    sm.change_state(COUNTDOWN).unwrap();
    sm.change_to_previous_state(true).unwrap();
    assert!(entered_last(&entered, ARMED));
    sm.stop();
}

#[test]
fn stopped_machine_keeps_position_and_can_restart() {
    let (sm, entered) = machine();
    sm.change_state(IDLE).unwrap();
    assert!(entered_last(&entered, IDLE));
    sm.stop();
    sm.stop();
    assert!(!sm.is_running());

    sm.change_state(ARMED).unwrap();
    assert_eq!(sm.current_state().unwrap(), ARMED);

    sm.run(TaskConfig {
        name: "sm-sequence".to_string(),
        core: None,
    })
    .unwrap();
    assert!(entered_last(&entered, ARMED));
    sm.stop();
}
