//! Integration test: full launch sequence on a compressed schedule.
//!
//! IDLE → FUELING → ARMED_TO_LAUNCH → RDY_TO_LAUNCH → COUNTDOWN via
//! operator commands, then ignition, T-zero and burnout from the timers.

use std::time::Duration;
use tanwa_common::hal::consts::{IGNITER_1_FIRE_PIN, IGNITER_2_FIRE_PIN};
use tanwa_common::mission::command::{RemoteCommand, SUDO_BIT, Transport};
use tanwa_common::mission::state::MissionState;
use tanwa_common::mission::telemetry::{IgniterState, ValveState};
use tanwa_control::command::{CommandRegistry, Dispatcher, ParseOutcome};
use tanwa_control::context::CountdownSchedule;
use tanwa_control::error::CommandError;
use tanwa_control::indicator::LedPattern;

use super::{MissionFixture, OWN_ID, test_config, wait_until};

// ── Helpers ─────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(3);

fn fast_fixture() -> (MissionFixture, Dispatcher) {
    let mut config = test_config();
    config.mission.countdown_ms = -500;
    config.mission.ignition_ms = -250;
    config.mission.burn_time_ms = 150;
    let f = MissionFixture::start(&config);
    let dispatcher = Dispatcher::new(f.ctx.clone(), CommandRegistry::with_defaults(), OWN_ID);
    (f, dispatcher)
}

fn step(f: &MissionFixture, dispatcher: &Dispatcher, expect: MissionState, led: LedPattern) {
    assert_eq!(
        dispatcher.parse(Transport::Radio, OWN_ID, RemoteCommand::StateChange.id(), 0),
        ParseOutcome::Accepted(RemoteCommand::StateChange)
    );
    assert_eq!(f.ctx.state().unwrap(), expect);
    assert!(
        wait_until(WAIT, || f.indicators.led() == led),
        "{expect}: LED stuck at {:?}",
        f.indicators.led()
    );
}

fn fired(f: &MissionFixture, pin: u8) -> bool {
    f.board.gpio.writes().contains(&(pin, true))
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn operator_sequence_to_burnout() {
    let (f, dispatcher) = fast_fixture();
    f.ctx.change_state(MissionState::Idle).unwrap();
    assert!(wait_until(WAIT, || f.indicators.led() == LedPattern::Idle));

    step(&f, &dispatcher, MissionState::Fueling, LedPattern::Fueling);
    step(&f, &dispatcher, MissionState::ArmedToLaunch, LedPattern::Armed);
    step(&f, &dispatcher, MissionState::RdyToLaunch, LedPattern::Ready);
    assert!(wait_until(WAIT, || f.ctx.disconnect_timer().is_active()));
    step(&f, &dispatcher, MissionState::Countdown, LedPattern::Countdown);

    assert!(
        wait_until(WAIT, || f.ctx.state().unwrap() == MissionState::AfterBurnout),
        "stuck in {}",
        f.ctx.state().unwrap()
    );
    assert_eq!(f.ctx.previous_state().unwrap(), MissionState::Fire);

    assert!(fired(&f, IGNITER_1_FIRE_PIN));
    assert!(fired(&f, IGNITER_2_FIRE_PIN));
    let open_us = test_config().valves.servo_open_us;
    for servo in &f.board.servos {
        assert_eq!(servo.pulse_us(), open_us);
    }
    assert_eq!(f.ctx.fuel_valve().state(), ValveState::Open);
    assert_eq!(f.ctx.oxidizer_valve().state(), ValveState::Open);

    assert!(wait_until(WAIT, || {
        f.ctx.actuator_readings().igniters == [IgniterState::Disarmed; 2]
    }));
    assert!(!f.ctx.disconnect_timer().is_active());
}

#[test]
fn operator_cannot_skip_the_countdown() {
    let (f, dispatcher) = fast_fixture();
    f.ctx.force_state(MissionState::Countdown).unwrap();
    assert_eq!(
        dispatcher.parse(Transport::Radio, OWN_ID, RemoteCommand::StateChange.id(), 0),
        ParseOutcome::Rejected(CommandError::InvalidState {
            command: RemoteCommand::StateChange,
            state: MissionState::Countdown,
        })
    );
}

#[test]
fn manual_valves_locked_during_countdown() {
    let (f, dispatcher) = fast_fixture();
    f.ctx.set_schedule(CountdownSchedule {
        countdown_ms: -60_000,
        ignition_ms: -30_000,
    });
    f.ctx.force_state(MissionState::RdyToLaunch).unwrap();
    f.ctx.change_state(MissionState::Countdown).unwrap();
    assert!(wait_until(WAIT, || f.ctx.ignition_timers().is_active()));

    for command in [RemoteCommand::FillOpen, RemoteCommand::DeprOpen] {
        assert!(matches!(
            dispatcher.parse(Transport::Radio, OWN_ID, command.id(), 0),
            ParseOutcome::Rejected(CommandError::InvalidState { .. })
        ));
    }
    assert!(matches!(
        dispatcher.parse(
            Transport::Radio,
            OWN_ID | SUDO_BIT,
            RemoteCommand::FuelValveOpen.id(),
            0
        ),
        ParseOutcome::Rejected(_)
    ));
    assert_eq!(f.ctx.fill_valve().state(), ValveState::Unknown);
    assert_eq!(f.ctx.fuel_valve().state(), ValveState::Unknown);
}

#[test]
fn restart_after_burnout_returns_to_idle() {
    let (f, dispatcher) = fast_fixture();
    f.ctx.force_state(MissionState::AfterBurnout).unwrap();
    assert!(matches!(
        dispatcher.parse(Transport::Radio, OWN_ID, RemoteCommand::Restart.id(), 0),
        ParseOutcome::Rejected(CommandError::Unprivileged(RemoteCommand::Restart))
    ));
    assert!(
        dispatcher
            .parse(Transport::Radio, OWN_ID | SUDO_BIT, RemoteCommand::Restart.id(), 0)
            .is_accepted()
    );
    assert!(wait_until(WAIT, || f.indicators.led() == LedPattern::Idle));
    assert_eq!(f.ctx.state().unwrap(), MissionState::Idle);
}
