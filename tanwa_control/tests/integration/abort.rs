//! Integration test: abort from every non-flight state and the disconnect
//! watchdog.

use std::time::Duration;
use tanwa_common::mission::command::{ALL_SUDO_ID, RemoteCommand, Transport};
use tanwa_common::mission::state::MissionState;
use tanwa_common::mission::telemetry::{IgniterState, ValveState};
use tanwa_control::can::CanCommand;
use tanwa_control::command::{CommandRegistry, Dispatcher, ParseOutcome};
use tanwa_control::error::CommandError;
use tanwa_control::indicator::LedPattern;

use super::{MissionFixture, OWN_ID, test_config, wait_until};

// ── Helpers ─────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(2);

const ABORTABLE: [MissionState; 7] = [
    MissionState::Init,
    MissionState::Idle,
    MissionState::Fueling,
    MissionState::ArmedToLaunch,
    MissionState::RdyToLaunch,
    MissionState::Countdown,
    MissionState::Hold,
];

fn assert_safed(f: &MissionFixture) {
    assert!(wait_until(WAIT, || f.indicators.led() == LedPattern::Abort));
    let readings = f.ctx.actuator_readings();
    assert_eq!(readings.fill_valve, ValveState::Closed);
    assert_eq!(readings.depr_valve, ValveState::Open);
    assert_eq!(readings.fuel_valve, ValveState::Closed);
    assert_eq!(readings.oxidizer_valve, ValveState::Closed);
    assert_eq!(readings.igniters, [IgniterState::Disarmed; 2]);
    assert!(!f.ctx.ignition_timers().is_active());
    assert!(!f.ctx.disconnect_timer().is_active());
    assert!(!f.ctx.burnout_timer().is_active());
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn abort_from_every_non_flight_state() {
    for state in ABORTABLE {
        let f = MissionFixture::start(&test_config());
        f.ctx.force_state(state).unwrap();
        assert!(
            wait_until(WAIT, || f.ctx.machine().try_current_state() == Some(state.id())),
            "{state} not reached"
        );

        f.ctx.abort().unwrap();
        assert_eq!(f.ctx.state().unwrap(), MissionState::Abort);
        assert_eq!(f.ctx.previous_state().unwrap(), state);
        assert_safed(&f);
    }
}

#[test]
fn abort_is_refused_in_flight_and_when_aborted() {
    for state in [
        MissionState::Fire,
        MissionState::AfterBurnout,
        MissionState::Abort,
    ] {
        let f = MissionFixture::start(&test_config());
        f.ctx.force_state(state).unwrap();
        assert!(matches!(
            f.ctx.abort(),
            Err(CommandError::InvalidState { state: s, .. }) if s == state
        ));
        assert_eq!(f.ctx.state().unwrap(), state);
    }
}

#[test]
fn abort_command_over_radio_then_restart() {
    let f = MissionFixture::start(&test_config());
    let dispatcher = Dispatcher::new(f.ctx.clone(), CommandRegistry::with_defaults(), OWN_ID);
    f.ctx.force_state(MissionState::Fueling).unwrap();
    f.ctx.fill_valve().open().unwrap();

    assert_eq!(
        dispatcher.parse(Transport::Radio, OWN_ID, RemoteCommand::Abort.id(), 0),
        ParseOutcome::Accepted(RemoteCommand::Abort)
    );
    assert_safed(&f);

    assert_eq!(
        dispatcher.parse(Transport::Radio, ALL_SUDO_ID, RemoteCommand::Restart.id(), 0),
        ParseOutcome::Accepted(RemoteCommand::Restart)
    );
    assert!(wait_until(WAIT, || f.indicators.led() == LedPattern::Idle));
    assert_eq!(f.ctx.state().unwrap(), MissionState::Idle);
    assert_eq!(f.ctx.depr_valve().state(), ValveState::Closed);
}

#[test]
fn disconnect_timeout_releases_umbilical_and_aborts() {
    let mut config = test_config();
    config.mission.disconnect_timeout_ms = 100;
    config.mission.disconnect_run_ms = 2_500;
    let f = MissionFixture::start(&config);

    f.ctx.force_state(MissionState::RdyToLaunch).unwrap();
    assert!(wait_until(WAIT, || {
        f.ctx.state().unwrap() == MissionState::Abort
    }));
    assert_safed(&f);

    let queued = f.ctx.can_tx().pop_timeout(Duration::ZERO).unwrap();
    assert_eq!(queued, CanCommand::Disconnect(2_500).encode());
}

#[test]
fn countdown_cancels_disconnect_watchdog() {
    let mut config = test_config();
    config.mission.disconnect_timeout_ms = 300;
    let f = MissionFixture::start(&config);

    f.ctx.force_state(MissionState::RdyToLaunch).unwrap();
    assert!(wait_until(WAIT, || f.ctx.disconnect_timer().is_active()));
    f.ctx.change_state(MissionState::Countdown).unwrap();
    assert!(wait_until(WAIT, || !f.ctx.disconnect_timer().is_active()));

    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(f.ctx.state().unwrap(), MissionState::Countdown);
    assert!(f.ctx.can_tx().is_empty());
}
