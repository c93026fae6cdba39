//! Integration test: countdown start, rollback and hold.
//!
//! Validates the COUNTDOWN entry against real timers:
//! 1. A valid schedule arms ignition and T-zero and starts the mission clock
//! 2. An invalid schedule rolls back to RDY_TO_LAUNCH with the disconnect
//!    timer running again
//! 3. HOLD cancels a running countdown

use std::time::Duration;
use tanwa_common::mission::command::{RemoteCommand, Transport};
use tanwa_common::mission::state::MissionState;
use tanwa_control::command::{CommandRegistry, Dispatcher};
use tanwa_control::context::CountdownSchedule;
use tanwa_control::indicator::LedPattern;

use super::{MissionFixture, OWN_ID, test_config, wait_until};

// ── Helpers ─────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(2);

fn ready(f: &MissionFixture) {
    f.ctx.force_state(MissionState::RdyToLaunch).unwrap();
    assert!(wait_until(WAIT, || f.ctx.disconnect_timer().is_active()));
    assert_eq!(f.indicators.led(), LedPattern::Ready);
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn valid_schedule_starts_countdown() {
    let f = MissionFixture::start(&test_config());
    ready(&f);
    f.ctx.set_schedule(CountdownSchedule {
        countdown_ms: -50_000,
        ignition_ms: -40_000,
    });

    f.ctx.change_state(MissionState::Countdown).unwrap();
    let timers = f.ctx.ignition_timers();
    assert!(wait_until(WAIT, || timers.is_active()));

    assert_eq!(
        timers.ignition_timer().period(),
        Some(Duration::from_millis(10_000))
    );
    assert_eq!(
        timers.burn_timer().period(),
        Some(Duration::from_millis(50_000))
    );
    let t = f.ctx.mission_timer().get_time();
    assert!((-50_000..=-49_000).contains(&t), "mission time {t}");

    assert!(wait_until(WAIT, || !f.ctx.disconnect_timer().is_active()));
    assert!(wait_until(WAIT, || f.indicators.led() == LedPattern::Countdown));
    assert_eq!(f.ctx.state().unwrap(), MissionState::Countdown);
}

#[test]
fn mission_clock_counts_up_towards_t_zero() {
    let f = MissionFixture::start(&test_config());
    ready(&f);
    f.ctx.change_state(MissionState::Countdown).unwrap();
    assert!(wait_until(WAIT, || f.ctx.mission_timer().is_enabled()));

    let first = f.ctx.mission_timer().get_time();
    std::thread::sleep(Duration::from_millis(100));
    let second = f.ctx.mission_timer().get_time();
    assert!(second > first, "{second} <= {first}");
    assert!(second < 0);
}

#[test]
fn ignition_after_countdown_rolls_back() {
    let f = MissionFixture::start(&test_config());
    ready(&f);
    f.ctx.set_schedule(CountdownSchedule {
        countdown_ms: -30_000,
        ignition_ms: -40_000,
    });

    f.ctx.change_state(MissionState::Countdown).unwrap();
    assert!(wait_until(WAIT, || {
        f.ctx.state().unwrap() == MissionState::RdyToLaunch
    }));
    assert!(wait_until(WAIT, || f.ctx.disconnect_timer().is_active()));
    assert!(wait_until(WAIT, || f.indicators.led() == LedPattern::Ready));

    assert!(!f.ctx.ignition_timers().is_active());
    assert!(!f.ctx.mission_timer().is_enabled());
    assert_eq!(
        f.ctx.mission_timer().get_time(),
        f.ctx.mission_timer().disable_value()
    );
}

#[test]
fn positive_ignition_time_rolls_back() {
    let f = MissionFixture::start(&test_config());
    ready(&f);
    f.ctx.set_schedule(CountdownSchedule {
        countdown_ms: -10_000,
        ignition_ms: 500,
    });

    f.ctx.change_state(MissionState::Countdown).unwrap();
    assert!(wait_until(WAIT, || {
        f.ctx.state().unwrap() == MissionState::RdyToLaunch
    }));
    assert!(!f.ctx.ignition_timers().is_active());
}

#[test]
fn hold_cancels_running_countdown() {
    let f = MissionFixture::start(&test_config());
    let dispatcher = Dispatcher::new(f.ctx.clone(), CommandRegistry::with_defaults(), OWN_ID);
    ready(&f);
    f.ctx.change_state(MissionState::Countdown).unwrap();
    assert!(wait_until(WAIT, || f.ctx.ignition_timers().is_active()));

    assert!(
        dispatcher
            .parse(Transport::Radio, OWN_ID, RemoteCommand::HoldIn.id(), 0)
            .is_accepted()
    );
    assert_eq!(f.ctx.state().unwrap(), MissionState::Hold);
    assert!(!f.ctx.ignition_timers().is_active());
    assert!(!f.ctx.mission_timer().is_enabled());
    assert!(!f.ctx.disconnect_timer().is_active());
    assert!(wait_until(WAIT, || f.indicators.led() == LedPattern::Hold));

    assert!(
        dispatcher
            .parse(Transport::Radio, OWN_ID, RemoteCommand::HoldOut.id(), 0)
            .is_accepted()
    );
    assert_eq!(f.ctx.state().unwrap(), MissionState::RdyToLaunch);
    assert!(wait_until(WAIT, || f.ctx.disconnect_timer().is_active()));
}
