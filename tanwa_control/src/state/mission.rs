//! Mission state table.
//!
//! Entry behaviour per state. Callbacks run on the state machine thread and
//! reach the context through a `Weak`, so the table never keeps it alive.
//! Safing steps log their failures and carry on.

use crate::context::MissionContext;
use crate::indicator::{BuzzerPattern, LedPattern};
use crate::state::machine::StateEntry;
use std::sync::Weak;
use tanwa_common::mission::state::MissionState;
use tracing::{error, info, warn};

/// One entry per [`MissionState`], in id order.
pub fn mission_states(ctx: Weak<MissionContext>) -> Vec<StateEntry> {
    MissionState::ALL
        .into_iter()
        .map(|state| {
            let entry = StateEntry::new(state.id(), state.name());
            let ctx = ctx.clone();
            let enter: fn(&MissionContext) = match state {
                MissionState::Init => return entry,
                MissionState::Idle => enter_idle,
                MissionState::Fueling => enter_fueling,
                MissionState::ArmedToLaunch => enter_armed,
                MissionState::RdyToLaunch => enter_ready,
                MissionState::Countdown => enter_countdown,
                MissionState::Fire => enter_fire,
                MissionState::AfterBurnout => enter_after_burnout,
                MissionState::Hold => enter_hold,
                MissionState::Abort => enter_abort,
            };
            entry.on_enter(move || {
                if let Some(ctx) = ctx.upgrade() {
                    enter(&ctx);
                }
            })
        })
        .collect()
}

fn log_failure<E: std::fmt::Display>(step: &'static str, result: Result<(), E>) {
    if let Err(e) = result {
        error!(step, "{e}");
    }
}

fn enter_idle(ctx: &MissionContext) {
    ctx.indicators().set_buzzer(BuzzerPattern::Off);
    ctx.stop_timers();
    log_failure("close fill valve", ctx.fill_valve().force_close());
    log_failure("close depr valve", ctx.depr_valve().force_close());
    ctx.indicators().set_led(LedPattern::Idle);
}

fn enter_fueling(ctx: &MissionContext) {
    ctx.indicators().set_led(LedPattern::Fueling);
}

fn enter_armed(ctx: &MissionContext) {
    ctx.indicators().set_led(LedPattern::Armed);
}

fn enter_ready(ctx: &MissionContext) {
    ctx.indicators().set_led(LedPattern::Ready);
    log_failure(
        "start disconnect timer",
        ctx.disconnect_timer().start(ctx.disconnect_timeout()),
    );
}

fn enter_countdown(ctx: &MissionContext) {
    ctx.disconnect_timer().stop();
    let schedule = ctx.schedule();
    match ctx
        .ignition_timers()
        .start(schedule.countdown_ms, schedule.ignition_ms)
    {
        Ok(()) => {
            ctx.indicators().set_led(LedPattern::Countdown);
            ctx.indicators().set_buzzer(BuzzerPattern::Countdown);
            info!(
                countdown_ms = schedule.countdown_ms,
                ignition_ms = schedule.ignition_ms,
                "countdown running"
            );
        }
        Err(e) => {
            warn!("countdown not started, rolling back: {e}");
            // A newer transition (abort, hold) owns the state from here.
            if let Err(e) = ctx
                .machine()
                .change_to_previous_state_from(MissionState::Countdown.id(), false)
            {
                warn!("countdown rollback skipped: {e}");
                return;
            }
            log_failure(
                "restart disconnect timer",
                ctx.disconnect_timer().start(ctx.disconnect_timeout()),
            );
            ctx.indicators().set_led(LedPattern::Ready);
        }
    }
}

fn enter_fire(ctx: &MissionContext) {
    ctx.indicators().set_buzzer(BuzzerPattern::Off);
    ctx.indicators().set_led(LedPattern::Fire);
    log_failure(
        "start after-burnout timer",
        ctx.burnout_timer().start(ctx.burn_time()),
    );
}

fn enter_after_burnout(ctx: &MissionContext) {
    for igniter in ctx.igniters() {
        log_failure("disarm igniter", igniter.disarm());
    }
}

fn enter_hold(ctx: &MissionContext) {
    ctx.indicators().set_led(LedPattern::Hold);
}

fn enter_abort(ctx: &MissionContext) {
    ctx.indicators().set_buzzer(BuzzerPattern::Off);
    for igniter in ctx.igniters() {
        log_failure("disarm igniter", igniter.disarm());
    }
    log_failure("close fill valve", ctx.fill_valve().force_close());
    log_failure("open depr valve", ctx.depr_valve().force_open());
    log_failure("close fuel valve", ctx.fuel_valve().force_close());
    log_failure("close oxidizer valve", ctx.oxidizer_valve().force_close());
    ctx.stop_timers();
    ctx.indicators().set_led(LedPattern::Abort);
    info!("abort safing complete");
}
