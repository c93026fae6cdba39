//! Remote command handlers.
//!
//! One function per [`RemoteCommand`]. Handlers validate the mission state
//! and payload, then act on the context. Nothing is changed when a check
//! fails.

use crate::can::CanCommand;
use crate::context::MissionContext;
use crate::error::CommandError;
use crate::telemetry::store::WeightCell;
use std::time::Duration;
use tanwa_common::mission::can::Submodule;
use tanwa_common::mission::command::RemoteCommand;
use tanwa_common::mission::state::MissionState;
use tracing::info;

/// Handler signature stored in the registry.
pub type CommandHandler = fn(&MissionContext, i32) -> Result<(), CommandError>;

/// Handler for every command.
pub fn handler_for(command: RemoteCommand) -> CommandHandler {
    use RemoteCommand as C;
    match command {
        C::StateChange => state_change,
        C::Abort => abort,
        C::HoldIn => hold_in,
        C::HoldOut => hold_out,
        C::FillOpen => fill_open,
        C::FillClose => fill_close,
        C::FillOpenTimed => fill_open_timed,
        C::DeprOpen => depr_open,
        C::DeprClose => depr_close,
        C::DeprOpenTimed => depr_open_timed,
        C::FuelValveOpen => fuel_valve_open,
        C::FuelValveClose => fuel_valve_close,
        C::OxidizerValveOpen => oxidizer_valve_open,
        C::OxidizerValveClose => oxidizer_valve_close,
        C::IgniterArm => igniter_arm,
        C::IgniterDisarm => igniter_disarm,
        C::IgniterFire => igniter_fire,
        C::SoftResetSubmodule => soft_reset_submodule,
        C::ResetAllSubmodules => reset_all_submodules,
        C::RocketWeightTare => rocket_weight_tare,
        C::RocketWeightCalibrate => rocket_weight_calibrate,
        C::RocketWeightSetOffset => rocket_weight_set_offset,
        C::OxidizerWeightTare => oxidizer_weight_tare,
        C::OxidizerWeightCalibrate => oxidizer_weight_calibrate,
        C::OxidizerWeightSetOffset => oxidizer_weight_set_offset,
        C::HeatingStart => heating_start,
        C::HeatingStop => heating_stop,
        C::SetHeatingThreshold => set_heating_threshold,
        C::Restart => restart,
    }
}

// ─── Guards ─────────────────────────────────────────────────────────

fn reject(command: RemoteCommand, state: MissionState) -> CommandError {
    CommandError::InvalidState { command, state }
}

/// Manual actuation is locked out from the countdown until burnout.
fn manual_allowed(ctx: &MissionContext, command: RemoteCommand) -> Result<(), CommandError> {
    let state = ctx.state()?;
    if state == MissionState::Countdown || state == MissionState::Fire {
        return Err(reject(command, state));
    }
    Ok(())
}

fn positive_ms(command: RemoteCommand, payload: i32) -> Result<Duration, CommandError> {
    u64::try_from(payload)
        .ok()
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .ok_or(CommandError::InvalidPayload { command, payload })
}

// ─── Mission ────────────────────────────────────────────────────────

/// Advance to the next state. From the countdown on, states advance by
/// timer only.
pub fn state_change(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    let state = ctx.state()?;
    if state >= MissionState::Countdown {
        return Err(reject(RemoteCommand::StateChange, state));
    }
    ctx.machine().change_state(state.id() + 1)?;
    Ok(())
}

pub fn abort(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    ctx.abort()
}

/// Enter `Hold`, cancelling the countdown and the disconnect timer.
pub fn hold_in(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    let state = ctx.state()?;
    if matches!(state, MissionState::Hold | MissionState::Abort) || state.is_flight_window() {
        return Err(reject(RemoteCommand::HoldIn, state));
    }
    ctx.ignition_timers().stop();
    ctx.disconnect_timer().stop();
    ctx.force_state(MissionState::Hold)?;
    Ok(())
}

/// Leave `Hold`. A hold during the countdown falls back to `RdyToLaunch`.
pub fn hold_out(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    let state = ctx.state()?;
    if state != MissionState::Hold {
        return Err(reject(RemoteCommand::HoldOut, state));
    }
    if ctx.previous_state()? == MissionState::Countdown {
        ctx.force_state(MissionState::RdyToLaunch)?;
    } else {
        ctx.machine().change_to_previous_state(true)?;
    }
    Ok(())
}

/// Start over from a finished or aborted mission.
pub fn restart(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    let state = ctx.state()?;
    if !matches!(state, MissionState::Abort | MissionState::AfterBurnout) {
        return Err(reject(RemoteCommand::Restart, state));
    }
    info!(from = %state, "mission restart");
    ctx.force_state(MissionState::Idle)?;
    Ok(())
}

// ─── Valves ─────────────────────────────────────────────────────────

pub fn fill_open(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::FillOpen)?;
    Ok(ctx.fill_valve().open()?)
}

pub fn fill_close(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::FillClose)?;
    Ok(ctx.fill_valve().close()?)
}

pub fn fill_open_timed(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    let duration = positive_ms(RemoteCommand::FillOpenTimed, payload)?;
    manual_allowed(ctx, RemoteCommand::FillOpenTimed)?;
    Ok(ctx.fill_valve().open_timed(duration)?)
}

pub fn depr_open(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::DeprOpen)?;
    Ok(ctx.depr_valve().open()?)
}

pub fn depr_close(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::DeprClose)?;
    Ok(ctx.depr_valve().close()?)
}

pub fn depr_open_timed(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    let duration = positive_ms(RemoteCommand::DeprOpenTimed, payload)?;
    manual_allowed(ctx, RemoteCommand::DeprOpenTimed)?;
    Ok(ctx.depr_valve().open_timed(duration)?)
}

pub fn fuel_valve_open(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::FuelValveOpen)?;
    Ok(ctx.fuel_valve().open()?)
}

pub fn fuel_valve_close(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::FuelValveClose)?;
    Ok(ctx.fuel_valve().close()?)
}

pub fn oxidizer_valve_open(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::OxidizerValveOpen)?;
    Ok(ctx.oxidizer_valve().open()?)
}

pub fn oxidizer_valve_close(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    manual_allowed(ctx, RemoteCommand::OxidizerValveClose)?;
    Ok(ctx.oxidizer_valve().close()?)
}

// ─── Igniters ───────────────────────────────────────────────────────

/// Payload `0` selects both igniters, `1` and `2` a single one.
fn igniter_indices(command: RemoteCommand, payload: i32) -> Result<&'static [usize], CommandError> {
    match payload {
        0 => Ok(&[0, 1]),
        1 => Ok(&[0]),
        2 => Ok(&[1]),
        _ => Err(CommandError::InvalidPayload { command, payload }),
    }
}

pub fn igniter_arm(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    let indices = igniter_indices(RemoteCommand::IgniterArm, payload)?;
    let state = ctx.state()?;
    if !matches!(state, MissionState::ArmedToLaunch | MissionState::RdyToLaunch) {
        return Err(reject(RemoteCommand::IgniterArm, state));
    }
    for &i in indices {
        ctx.igniters()[i].arm()?;
    }
    Ok(())
}

/// Always allowed.
pub fn igniter_disarm(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    let indices = igniter_indices(RemoteCommand::IgniterDisarm, payload)?;
    for &i in indices {
        ctx.igniters()[i].disarm()?;
    }
    Ok(())
}

pub fn igniter_fire(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    let indices = igniter_indices(RemoteCommand::IgniterFire, payload)?;
    let state = ctx.state()?;
    if !matches!(state, MissionState::ArmedToLaunch | MissionState::RdyToLaunch) {
        return Err(reject(RemoteCommand::IgniterFire, state));
    }
    for &i in indices {
        ctx.igniters()[i].fire()?;
    }
    Ok(())
}

// ─── Submodules ─────────────────────────────────────────────────────

pub fn soft_reset_submodule(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    let submodule = u8::try_from(payload)
        .ok()
        .and_then(Submodule::from_u8)
        .ok_or(CommandError::InvalidPayload {
            command: RemoteCommand::SoftResetSubmodule,
            payload,
        })?;
    ctx.send_can(CanCommand::SoftReset(submodule))
}

pub fn reset_all_submodules(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    Submodule::ALL
        .into_iter()
        .try_for_each(|submodule| ctx.send_can(CanCommand::SoftReset(submodule)))
}

fn weight_tare(ctx: &MissionContext, cell: WeightCell) -> Result<(), CommandError> {
    ctx.send_can(CanCommand::WeightTare(cell))
}

fn weight_calibrate(
    ctx: &MissionContext,
    cell: WeightCell,
    command: RemoteCommand,
    grams: i32,
) -> Result<(), CommandError> {
    if grams <= 0 {
        return Err(CommandError::InvalidPayload {
            command,
            payload: grams,
        });
    }
    ctx.send_can(CanCommand::WeightCalibrate(cell, grams as f32))
}

pub fn rocket_weight_tare(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    weight_tare(ctx, WeightCell::Rocket)
}

pub fn rocket_weight_calibrate(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    weight_calibrate(
        ctx,
        WeightCell::Rocket,
        RemoteCommand::RocketWeightCalibrate,
        payload,
    )
}

pub fn rocket_weight_set_offset(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    ctx.send_can(CanCommand::WeightSetOffset(WeightCell::Rocket, payload as f32))
}

pub fn oxidizer_weight_tare(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    weight_tare(ctx, WeightCell::Oxidizer)
}

pub fn oxidizer_weight_calibrate(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    weight_calibrate(
        ctx,
        WeightCell::Oxidizer,
        RemoteCommand::OxidizerWeightCalibrate,
        payload,
    )
}

pub fn oxidizer_weight_set_offset(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    ctx.send_can(CanCommand::WeightSetOffset(
        WeightCell::Oxidizer,
        payload as f32,
    ))
}

pub fn heating_start(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    ctx.send_can(CanCommand::HeatingStart)
}

pub fn heating_stop(ctx: &MissionContext, _payload: i32) -> Result<(), CommandError> {
    ctx.send_can(CanCommand::HeatingStop)
}

/// Payload in hundredths of a degree Celsius.
pub fn set_heating_threshold(ctx: &MissionContext, payload: i32) -> Result<(), CommandError> {
    ctx.send_can(CanCommand::SetHeatingThreshold(payload as f32 / 100.0))
}
