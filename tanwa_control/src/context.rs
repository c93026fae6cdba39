//! Mission context.
//!
//! Owns every component the entry callbacks, timer callbacks and command
//! handlers act on. Callbacks hold a `Weak` back-reference, so dropping the
//! last `Arc` tears the whole graph down.
//!
//! ```text
//!               ┌─────────────── MissionContext ───────────────┐
//!  commands ──► │ StateMachine   igniters   valves   indicators│
//!               │ MissionTimer   LiquidIgnitionTimers           │
//!               │ after-burnout timer   disconnect timer        │
//!               │ TelemetryStore   CanTxQueue                   │
//!               └──────────────────────────────────────────────┘
//! ```

use crate::actuator::igniter::IgniterPins;
use crate::actuator::{Igniter, ServoValve, SolenoidValve};
use crate::can::{CanCommand, CanTxQueue};
use crate::config::TanwaConfig;
use crate::error::{CommandError, StateMachineError, TanwaError};
use crate::indicator::Indicators;
use crate::state::machine::StateMachine;
use crate::state::mission;
use crate::telemetry::store::TelemetryStore;
use crate::timer::{LiquidIgnitionTimers, MissionTimer, OneShotTimer};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tanwa_common::consts::IGNITER_COUNT;
use tanwa_common::hal::board::BoardPeripherals;
use tanwa_common::hal::consts::{
    IGNITER_1_ARM_PIN, IGNITER_1_FIRE_PIN, IGNITER_2_ARM_PIN, IGNITER_2_FIRE_PIN,
    SOLENOID_DEPR_PIN, SOLENOID_FILL_PIN,
};
use tanwa_common::mission::state::MissionState;
use tanwa_common::mission::telemetry::ActuatorReadings;
use tracing::{error, info, warn};

const IGNITER_PINS: [IgniterPins; IGNITER_COUNT] = [
    IgniterPins {
        arm: IGNITER_1_ARM_PIN,
        fire: IGNITER_1_FIRE_PIN,
    },
    IgniterPins {
        arm: IGNITER_2_ARM_PIN,
        fire: IGNITER_2_FIRE_PIN,
    },
];
const IGNITER_NAMES: [&str; IGNITER_COUNT] = ["igniter_1", "igniter_2"];

/// Countdown schedule relative to T-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownSchedule {
    pub countdown_ms: i64,
    pub ignition_ms: i64,
}

pub struct MissionContext {
    machine: StateMachine,
    igniters: [Igniter; IGNITER_COUNT],
    fill_valve: Arc<SolenoidValve>,
    depr_valve: Arc<SolenoidValve>,
    fuel_valve: ServoValve,
    oxidizer_valve: ServoValve,
    indicators: Arc<dyn Indicators>,
    store: Arc<TelemetryStore>,
    can_tx: Arc<CanTxQueue>,
    mission_timer: Arc<MissionTimer>,
    ignition_timers: LiquidIgnitionTimers,
    burnout_timer: OneShotTimer,
    disconnect_timer: OneShotTimer,
    schedule: Mutex<CountdownSchedule>,
    burn_time: Duration,
    disconnect_timeout: Duration,
    disconnect_run_ms: u32,
}

impl MissionContext {
    /// Build the context and install the mission state table. The state
    /// machine is configured but not running.
    pub fn build(
        config: &TanwaConfig,
        board: &BoardPeripherals,
        indicators: Arc<dyn Indicators>,
        store: Arc<TelemetryStore>,
        can_tx: Arc<CanTxQueue>,
    ) -> Result<Arc<Self>, TanwaError> {
        let ctx = Arc::new_cyclic(|me: &Weak<Self>| {
            Self::new(me, config, board, indicators, store, can_tx)
        });
        ctx.machine
            .set_states(mission::mission_states(Arc::downgrade(&ctx)))?;
        Ok(ctx)
    }

    fn new(
        me: &Weak<Self>,
        config: &TanwaConfig,
        board: &BoardPeripherals,
        indicators: Arc<dyn Indicators>,
        store: Arc<TelemetryStore>,
        can_tx: Arc<CanTxQueue>,
    ) -> Self {
        let threshold = config.telemetry.continuity_threshold_mv;
        let igniters = std::array::from_fn(|i| {
            Igniter::new(
                IGNITER_NAMES[i],
                board.gpio.clone(),
                IGNITER_PINS[i],
                board.adc.igniter_continuity[i].clone(),
                threshold,
            )
        });
        let [fuel_pwm, oxidizer_pwm] = board.servo_pwm.clone();
        let valves = &config.valves;
        let mission_timer = Arc::new(MissionTimer::new(config.mission.mission_timer_disabled));

        Self {
            machine: StateMachine::new(),
            igniters,
            fill_valve: SolenoidValve::new("fill_valve", board.gpio.clone(), SOLENOID_FILL_PIN),
            depr_valve: SolenoidValve::new("depr_valve", board.gpio.clone(), SOLENOID_DEPR_PIN),
            fuel_valve: ServoValve::new(
                "fuel_valve",
                fuel_pwm,
                valves.servo_open_us,
                valves.servo_close_us,
            ),
            oxidizer_valve: ServoValve::new(
                "oxidizer_valve",
                oxidizer_pwm,
                valves.servo_open_us,
                valves.servo_close_us,
            ),
            indicators,
            store,
            can_tx,
            ignition_timers: LiquidIgnitionTimers::new(
                OneShotTimer::new("ignition", on_expiry(me, Self::on_ignition)),
                OneShotTimer::new("burn", on_expiry(me, Self::on_t_zero)),
                mission_timer.clone(),
            ),
            mission_timer,
            burnout_timer: OneShotTimer::new("after_burnout", on_expiry(me, Self::on_burnout)),
            disconnect_timer: OneShotTimer::new(
                "disconnect",
                on_expiry(me, Self::on_disconnect_timeout),
            ),
            schedule: Mutex::new(CountdownSchedule {
                countdown_ms: config.mission.countdown_ms,
                ignition_ms: config.mission.ignition_ms,
            }),
            burn_time: config.burn_time(),
            disconnect_timeout: config.disconnect_timeout(),
            disconnect_run_ms: config.mission.disconnect_run_ms,
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Mission state machine.
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Igniters 1 and 2.
    pub fn igniters(&self) -> &[Igniter; IGNITER_COUNT] {
        &self.igniters
    }

    pub fn fill_valve(&self) -> &SolenoidValve {
        &self.fill_valve
    }

    pub fn depr_valve(&self) -> &SolenoidValve {
        &self.depr_valve
    }

    /// Main fuel valve.
    pub fn fuel_valve(&self) -> &ServoValve {
        &self.fuel_valve
    }

    /// Main oxidizer valve.
    pub fn oxidizer_valve(&self) -> &ServoValve {
        &self.oxidizer_valve
    }

    /// Status LED and buzzer.
    pub fn indicators(&self) -> &dyn Indicators {
        self.indicators.as_ref()
    }

    /// Shared telemetry snapshot.
    pub fn store(&self) -> &Arc<TelemetryStore> {
        &self.store
    }

    /// Outbound submodule frames.
    pub fn can_tx(&self) -> &Arc<CanTxQueue> {
        &self.can_tx
    }

    /// Mission clock, relative to T-zero.
    pub fn mission_timer(&self) -> &Arc<MissionTimer> {
        &self.mission_timer
    }

    /// Countdown timers started on entering `Countdown`.
    pub fn ignition_timers(&self) -> &LiquidIgnitionTimers {
        &self.ignition_timers
    }

    /// Moves `Fire` to `AfterBurnout` once the burn time elapses.
    pub fn burnout_timer(&self) -> &OneShotTimer {
        &self.burnout_timer
    }

    /// Aborts a pad left in `RdyToLaunch` too long.
    pub fn disconnect_timer(&self) -> &OneShotTimer {
        &self.disconnect_timer
    }

    /// Engine burn time.
    pub fn burn_time(&self) -> Duration {
        self.burn_time
    }

    /// Period of the disconnect timer.
    pub fn disconnect_timeout(&self) -> Duration {
        self.disconnect_timeout
    }

    /// Countdown schedule used by the next countdown.
    pub fn schedule(&self) -> CountdownSchedule {
        *self.schedule.lock()
    }

    /// Replace the countdown schedule. Checked when the countdown starts.
    pub fn set_schedule(&self, schedule: CountdownSchedule) {
        info!(
            countdown_ms = schedule.countdown_ms,
            ignition_ms = schedule.ignition_ms,
            "countdown schedule updated"
        );
        *self.schedule.lock() = schedule;
    }

    // ─── Mission State ──────────────────────────────────────────────

    /// Current mission state.
    pub fn state(&self) -> Result<MissionState, StateMachineError> {
        let id = self.machine.current_state()?;
        MissionState::from_id(id).ok_or(StateMachineError::InvalidTransition { from: id, to: id })
    }

    /// State before the last transition.
    pub fn previous_state(&self) -> Result<MissionState, StateMachineError> {
        let id = self.machine.previous_state()?;
        MissionState::from_id(id).ok_or(StateMachineError::InvalidTransition { from: id, to: id })
    }

    /// Best-effort state for telemetry; `Init` while a transition holds
    /// the lock.
    pub fn state_hint(&self) -> MissionState {
        self.machine
            .try_current_state()
            .and_then(MissionState::from_id)
            .unwrap_or_default()
    }

    /// Advance to the next state in sequence.
    pub fn change_state(&self, state: MissionState) -> Result<(), StateMachineError> {
        self.machine.change_state(state.id())
    }

    /// Jump to any state.
    pub fn force_state(&self, state: MissionState) -> Result<(), StateMachineError> {
        self.machine.force_change_state(state.id())
    }

    /// Force `Abort` unless already there or in flight.
    ///
    /// Timers stop before the transition is queued, so a countdown can no
    /// longer fire once this returns.
    pub fn abort(&self) -> Result<(), CommandError> {
        let state = self.state()?;
        if state == MissionState::Abort || state.is_flight_window() {
            return Err(CommandError::InvalidState {
                command: tanwa_common::mission::command::RemoteCommand::Abort,
                state,
            });
        }
        warn!(from = %state, "mission abort");
        self.stop_timers();
        self.force_state(MissionState::Abort)?;
        Ok(())
    }

    /// Queue a submodule command.
    pub fn send_can(&self, command: CanCommand) -> Result<(), CommandError> {
        if self.can_tx.push(command.encode()) {
            Ok(())
        } else {
            Err(CommandError::QueueFull)
        }
    }

    /// Current actuator states for telemetry.
    pub fn actuator_readings(&self) -> ActuatorReadings {
        ActuatorReadings {
            fill_valve: self.fill_valve.state(),
            depr_valve: self.depr_valve.state(),
            fuel_valve: self.fuel_valve.state(),
            oxidizer_valve: self.oxidizer_valve.state(),
            igniters: [self.igniters[0].state(), self.igniters[1].state()],
        }
    }

    /// Stop every mission timer (countdown, burnout and disconnect).
    pub fn stop_timers(&self) {
        self.ignition_timers.stop();
        self.burnout_timer.stop();
        self.disconnect_timer.stop();
    }

    // ─── Timer Callbacks ────────────────────────────────────────────

    /// Whether a countdown callback may still act.
    fn in_countdown(&self, event: &'static str) -> bool {
        match self.state() {
            Ok(MissionState::Countdown) => true,
            Ok(state) => {
                warn!(event, state = %state, "countdown event outside COUNTDOWN ignored");
                false
            }
            Err(e) => {
                error!(event, "state unreadable, countdown event ignored: {e}");
                false
            }
        }
    }

    fn on_ignition(&self) {
        if !self.in_countdown("ignition") {
            return;
        }
        info!("ignition");
        for igniter in &self.igniters {
            if let Err(e) = igniter.arm().and_then(|()| igniter.fire()) {
                error!(igniter = igniter.name(), "ignition failed: {e}");
            }
        }
    }

    fn on_t_zero(&self) {
        if !self.in_countdown("T-zero") {
            return;
        }
        info!("T-zero, opening main valves");
        for valve in [&self.fuel_valve, &self.oxidizer_valve] {
            if let Err(e) = valve.force_open() {
                error!(valve = valve.name(), "main valve open failed: {e}");
            }
        }
        if let Err(e) = self.change_state(MissionState::Fire) {
            error!("transition to FIRE failed: {e}");
        }
    }

    fn on_burnout(&self) {
        if let Err(e) = self.change_state(MissionState::AfterBurnout) {
            error!("transition to AFTER_BURNOUT failed: {e}");
        }
    }

    fn on_disconnect_timeout(&self) {
        warn!(
            timeout_s = self.disconnect_timeout.as_secs(),
            "disconnect timer expired"
        );
        if let Err(e) = self.send_can(CanCommand::Disconnect(self.disconnect_run_ms)) {
            error!("disconnect command not queued: {e}");
        }
        match self.state() {
            Ok(state) if state == MissionState::Abort || state.is_flight_window() => {}
            Ok(_) => {
                self.stop_timers();
                if let Err(e) = self.force_state(MissionState::Abort) {
                    error!("abort after disconnect timeout failed: {e}");
                }
            }
            Err(e) => error!("state unreadable after disconnect timeout: {e}"),
        }
    }
}

/// Timer callback running `action` on the context, if it is still alive.
fn on_expiry(
    me: &Weak<MissionContext>,
    action: fn(&MissionContext),
) -> impl Fn() + Send + Sync + 'static {
    let me = me.clone();
    move || {
        if let Some(ctx) = me.upgrade() {
            action(&ctx);
        }
    }
}
