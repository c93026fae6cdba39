//! Integration test: full station on the simulation board.
//!
//! Startup, CAN relay, submodule soft-reset requests, radio frames, valve
//! telemetry, the telemetry sampler and shutdown.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tanwa_common::mission::can::{
    CanFrame, REMOTE_COMMAND_ID, REQUEST_SOFT_RESET, Submodule, response_offset,
};
use tanwa_common::mission::command::RemoteCommand;
use tanwa_common::mission::state::MissionState;
use tanwa_common::mission::telemetry::ValveState;
use tanwa_control::can::CanCommand;
use tanwa_control::command::ParseOutcome;
use tanwa_control::config::TanwaConfig;
use tanwa_control::indicator::{GpioIndicators, LedPattern};
use tanwa_control::link::LinkCommand;
use tanwa_control::station::Station;
use tanwa_control::telemetry::RecordSink;
use tanwa_hal::SimulationBoard;

use super::{OWN_ID, test_config, wait_until};

// ── Helpers ─────────────────────────────────────────────────────────

const WAIT: Duration = Duration::from_secs(3);

#[derive(Default)]
struct Collect(Mutex<Vec<String>>);

impl RecordSink for Collect {
    fn push(&self, line: &str) -> bool {
        self.0.lock().push(line.to_owned());
        true
    }
}

struct Running {
    board: SimulationBoard,
    indicators: Arc<GpioIndicators>,
    records: Arc<Collect>,
    station: Station,
}

fn station_config() -> TanwaConfig {
    let mut config = test_config();
    config.can.poll_period_ms = 20;
    config.can.rx_wait_ms = 10;
    config.can.rx_wait_boost_ms = 2;
    config.telemetry.sample_period_ms = 20;
    config
}

fn start() -> Running {
    let board = SimulationBoard::new();
    let peripherals = board.peripherals();
    let indicators = Arc::new(GpioIndicators::new(peripherals.gpio.clone()));
    let records = Arc::new(Collect::default());
    let station = Station::start_with(
        &station_config(),
        peripherals,
        indicators.clone(),
        vec![records.clone() as Arc<dyn RecordSink>],
    )
    .unwrap();
    Running {
        board,
        indicators,
        records,
        station,
    }
}

fn remote_command(command: RemoteCommand, payload: i32) -> CanFrame {
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&command.id().to_le_bytes());
    bytes[4..].copy_from_slice(&payload.to_le_bytes());
    CanFrame::from_bytes(REMOTE_COMMAND_ID, &bytes).unwrap()
}

fn valve_payload(device: u8, state: u8, bar: f32, celsius: f32) -> [u8; 10] {
    let mut out = [0u8; 10];
    out[0] = device;
    out[1] = state;
    out[2..6].copy_from_slice(&bar.to_le_bytes());
    out[6..10].copy_from_slice(&celsius.to_le_bytes());
    out
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn startup_lands_in_idle() {
    let r = start();
    let ctx = r.station.context();
    assert_eq!(ctx.state().unwrap(), MissionState::Idle);
    assert!(ctx.machine().is_running());
    assert!(wait_until(WAIT, || r.indicators.led() == LedPattern::Idle));
    assert_eq!(ctx.fill_valve().state(), ValveState::Closed);
    assert_eq!(ctx.depr_valve().state(), ValveState::Closed);
    r.station.shutdown();
}

#[test]
fn invalid_config_refuses_to_start() {
    let mut config = station_config();
    config.mission.ignition_ms = config.mission.countdown_ms - 1;
    let board = SimulationBoard::new();
    let peripherals = board.peripherals();
    let indicators = Arc::new(GpioIndicators::new(peripherals.gpio.clone()));
    assert!(Station::start_with(&config, peripherals, indicators, Vec::new()).is_err());
}

#[test]
fn submodules_are_polled() {
    let r = start();
    assert!(wait_until(WAIT, || {
        let sent = r.board.can.transmitted();
        Submodule::ALL
            .iter()
            .all(|&sub| sent.contains(&CanCommand::GetStatus(sub).encode()))
    }));
    r.station.shutdown();
}

#[test]
fn relayed_can_commands_drive_the_mission() {
    let r = start();
    let ctx = r.station.context().clone();

    r.board.can.inject(remote_command(RemoteCommand::StateChange, 0));
    assert!(wait_until(WAIT, || ctx.state().unwrap() == MissionState::Fueling));

    r.board.can.inject(remote_command(RemoteCommand::FillOpen, 0));
    r.board.can.inject(remote_command(RemoteCommand::HoldIn, 0));
    assert!(wait_until(WAIT, || ctx.state().unwrap() == MissionState::Hold));
    assert_eq!(ctx.fill_valve().state(), ValveState::Closed);

    r.board.can.inject(remote_command(RemoteCommand::Abort, 0));
    assert!(wait_until(WAIT, || ctx.state().unwrap() == MissionState::Abort));
    assert!(wait_until(WAIT, || r.indicators.led() == LedPattern::Abort));
    r.station.shutdown();
}

#[test]
fn soft_reset_request_is_answered() {
    let r = start();
    let status = CanFrame::from_bytes(
        Submodule::Fill.response_id(response_offset::STATUS),
        &[0x00, 0x00, REQUEST_SOFT_RESET, 0],
    )
    .unwrap();
    r.board.can.inject(status);

    let reset = CanCommand::SoftReset(Submodule::Fill).encode();
    assert!(wait_until(WAIT, || r.board.can.transmitted().contains(&reset)));
    r.station.shutdown();
}

#[test]
fn submodule_data_reaches_telemetry_records() {
    let r = start();
    let mut bytes = [0u8; 8];
    bytes[..4].copy_from_slice(&12.5f32.to_le_bytes());
    bytes[4..].copy_from_slice(&1234i32.to_le_bytes());
    r.board.can.inject(
        CanFrame::from_bytes(
            Submodule::WeightRocket.response_id(response_offset::DATA),
            &bytes,
        )
        .unwrap(),
    );

    let ctx = r.station.context().clone();
    assert!(wait_until(WAIT, || {
        ctx.store()
            .snapshot()
            .map(|data| data.weight_rocket.data.raw == 1234)
            .unwrap_or(false)
    }));
    let idle = format!("{};", MissionState::Idle.id());
    assert!(wait_until(WAIT, || {
        r.records.0.lock().iter().any(|line| line.starts_with(&idle))
    }));
    r.station.shutdown();
}

#[test]
fn radio_frames_are_addressed() {
    let r = start();
    let frame = |sys_dev_id: u32, command: RemoteCommand| {
        LinkCommand {
            lora_dev_id: 1,
            sys_dev_id,
            command: command.id(),
            payload: 0,
        }
        .encode()
        .unwrap()
    };

    assert_eq!(
        r.station
            .on_link_frame(&frame(0x07, RemoteCommand::StateChange))
            .unwrap(),
        ParseOutcome::NotAddressed
    );
    assert_eq!(r.station.context().state().unwrap(), MissionState::Idle);

    assert_eq!(
        r.station
            .on_link_frame(&frame(OWN_ID, RemoteCommand::StateChange))
            .unwrap(),
        ParseOutcome::Accepted(RemoteCommand::StateChange)
    );
    assert_eq!(r.station.context().state().unwrap(), MissionState::Fueling);
    assert!(r.station.on_link_frame(b"TANWA:short").is_err());
    r.station.shutdown();
}

#[test]
fn valve_module_payloads_update_store() {
    let r = start();
    r.station
        .on_valve_payload(&valve_payload(1, 1, 31.5, 18.0))
        .unwrap();
    r.station
        .on_valve_payload(&valve_payload(2, 0, 1.0, 17.5))
        .unwrap();
    assert!(r.station.on_valve_payload(&valve_payload(3, 0, 0.0, 0.0)).is_err());
    assert!(r.station.on_valve_payload(&[1, 0, 0]).is_err());

    let link = r.station.context().store().snapshot().unwrap().link;
    assert_eq!(link.main_valve.valve_state, ValveState::Open);
    assert_eq!(link.main_valve.pressure_bar, 31.5);
    assert_eq!(link.vent_valve.valve_state, ValveState::Closed);
    assert_eq!(link.vent_valve.temperature_c, 17.5);
    r.station.shutdown();
}

#[test]
fn shutdown_stops_every_task() {
    let r = start();
    let ctx = r.station.context().clone();
    r.station.shutdown();
    assert!(!ctx.machine().is_running());
    assert!(!ctx.ignition_timers().is_active());

    let sent = r.board.can.take_transmitted().len();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(r.board.can.transmitted().len(), 0, "{sent} frames before stop");
}
