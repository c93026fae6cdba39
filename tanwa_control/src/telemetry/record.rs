//! Persisted telemetry line.
//!
//! One semicolon-delimited line per sample, fields in the order of
//! [`RECORD_HEADER`]. Floats use fixed precision so lines diff cleanly.

use std::fmt::{self, Display, Write};
use tanwa_common::mission::can::Submodule;
use tanwa_common::mission::state::MissionState;
use tanwa_common::mission::telemetry::{
    SubmoduleLinks, TelemetryData, ValveModuleReading, WeightRecord,
};

/// Column names, in record order.
pub const RECORD_HEADER: &str = "state;battery_v;\
fill_valve;depr_valve;fuel_valve;oxidizer_valve;\
pressure_1;pressure_2;pressure_3;pressure_4;temperature_1;temperature_2;\
igniter_1_continuity;igniter_2_continuity;igniter_1_state;igniter_2_state;\
link_weight_rocket;link_weight_oxidizer;link_fill;link_thermal;link_disconnect;\
wr_status;wr_request;wr_tared;wr_weight_kg;wr_raw;wr_cal_factor;wr_offset;\
wo_status;wo_request;wo_tared;wo_weight_kg;wo_raw;wo_cal_factor;wo_offset;\
fill_status;fill_request;fill_level_flags;fill_line_bar;fill_tank_bar;\
thermal_status;thermal_request;thermal_heating;thermal_tank_c;thermal_heater_c;\
disconnect_status;disconnect_request;disconnect_motor;disconnect_limits;\
main_valve_state;main_valve_bar;main_valve_c;vent_valve_state;vent_valve_bar;vent_valve_c;\
mission_time_ms";

/// One sample ready to render.
#[derive(Debug, Clone, Copy)]
pub struct TelemetryRecord<'a> {
    pub state: MissionState,
    pub mission_time_ms: i64,
    pub links: SubmoduleLinks,
    pub data: &'a TelemetryData,
}

/// Writes `;` between fields.
struct Fields<'a, 'b> {
    out: &'a mut fmt::Formatter<'b>,
    first: bool,
}

impl Fields<'_, '_> {
    fn push(&mut self, value: impl Display) -> fmt::Result {
        if !self.first {
            self.out.write_char(';')?;
        }
        self.first = false;
        write!(self.out, "{value}")
    }

    fn float(&mut self, value: f32) -> fmt::Result {
        self.push(format_args!("{value:.3}"))
    }

    fn flag(&mut self, value: bool) -> fmt::Result {
        self.push(u8::from(value))
    }

    fn weight(&mut self, cell: &WeightRecord) -> fmt::Result {
        self.push(cell.status.status)?;
        self.push(cell.status.request)?;
        self.flag(cell.status.tared)?;
        self.float(cell.data.weight_kg)?;
        self.push(cell.data.raw)?;
        self.float(cell.calibration.cal_factor)?;
        self.float(cell.calibration.offset)
    }

    fn valve_module(&mut self, reading: &ValveModuleReading) -> fmt::Result {
        self.push(reading.valve_state.as_u8())?;
        self.float(reading.pressure_bar)?;
        self.float(reading.temperature_c)
    }
}

impl Display for TelemetryRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.data;
        let mut w = Fields { out: f, first: true };

        w.push(self.state.id())?;
        w.float(d.local.battery_v)?;

        w.push(d.actuators.fill_valve.as_u8())?;
        w.push(d.actuators.depr_valve.as_u8())?;
        w.push(d.actuators.fuel_valve.as_u8())?;
        w.push(d.actuators.oxidizer_valve.as_u8())?;

        for p in d.local.pressures_bar {
            w.float(p)?;
        }
        for t in d.local.temperatures_c {
            w.float(t)?;
        }
        for c in d.local.igniter_continuity {
            w.flag(c)?;
        }
        for s in d.actuators.igniters {
            w.push(s as u8)?;
        }

        for sub in Submodule::ALL {
            w.flag(self.links.contains(SubmoduleLinks::of(sub)))?;
        }

        w.weight(&d.weight_rocket)?;
        w.weight(&d.weight_oxidizer)?;

        w.push(d.fill.status.status)?;
        w.push(d.fill.status.request)?;
        w.push(d.fill.status.level_flags)?;
        w.float(d.fill.data.line_pressure_bar)?;
        w.float(d.fill.data.tank_pressure_bar)?;

        w.push(d.thermal.status.status)?;
        w.push(d.thermal.status.request)?;
        w.flag(d.thermal.status.heating)?;
        w.float(d.thermal.data.tank_temperature_c)?;
        w.float(d.thermal.data.heater_temperature_c)?;

        w.push(d.disconnect.status)?;
        w.push(d.disconnect.request)?;
        w.push(d.disconnect.motor_state)?;
        w.push(d.disconnect.limit_switches)?;

        w.valve_module(&d.link.main_valve)?;
        w.valve_module(&d.link.vent_valve)?;

        w.push(self.mission_time_ms)
    }
}

impl TelemetryRecord<'_> {
    /// Rendered line without terminator.
    pub fn render(&self) -> String {
        self.to_string()
    }
}
