//! Shared telemetry store.
//!
//! One mutex guards the whole [`TelemetryData`] aggregate. Writers replace
//! a complete sub-record per call; readers get a copy. Lock acquisition is
//! bounded so a stuck writer cannot wedge the sampler or the CAN tasks.

use crate::error::TanwaError;
use parking_lot::Mutex;
use std::time::Instant;
use tanwa_common::consts::STORE_LOCK_TIMEOUT;
use tanwa_common::mission::can::Submodule;
use tanwa_common::mission::telemetry::{
    ActuatorReadings, DisconnectStatus, FillData, FillStatus, LocalReadings, TelemetryData,
    ThermalData, ThermalStatus, ValveModuleReading, WeightCalibration, WeightData, WeightStatus,
};

/// Weight cell selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightCell {
    Rocket,
    Oxidizer,
}

impl WeightCell {
    pub const fn submodule(self) -> Submodule {
        match self {
            Self::Rocket => Submodule::WeightRocket,
            Self::Oxidizer => Submodule::WeightOxidizer,
        }
    }

    pub const fn from_submodule(submodule: Submodule) -> Option<Self> {
        match submodule {
            Submodule::WeightRocket => Some(Self::Rocket),
            Submodule::WeightOxidizer => Some(Self::Oxidizer),
            _ => None,
        }
    }
}

/// Link-side valve module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValveModule {
    Main,
    Vent,
}

#[derive(Default)]
pub struct TelemetryStore {
    data: Mutex<TelemetryData>,
}

impl TelemetryStore {
    /// Empty store; every submodule starts unseen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consistent copy of everything.
    pub fn snapshot(&self) -> Result<TelemetryData, TanwaError> {
        self.data
            .try_lock_for(STORE_LOCK_TIMEOUT)
            .map(|data| *data)
            .ok_or(TanwaError::LockTimeout("telemetry store"))
    }

    fn update(&self, apply: impl FnOnce(&mut TelemetryData)) -> Result<(), TanwaError> {
        let mut data = self
            .data
            .try_lock_for(STORE_LOCK_TIMEOUT)
            .ok_or(TanwaError::LockTimeout("telemetry store"))?;
        apply(&mut data);
        Ok(())
    }

    fn update_submodule(
        &self,
        submodule: Submodule,
        apply: impl FnOnce(&mut TelemetryData),
    ) -> Result<(), TanwaError> {
        self.update(|data| {
            apply(data);
            data.last_seen[submodule as usize] = Some(Instant::now());
        })
    }

    // ─── Board ──────────────────────────────────────────────────────

    pub fn set_local(&self, local: LocalReadings) -> Result<(), TanwaError> {
        self.update(|data| data.local = local)
    }

    pub fn set_actuators(&self, actuators: ActuatorReadings) -> Result<(), TanwaError> {
        self.update(|data| data.actuators = actuators)
    }

    // ─── CAN Submodules ─────────────────────────────────────────────

    pub fn set_weight_status(&self, cell: WeightCell, status: WeightStatus) -> Result<(), TanwaError> {
        self.update_submodule(cell.submodule(), |data| match cell {
            WeightCell::Rocket => data.weight_rocket.status = status,
            WeightCell::Oxidizer => data.weight_oxidizer.status = status,
        })
    }

    pub fn set_weight_data(&self, cell: WeightCell, reading: WeightData) -> Result<(), TanwaError> {
        self.update_submodule(cell.submodule(), |data| match cell {
            WeightCell::Rocket => data.weight_rocket.data = reading,
            WeightCell::Oxidizer => data.weight_oxidizer.data = reading,
        })
    }

    pub fn set_weight_calibration(
        &self,
        cell: WeightCell,
        calibration: WeightCalibration,
    ) -> Result<(), TanwaError> {
        self.update_submodule(cell.submodule(), |data| match cell {
            WeightCell::Rocket => data.weight_rocket.calibration = calibration,
            WeightCell::Oxidizer => data.weight_oxidizer.calibration = calibration,
        })
    }

    pub fn set_fill_status(&self, status: FillStatus) -> Result<(), TanwaError> {
        self.update_submodule(Submodule::Fill, |data| data.fill.status = status)
    }

    pub fn set_fill_data(&self, reading: FillData) -> Result<(), TanwaError> {
        self.update_submodule(Submodule::Fill, |data| data.fill.data = reading)
    }

    pub fn set_thermal_status(&self, status: ThermalStatus) -> Result<(), TanwaError> {
        self.update_submodule(Submodule::Thermal, |data| data.thermal.status = status)
    }

    pub fn set_thermal_data(&self, reading: ThermalData) -> Result<(), TanwaError> {
        self.update_submodule(Submodule::Thermal, |data| data.thermal.data = reading)
    }

    pub fn set_disconnect_status(&self, status: DisconnectStatus) -> Result<(), TanwaError> {
        self.update_submodule(Submodule::Disconnect, |data| data.disconnect = status)
    }

    // ─── Link ───────────────────────────────────────────────────────

    pub fn set_valve_module(
        &self,
        module: ValveModule,
        reading: ValveModuleReading,
    ) -> Result<(), TanwaError> {
        self.update(|data| match module {
            ValveModule::Main => data.link.main_valve = reading,
            ValveModule::Vent => data.link.vent_valve = reading,
        })
    }
}
