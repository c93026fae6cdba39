//! Control unit configuration.
//!
//! One TOML file, loaded through [`ConfigLoader`] and checked with
//! [`TanwaConfig::validate`] before anything is started.
//!
//! ```toml
//! [shared]
//! service_name = "tanwa-pad-01"
//!
//! [mission]
//! countdown_ms = -30000
//! ignition_ms = -3000
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tanwa_common::config::{ConfigError, ConfigLoader, SharedConfig};
use tanwa_common::mission::command::DEFAULT_DEVICE_ID;

// ─── Sections ───────────────────────────────────────────────────────

/// `[device]`: addressing of this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Logical device id (privilege bit must be clear).
    pub device_id: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
        }
    }
}

/// `[mission]`: countdown schedule and safety timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Countdown start relative to T-zero (negative).
    pub countdown_ms: i64,
    /// Igniter firing relative to T-zero (`countdown_ms < ignition_ms <= 0`).
    pub ignition_ms: i64,
    /// Engine burn time from FIRE to AFTER_BURNOUT.
    pub burn_time_ms: u64,
    /// Time allowed in RDY_TO_LAUNCH before the quick-disconnect is pulled
    /// and the mission aborted.
    pub disconnect_timeout_ms: u64,
    /// Disconnect motor run time sent with the DISCONNECT command.
    pub disconnect_run_ms: u32,
    /// Mission timer value while disabled.
    pub mission_timer_disabled: i64,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            countdown_ms: -30_000,
            ignition_ms: -3_000,
            burn_time_ms: 8_000,
            disconnect_timeout_ms: 600_000,
            disconnect_run_ms: 5_000,
            mission_timer_disabled: i64::MIN,
        }
    }
}

/// `[can]`: bus tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanConfig {
    /// Period of the status/data poll.
    pub poll_period_ms: u64,
    /// RX wait while the bus is quiet.
    pub rx_wait_ms: u64,
    /// RX wait right after a successful transmit.
    pub rx_wait_boost_ms: u64,
    /// Per-frame transmit timeout.
    pub tx_timeout_ms: u64,
    /// Egress queue capacity.
    pub tx_queue_len: usize,
    /// Submodule considered disconnected after this long without a frame.
    pub stale_after_ms: u64,
}

impl Default for CanConfig {
    fn default() -> Self {
        Self {
            poll_period_ms: 500,
            rx_wait_ms: 100,
            rx_wait_boost_ms: 10,
            tx_timeout_ms: 50,
            tx_queue_len: 32,
            stale_after_ms: 2_000,
        }
    }
}

/// `[telemetry]`: sampling and persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub sample_period_ms: u64,
    /// Logger queue capacity in records.
    pub queue_len: usize,
    pub log_dir: PathBuf,
    /// Records go to `<log_dir>/<file_prefix><N>.txt`.
    pub file_prefix: String,
    /// Attempts to open the log directory before giving up.
    pub mount_retries: u32,
    pub mount_retry_delay_ms: u64,
    /// Battery divider ratio (battery volts per ADC volt).
    pub battery_divider: f32,
    /// Pressure transducer scale and offset: `bar = mv * scale + offset`.
    pub pressure_scale_bar_per_mv: f32,
    pub pressure_offset_bar: f32,
    /// Continuity sense voltage above which an igniter is connected.
    pub continuity_threshold_mv: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 100,
            queue_len: 64,
            log_dir: PathBuf::from("/var/lib/tanwa"),
            file_prefix: "tanwa_".to_string(),
            mount_retries: 5,
            mount_retry_delay_ms: 200,
            battery_divider: 4.0,
            pressure_scale_bar_per_mv: 0.025,
            pressure_offset_bar: -12.5,
            continuity_threshold_mv: 1_000,
        }
    }
}

/// `[valves]`: servo pulse widths.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValvesConfig {
    pub servo_open_us: u16,
    pub servo_close_us: u16,
}

impl Default for ValvesConfig {
    fn default() -> Self {
        Self {
            servo_open_us: 2_000,
            servo_close_us: 1_000,
        }
    }
}

/// `[tasks]`: thread placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TasksConfig {
    /// CPU core of the state machine thread (honoured with the `rt` feature).
    pub state_machine_core: Option<usize>,
}

/// Longest accepted timer period or countdown lead: one day.
pub const MAX_PERIOD_MS: i64 = 24 * 60 * 60 * 1_000;

// ─── Root ───────────────────────────────────────────────────────────

/// Complete control unit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TanwaConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub mission: MissionConfig,
    #[serde(default)]
    pub can: CanConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub valves: ValvesConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

impl TanwaConfig {
    /// Defaults with the given service name.
    pub fn with_service_name(name: &str) -> Self {
        Self {
            shared: SharedConfig {
                log_level: Default::default(),
                service_name: name.to_string(),
            },
            device: DeviceConfig::default(),
            mission: MissionConfig::default(),
            can: CanConfig::default(),
            telemetry: TelemetryConfig::default(),
            valves: ValvesConfig::default(),
            tasks: TasksConfig::default(),
        }
    }

    /// Load and validate a configuration file.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let fail = |msg: String| Err(ConfigError::ValidationError(msg));

        if self.device.device_id & tanwa_common::mission::command::SUDO_BIT != 0 {
            return fail(format!(
                "device_id {:#04x} must not carry the privilege bit",
                self.device.device_id
            ));
        }
        if self.device.device_id == tanwa_common::mission::command::BROADCAST_ID {
            return fail("device_id must not be the broadcast id".to_string());
        }

        let m = &self.mission;
        if !(m.countdown_ms < m.ignition_ms && m.ignition_ms <= 0) {
            return fail(format!(
                "countdown_ms ({}) < ignition_ms ({}) <= 0 violated",
                m.countdown_ms, m.ignition_ms
            ));
        }
        if m.countdown_ms < -MAX_PERIOD_MS {
            return fail(format!(
                "mission.countdown_ms ({}) must not precede T-zero by more than {MAX_PERIOD_MS} ms",
                m.countdown_ms
            ));
        }
        for (name, value) in [
            ("mission.burn_time_ms", m.burn_time_ms),
            ("mission.disconnect_timeout_ms", m.disconnect_timeout_ms),
            ("can.poll_period_ms", self.can.poll_period_ms),
            ("can.rx_wait_ms", self.can.rx_wait_ms),
            ("can.rx_wait_boost_ms", self.can.rx_wait_boost_ms),
            ("telemetry.sample_period_ms", self.telemetry.sample_period_ms),
        ] {
            if value == 0 {
                return fail(format!("{name} must be positive"));
            }
            if value > MAX_PERIOD_MS as u64 {
                return fail(format!("{name} must not exceed {MAX_PERIOD_MS} ms"));
            }
        }
        if self.can.rx_wait_boost_ms > self.can.rx_wait_ms {
            return fail("can.rx_wait_boost_ms must not exceed can.rx_wait_ms".to_string());
        }
        if self.can.tx_queue_len == 0 || self.telemetry.queue_len == 0 {
            return fail("queue lengths must be positive".to_string());
        }
        if self.valves.servo_open_us == self.valves.servo_close_us {
            return fail("servo open and close pulses must differ".to_string());
        }
        if self.telemetry.file_prefix.is_empty() {
            return fail("telemetry.file_prefix cannot be empty".to_string());
        }
        Ok(())
    }

    /// `mission.burn_time_ms` as a duration.
    pub fn burn_time(&self) -> Duration {
        Duration::from_millis(self.mission.burn_time_ms)
    }

    pub fn disconnect_timeout(&self) -> Duration {
        Duration::from_millis(self.mission.disconnect_timeout_ms)
    }
}
