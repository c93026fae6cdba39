//! Station configuration plumbing.
//!
//! A station reads one TOML document. [`SharedConfig`] holds the `[shared]`
//! table every TANWA binary understands; [`ConfigLoader`] turns a file into
//! any deserializable config type.
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use std::path::Path;
//! use tanwa_common::config::{ConfigError, ConfigLoader, SharedConfig};
//!
//! #[derive(Deserialize)]
//! struct PadConfig {
//!     shared: SharedConfig,
//!     pad_number: u8,
//! }
//!
//! fn pad() -> Result<u8, ConfigError> {
//!     let config = PadConfig::load(Path::new("/etc/tanwa/pad.toml"))?;
//!     config.shared.validate()?;
//!     Ok(config.pad_number)
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no such file")]
    NotFound,

    /// Exists but cannot be read (permissions, not UTF-8, ...).
    #[error("unreadable: {0}")]
    Unreadable(String),

    #[error("bad TOML: {0}")]
    Syntax(String),

    /// Parsed, but the values do not make a usable station.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

/// `log_level` values accepted in `[shared]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

/// `[shared]` table.
///
/// ```toml
/// [shared]
/// service_name = "tanwa-pad-01"
/// log_level = "debug"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Names this station in logs and telemetry file headers.
    pub service_name: String,
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name must be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// File and string loading for any `DeserializeOwned` config.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(e) => Err(ConfigError::Unreadable(e.to_string())),
        }
    }

    fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Syntax(e.message().to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize)]
    struct Pad {
        shared: SharedConfig,
        pad_number: u8,
    }

    #[test]
    fn every_level_parses_and_maps() {
        #[derive(Deserialize)]
        struct Level {
            level: LogLevel,
        }

        let cases = [
            ("trace", tracing::Level::TRACE),
            ("debug", tracing::Level::DEBUG),
            ("info", tracing::Level::INFO),
            ("warn", tracing::Level::WARN),
            ("error", tracing::Level::ERROR),
        ];
        for (text, expected) in cases {
            let parsed = Level::from_toml(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(tracing::Level::from(parsed.level), expected);
        }
        assert!(Level::from_toml("level = \"loud\"").is_err());
    }

    #[test]
    fn log_level_is_optional() {
        let pad = Pad::from_toml("pad_number = 2\n[shared]\nservice_name = \"pad\"\n").unwrap();
        assert_eq!(pad.shared.log_level, LogLevel::Info);
        assert_eq!(pad.pad_number, 2);
    }

    #[test]
    fn blank_service_name_is_invalid() {
        for name in ["", "   "] {
            let shared = SharedConfig {
                log_level: LogLevel::Warn,
                service_name: name.to_string(),
            };
            assert!(matches!(
                shared.validate(),
                Err(ConfigError::ValidationError(_))
            ));
        }
    }

    #[test]
    fn load_distinguishes_missing_and_malformed_files() {
        assert_eq!(
            Pad::load(Path::new("/nonexistent/tanwa/pad.toml")).unwrap_err(),
            ConfigError::NotFound
        );

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "pad_number = [").unwrap();
        assert!(matches!(
            Pad::load(file.path()),
            Err(ConfigError::Syntax(_))
        ));
    }

    #[test]
    fn load_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "pad_number = 7\n\n[shared]\nservice_name = \"tanwa-pad-07\"\nlog_level = \"trace\"\n"
        )
        .unwrap();
        file.flush().unwrap();

        let pad = Pad::load(file.path()).unwrap();
        assert_eq!(pad.shared.service_name, "tanwa-pad-07");
        assert_eq!(pad.shared.log_level, LogLevel::Trace);
        assert_eq!(pad.pad_number, 7);
    }
}
