//! Telemetry: shared store, local sensors, record rendering, persistence
//! and the periodic sampler.

pub mod logger;
pub mod record;
pub mod sampler;
pub mod sensors;
pub mod store;

pub use logger::{RecordSink, TelemetryLogger};
pub use record::{RECORD_HEADER, TelemetryRecord};
pub use sampler::{SamplerHandle, TelemetrySampler};
pub use sensors::{LocalSensors, SensorScaling};
pub use store::{TelemetryStore, ValveModule, WeightCell};
