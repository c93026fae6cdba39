//! Radio link codecs: operator command frames and valve module payloads.

pub mod frame;
pub mod valve;

pub use frame::LinkCommand;
pub use valve::ValvePayload;
