//! Remote command handling: handlers, the transport registry and the
//! addressing/privilege front door.

pub mod dispatch;
pub mod handlers;
pub mod registry;

pub use dispatch::{Dispatcher, ParseOutcome};
pub use handlers::CommandHandler;
pub use registry::CommandRegistry;
