//! Command registry keyed by `(Transport, RemoteCommand)`.

use crate::command::handlers::{CommandHandler, handler_for};
use std::collections::HashMap;
use tanwa_common::mission::command::{RemoteCommand, Transport};
use tracing::debug;

/// Commands the rocket may relay over CAN.
pub const CAN_COMMANDS: [RemoteCommand; 4] = [
    RemoteCommand::StateChange,
    RemoteCommand::Abort,
    RemoteCommand::HoldIn,
    RemoteCommand::HoldOut,
];

pub struct CommandRegistry {
    handlers: HashMap<(Transport, RemoteCommand), CommandHandler>,
}

impl CommandRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Every command over radio, [`CAN_COMMANDS`] over CAN.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for command in RemoteCommand::ALL {
            registry.register(Transport::Radio, command, handler_for(command));
        }
        for command in CAN_COMMANDS {
            registry.register(Transport::Can, command, handler_for(command));
        }
        registry
    }

    /// Register a handler.
    ///
    /// # Panics
    ///
    /// Panics if the pair is already registered.
    pub fn register(
        &mut self,
        transport: Transport,
        command: RemoteCommand,
        handler: CommandHandler,
    ) {
        if self.handlers.contains_key(&(transport, command)) {
            panic!("command {command} already registered for {transport}");
        }
        debug!(%transport, %command, "command registered");
        self.handlers.insert((transport, command), handler);
    }

    pub fn get(&self, transport: Transport, command: RemoteCommand) -> Option<CommandHandler> {
        self.handlers.get(&(transport, command)).copied()
    }

    /// Commands available on `transport`, in id order.
    pub fn commands(&self, transport: Transport) -> Vec<RemoteCommand> {
        let mut commands: Vec<_> = self
            .handlers
            .keys()
            .filter(|(t, _)| *t == transport)
            .map(|(_, c)| *c)
            .collect();
        commands.sort_by_key(|c| c.id());
        commands
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
