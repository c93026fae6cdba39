//! Inbound command dispatch.
//!
//! ```text
//!  (transport, device id, command, payload)
//!     │ foreign device? ───────────────► NotAddressed
//!     │ unknown id / not on transport /
//!     │ missing privilege / handler error ► Rejected(err)   (NACK upstream)
//!     └ handler ok ────────────────────► Accepted(cmd)     (ACK upstream)
//! ```

use crate::command::registry::CommandRegistry;
use crate::context::MissionContext;
use crate::error::{CommandError, ProtocolError};
use crate::link::LinkCommand;
use std::sync::Arc;
use tanwa_common::mission::command::{Addressing, RemoteCommand, Transport};
use tracing::{debug, info, warn};

/// Result of offering a command to this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Addressed to another device; nothing done.
    NotAddressed,
    /// Executed.
    Accepted(RemoteCommand),
    /// Addressed here but refused.
    Rejected(CommandError),
}

impl ParseOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

pub struct Dispatcher {
    ctx: Arc<MissionContext>,
    registry: CommandRegistry,
    device_id: u32,
}

impl Dispatcher {
    /// Dispatcher answering to `device_id` and the broadcast id.
    pub fn new(ctx: Arc<MissionContext>, registry: CommandRegistry, device_id: u32) -> Self {
        Self {
            ctx,
            registry,
            device_id,
        }
    }

    /// Id this station answers to.
    pub fn device_id(&self) -> u32 {
        self.device_id
    }

    pub fn parse(
        &self,
        transport: Transport,
        device_id: u32,
        command: u32,
        payload: i32,
    ) -> ParseOutcome {
        let addressing = Addressing::classify(self.device_id, device_id);
        if !addressing.is_addressed() {
            debug!(%transport, device_id, command, "command for another device");
            return ParseOutcome::NotAddressed;
        }

        match self.execute(transport, addressing, command, payload) {
            Ok(command) => {
                info!(%transport, %command, payload, "command accepted");
                ParseOutcome::Accepted(command)
            }
            Err(e) => {
                warn!(%transport, command, payload, "command rejected: {e}");
                ParseOutcome::Rejected(e)
            }
        }
    }

    fn execute(
        &self,
        transport: Transport,
        addressing: Addressing,
        command: u32,
        payload: i32,
    ) -> Result<RemoteCommand, CommandError> {
        let command = RemoteCommand::from_u32(command).ok_or(CommandError::UnknownCommand(command))?;
        let handler = self
            .registry
            .get(transport, command)
            .ok_or(CommandError::NotRegistered { transport, command })?;
        if command.requires_sudo() && !addressing.is_sudo() {
            return Err(CommandError::Unprivileged(command));
        }
        handler(&self.ctx, payload)?;
        Ok(command)
    }

    /// Decode a radio frame and dispatch it.
    pub fn handle_link_frame(&self, bytes: &[u8]) -> Result<ParseOutcome, ProtocolError> {
        let frame = LinkCommand::decode(bytes)?;
        Ok(self.parse(
            Transport::Radio,
            frame.sys_dev_id,
            frame.command,
            frame.payload,
        ))
    }

    /// Dispatch a command relayed on the CAN bus. The rocket addresses this
    /// node directly.
    pub fn handle_can_command(&self, command: u32, payload: i32) -> ParseOutcome {
        self.parse(Transport::Can, self.device_id, command, payload)
    }
}
