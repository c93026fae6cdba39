//! Long-range command frame.
//!
//! ```text
//!  "TANWA:" │ lora_dev_id u32 │ sys_dev_id u32 │ command u32 │ payload i32 │ sum
//!   6 bytes │      16-byte little-endian body                               │ 1 byte
//! ```
//!
//! The checksum is the sum of the body bytes modulo 256.

use crate::error::ProtocolError;
use heapless::Vec;
use tanwa_common::consts::MAX_LINK_FRAME_LEN;

pub const FRAME_PREFIX: &[u8; 6] = b"TANWA:";
pub const BODY_LEN: usize = 16;
pub const FRAME_LEN: usize = FRAME_PREFIX.len() + BODY_LEN + 1;

static_assertions::const_assert!(FRAME_LEN <= MAX_LINK_FRAME_LEN);

/// Encoded frame buffer.
pub type FrameBuf = Vec<u8, MAX_LINK_FRAME_LEN>;

/// Operator command as carried on the long-range link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkCommand {
    /// Radio-level address, not used for dispatch.
    pub lora_dev_id: u32,
    /// Logical device id, privilege bit included.
    pub sys_dev_id: u32,
    pub command: u32,
    pub payload: i32,
}

fn checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

impl LinkCommand {
    pub fn encode(&self) -> Result<FrameBuf, ProtocolError> {
        let mut body = [0u8; BODY_LEN];
        body[0..4].copy_from_slice(&self.lora_dev_id.to_le_bytes());
        body[4..8].copy_from_slice(&self.sys_dev_id.to_le_bytes());
        body[8..12].copy_from_slice(&self.command.to_le_bytes());
        body[12..16].copy_from_slice(&self.payload.to_le_bytes());

        let mut out = FrameBuf::new();
        out.extend_from_slice(FRAME_PREFIX)
            .map_err(|_| ProtocolError::FrameTooLong(FRAME_LEN))?;
        out.extend_from_slice(&body)
            .map_err(|_| ProtocolError::FrameTooLong(FRAME_LEN))?;
        out.push(checksum(&body))
            .map_err(|_| ProtocolError::FrameTooLong(FRAME_LEN))?;
        Ok(out)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() > MAX_LINK_FRAME_LEN {
            return Err(ProtocolError::FrameTooLong(bytes.len()));
        }
        let rest = bytes
            .strip_prefix(FRAME_PREFIX.as_slice())
            .ok_or(ProtocolError::BadPrefix)?;
        let Some((&actual, body)) = rest.split_last() else {
            return Err(ProtocolError::BadLength(0));
        };
        let body: &[u8; BODY_LEN] = body
            .try_into()
            .map_err(|_| ProtocolError::BadLength(body.len()))?;

        let expected = checksum(body);
        if expected != actual {
            return Err(ProtocolError::BadChecksum { expected, actual });
        }

        let word = |at: usize| [body[at], body[at + 1], body[at + 2], body[at + 3]];
        Ok(Self {
            lora_dev_id: u32::from_le_bytes(word(0)),
            sys_dev_id: u32::from_le_bytes(word(4)),
            command: u32::from_le_bytes(word(8)),
            payload: i32::from_le_bytes(word(12)),
        })
    }
}
