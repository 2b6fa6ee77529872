use thiserror::Error;

use crate::{messages::net_op::NetOp, types::HostType};

/// Errors that can occur while decoding an incoming message
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// Packet carried no opcode at all
    #[error("Received an empty packet. Every message must start with an opcode byte")]
    Empty,

    /// Opcode byte is not part of the protocol
    #[error("Unknown opcode 0x{opcode:02X}. The message was dropped")]
    UnknownOpcode { opcode: u8 },

    /// Payload did not match the layout of its opcode
    #[error("Malformed or truncated payload for {opcode}")]
    Malformed { opcode: NetOp },

    /// Payload decoded but bytes were left over
    #[error("{count} unexpected trailing bytes after {opcode} payload")]
    TrailingBytes { opcode: NetOp, count: usize },

    /// Opcode is never sent by this kind of host
    #[error("{opcode} is not accepted from a {sender:?}")]
    WrongDirection { opcode: NetOp, sender: HostType },
}
