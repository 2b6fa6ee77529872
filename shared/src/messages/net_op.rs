use std::fmt;

/// One-byte tag that prefixes every message on the wire.
///
/// `SystemInfo`, `StringsStart` and `AssetsStart` are shared by both
/// directions: the server uses them to announce, the client to request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NetOp {
    SystemInfo = 0x03,
    Ready = 0x04,
    AssetsStart = 0x10,
    AssetsData = 0x11,
    StringsStart = 0x12,
    StringsData = 0x13,
    EntityUpdate = 0x80,
    NewEntity = 0x81,
    DestroyEntity = 0x82,
    InstantiateEntity = 0x85,
    ActionLocal = 0xA0,
    ActionGlobal = 0xA1,
    Action = 0xA2,
}

impl NetOp {
    pub fn from_byte(byte: u8) -> Option<Self> {
        let op = match byte {
            0x03 => NetOp::SystemInfo,
            0x04 => NetOp::Ready,
            0x10 => NetOp::AssetsStart,
            0x11 => NetOp::AssetsData,
            0x12 => NetOp::StringsStart,
            0x13 => NetOp::StringsData,
            0x80 => NetOp::EntityUpdate,
            0x81 => NetOp::NewEntity,
            0x82 => NetOp::DestroyEntity,
            0x85 => NetOp::InstantiateEntity,
            0xA0 => NetOp::ActionLocal,
            0xA1 => NetOp::ActionGlobal,
            0xA2 => NetOp::Action,
            _ => return None,
        };
        Some(op)
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for NetOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}(0x{:02X})", self, self.to_byte())
    }
}
