use brisk_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

/// Guarantees a transport gives a single datagram
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryMethod {
    /// May be lost, duplicated or reordered
    Unreliable,
    /// May be lost; late or duplicate samples are dropped on arrival
    UnreliableSequenced,
    /// Always arrives, in any order
    ReliableUnordered,
    /// Always arrives; only the newest is delivered
    ReliableSequenced,
    /// Always arrives, in the order sent
    ReliableOrdered,
}

impl DeliveryMethod {
    pub fn is_reliable(&self) -> bool {
        matches!(
            self,
            DeliveryMethod::ReliableUnordered
                | DeliveryMethod::ReliableSequenced
                | DeliveryMethod::ReliableOrdered
        )
    }

    pub fn is_sequenced(&self) -> bool {
        matches!(
            self,
            DeliveryMethod::UnreliableSequenced | DeliveryMethod::ReliableSequenced
        )
    }
}

/// The two serialization groups every behaviour field belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Reliable,
    Unreliable,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Reliable, Channel::Unreliable];

    pub fn delivery_method(&self) -> DeliveryMethod {
        match self {
            Channel::Reliable => DeliveryMethod::ReliableOrdered,
            Channel::Unreliable => DeliveryMethod::UnreliableSequenced,
        }
    }
}

// written as the "reliable" flag of an EntityUpdate
impl Serde for Channel {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        (*self == Channel::Reliable).ser(writer);
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Channel::Reliable)
        } else {
            Ok(Channel::Unreliable)
        }
    }

    fn byte_length(&self) -> u32 {
        1
    }
}
