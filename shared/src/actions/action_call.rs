use brisk_serde::{ByteReader, ByteWrite, ByteWriter, Serde, SerdeErr};

use crate::{
    schema::value::{write_values, Value},
    types::EntityId,
};

/// A remote invocation of one action on one behaviour of one entity.
/// `args` holds the encoded argument list; it runs to the end of the message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionCall {
    pub action_id: u32,
    pub entity_id: EntityId,
    pub behaviour_index: u8,
    pub args: Vec<u8>,
}

impl ActionCall {
    pub fn new(action_id: u32, entity_id: EntityId, behaviour_index: u8, args: &[Value]) -> Self {
        let mut writer = ByteWriter::new();
        write_values(args, &mut writer);
        Self {
            action_id,
            entity_id,
            behaviour_index,
            args: writer.to_bytes(),
        }
    }

    pub(crate) fn write(&self, writer: &mut dyn ByteWrite) {
        self.action_id.ser(writer);
        self.entity_id.ser(writer);
        self.behaviour_index.ser(writer);
        writer.write_bytes(&self.args);
    }

    pub(crate) fn read(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        Ok(Self {
            action_id: u32::de(reader)?,
            entity_id: EntityId::de(reader)?,
            behaviour_index: u8::de(reader)?,
            args: reader.read_remaining().to_vec(),
        })
    }
}
