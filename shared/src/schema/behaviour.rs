use std::sync::Arc;

use brisk_serde::{ByteReader, ByteWrite, SerdeErr};

use crate::{
    messages::delivery::Channel,
    schema::{
        error::SchemaError,
        value::{Value, ValueKind},
    },
    types::Vec3,
};

pub const TRANSFORM_BEHAVIOUR: &str = "Transform";
pub const POSITION_FIELD: &str = "position";
pub const ROTATION_FIELD: &str = "rotation";
pub const SCALE_FIELD: &str = "scale";

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    pub name: String,
    pub channel: Channel,
    pub default: Value,
}

impl FieldSchema {
    pub fn kind(&self) -> ValueKind {
        self.default.kind()
    }
}

/// The synchronized fields of one behaviour, in wire order.
///
/// Each field belongs to exactly one channel. Serializing a channel writes
/// that channel's fields in declaration order and nothing else.
#[derive(Clone, Debug, PartialEq)]
pub struct BehaviourSchema {
    name: String,
    fields: Vec<FieldSchema>,
}

impl BehaviourSchema {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fields: Vec::new(),
        }
    }

    /// Declares a field; its kind is the kind of `default`
    pub fn field(mut self, name: &str, channel: Channel, default: Value) -> Self {
        self.fields.push(FieldSchema {
            name: name.to_string(),
            channel,
            default,
        });
        self
    }

    pub fn reliable(self, name: &str, default: Value) -> Self {
        self.field(name, Channel::Reliable, default)
    }

    pub fn unreliable(self, name: &str, default: Value) -> Self {
        self.field(name, Channel::Unreliable, default)
    }

    /// Position, Euler rotation and scale, all on the unreliable channel
    pub fn transform() -> Self {
        Self::new(TRANSFORM_BEHAVIOUR)
            .unreliable(POSITION_FIELD, Value::Vec3(Vec3::ZERO))
            .unreliable(ROTATION_FIELD, Value::Vec3(Vec3::ZERO))
            .unreliable(SCALE_FIELD, Value::Vec3(Vec3::ONE))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.fields.iter().any(|field| field.channel == channel)
    }

    pub(crate) fn validate(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        for (index, field) in self.fields.iter().enumerate() {
            if field.name.is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if self.fields[..index].iter().any(|other| other.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    behaviour: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Live values of one behaviour on one entity
#[derive(Clone, Debug)]
pub struct BehaviourState {
    schema: Arc<BehaviourSchema>,
    values: Vec<Value>,
}

impl BehaviourState {
    pub fn new(schema: Arc<BehaviourSchema>) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|field| field.default.clone())
            .collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> &BehaviourSchema {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        let index = self.schema.field_index(field)?;
        self.values.get(index)
    }

    pub fn set(&mut self, field: &str, value: Value) -> Result<(), SchemaError> {
        let Some(index) = self.schema.field_index(field) else {
            return Err(SchemaError::UnknownField {
                behaviour: self.schema.name.clone(),
                field: field.to_string(),
            });
        };
        let expected = self.schema.fields[index].kind();
        if value.kind() != expected {
            return Err(SchemaError::KindMismatch {
                field: field.to_string(),
                expected,
                found: value.kind(),
            });
        }
        self.values[index] = value;
        Ok(())
    }

    /// Writes this channel's fields in declaration order
    pub fn write_channel(
        &self,
        channel: Channel,
        writer: &mut dyn ByteWrite,
    ) -> Result<(), SchemaError> {
        for (field, value) in self.schema.fields.iter().zip(&self.values) {
            if field.channel != channel {
                continue;
            }
            if value.kind() != field.kind() {
                return Err(SchemaError::KindMismatch {
                    field: field.name.clone(),
                    expected: field.kind(),
                    found: value.kind(),
                });
            }
            value.write(writer);
        }
        Ok(())
    }

    /// Decodes this channel's fields without applying them
    pub(crate) fn read_channel(
        &self,
        channel: Channel,
        reader: &mut ByteReader,
    ) -> Result<Vec<(usize, Value)>, SerdeErr> {
        let mut output = Vec::new();
        for (index, field) in self.schema.fields.iter().enumerate() {
            if field.channel != channel {
                continue;
            }
            output.push((index, Value::read(field.kind(), reader)?));
        }
        Ok(output)
    }

    pub(crate) fn apply(&mut self, decoded: Vec<(usize, Value)>) {
        for (index, value) in decoded {
            if let Some(slot) = self.values.get_mut(index) {
                *slot = value;
            }
        }
    }
}
