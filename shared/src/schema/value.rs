use brisk_serde::{ByteReader, ByteWrite, Serde, SerdeErr};

use crate::types::Vec3;

/// Every value kind the positional codec can carry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Bool,
    F32,
    Vec3,
    String,
    Bytes,
}

impl ValueKind {
    /// Stable tag used when fingerprinting a protocol
    pub fn tag(&self) -> u8 {
        match self {
            ValueKind::U8 => 1,
            ValueKind::U16 => 2,
            ValueKind::U32 => 3,
            ValueKind::U64 => 4,
            ValueKind::I8 => 5,
            ValueKind::I16 => 6,
            ValueKind::I32 => 7,
            ValueKind::I64 => 8,
            ValueKind::Bool => 9,
            ValueKind::F32 => 10,
            ValueKind::Vec3 => 11,
            ValueKind::String => 12,
            ValueKind::Bytes => 13,
        }
    }

    pub fn default_value(&self) -> Value {
        match self {
            ValueKind::U8 => Value::U8(0),
            ValueKind::U16 => Value::U16(0),
            ValueKind::U32 => Value::U32(0),
            ValueKind::U64 => Value::U64(0),
            ValueKind::I8 => Value::I8(0),
            ValueKind::I16 => Value::I16(0),
            ValueKind::I32 => Value::I32(0),
            ValueKind::I64 => Value::I64(0),
            ValueKind::Bool => Value::Bool(false),
            ValueKind::F32 => Value::F32(0.0),
            ValueKind::Vec3 => Value::Vec3(Vec3::ZERO),
            ValueKind::String => Value::String(String::new()),
            ValueKind::Bytes => Value::Bytes(Vec::new()),
        }
    }
}

/// A typed field value or action argument
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    Bool(bool),
    F32(f32),
    Vec3(Vec3),
    String(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::Bool(_) => ValueKind::Bool,
            Value::F32(_) => ValueKind::F32,
            Value::Vec3(_) => ValueKind::Vec3,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }

    pub fn write(&self, writer: &mut dyn ByteWrite) {
        match self {
            Value::U8(value) => value.ser(writer),
            Value::U16(value) => value.ser(writer),
            Value::U32(value) => value.ser(writer),
            Value::U64(value) => value.ser(writer),
            Value::I8(value) => value.ser(writer),
            Value::I16(value) => value.ser(writer),
            Value::I32(value) => value.ser(writer),
            Value::I64(value) => value.ser(writer),
            Value::Bool(value) => value.ser(writer),
            Value::F32(value) => value.ser(writer),
            Value::Vec3(value) => value.ser(writer),
            Value::String(value) => value.ser(writer),
            Value::Bytes(value) => value.ser(writer),
        }
    }

    pub fn read(kind: ValueKind, reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let value = match kind {
            ValueKind::U8 => Value::U8(u8::de(reader)?),
            ValueKind::U16 => Value::U16(u16::de(reader)?),
            ValueKind::U32 => Value::U32(u32::de(reader)?),
            ValueKind::U64 => Value::U64(u64::de(reader)?),
            ValueKind::I8 => Value::I8(i8::de(reader)?),
            ValueKind::I16 => Value::I16(i16::de(reader)?),
            ValueKind::I32 => Value::I32(i32::de(reader)?),
            ValueKind::I64 => Value::I64(i64::de(reader)?),
            ValueKind::Bool => Value::Bool(bool::de(reader)?),
            ValueKind::F32 => Value::F32(f32::de(reader)?),
            ValueKind::Vec3 => Value::Vec3(Vec3::de(reader)?),
            ValueKind::String => Value::String(String::de(reader)?),
            ValueKind::Bytes => Value::Bytes(Vec::<u8>::de(reader)?),
        };
        Ok(value)
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Value::Vec3(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::U8(value) => Some(i64::from(*value)),
            Value::U16(value) => Some(i64::from(*value)),
            Value::U32(value) => Some(i64::from(*value)),
            Value::I8(value) => Some(i64::from(*value)),
            Value::I16(value) => Some(i64::from(*value)),
            Value::I32(value) => Some(i64::from(*value)),
            Value::I64(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }
}

/// Writes `values` back to back, as an action argument list
pub fn write_values(values: &[Value], writer: &mut dyn ByteWrite) {
    for value in values {
        value.write(writer);
    }
}

/// Reads one value per kind and requires the input to be fully consumed
pub fn read_values(kinds: &[ValueKind], bytes: &[u8]) -> Result<Vec<Value>, SerdeErr> {
    let mut reader = ByteReader::new(bytes);
    let mut values = Vec::with_capacity(kinds.len());
    for kind in kinds {
        values.push(Value::read(*kind, &mut reader)?);
    }
    if !reader.is_exhausted() {
        return Err(SerdeErr);
    }
    Ok(values)
}
