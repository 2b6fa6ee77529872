use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr, serde::Serde};

// 7 value bits per byte, high bit set while more bytes follow
const CONTINUE_BIT: u8 = 0b1000_0000;
const VALUE_MASK: u8 = 0b0111_1111;
const MAX_BYTES: u32 = 10;

/// An unsigned integer that takes as few bytes as its value needs.
/// Used for length prefixes of strings and byte blocks.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct UnsignedVariableInteger {
    inner: u64,
}

impl UnsignedVariableInteger {
    pub fn new<T: Into<u64>>(value: T) -> Self {
        Self {
            inner: value.into(),
        }
    }

    pub fn get(&self) -> u64 {
        self.inner
    }

    pub fn set<T: Into<u64>>(&mut self, value: T) {
        self.inner = value.into();
    }

    /// Converts to a buffer length, failing on values that cannot index memory
    pub fn to_usize(&self) -> Result<usize, SerdeErr> {
        usize::try_from(self.inner).map_err(|_| SerdeErr)
    }
}

impl Serde for UnsignedVariableInteger {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        let mut value = self.inner;
        loop {
            let byte = (value as u8) & VALUE_MASK;
            value >>= 7;
            if value == 0 {
                writer.write_byte(byte);
                return;
            }
            writer.write_byte(byte | CONTINUE_BIT);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let mut output: u64 = 0;
        for index in 0..MAX_BYTES {
            let byte = reader.read_byte()?;
            let bits = u64::from(byte & VALUE_MASK);
            let shift = index * 7;
            // the tenth byte may only carry the single remaining bit
            if shift == 63 && bits > 1 {
                return Err(SerdeErr);
            }
            output |= bits << shift;
            if byte & CONTINUE_BIT == 0 {
                return Ok(Self { inner: output });
            }
        }
        Err(SerdeErr)
    }

    fn byte_length(&self) -> u32 {
        let mut value = self.inner >> 7;
        let mut output = 1;
        while value != 0 {
            value >>= 7;
            output += 1;
        }
        output
    }
}

impl From<usize> for UnsignedVariableInteger {
    fn from(value: usize) -> Self {
        Self {
            inner: value as u64,
        }
    }
}
