use crate::{
    byte_reader::ByteReader,
    byte_writer::ByteWrite,
    error::SerdeErr,
    integer::UnsignedVariableInteger,
    serde::{ConstByteLength, Serde},
};

// Numbers are little-endian and fixed width

macro_rules! impl_serde_number {
    ($($ty:ty),*) => {
        $(
            impl Serde for $ty {
                fn ser(&self, writer: &mut dyn ByteWrite) {
                    writer.write_bytes(&self.to_le_bytes());
                }

                fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
                    const LENGTH: usize = std::mem::size_of::<$ty>();
                    let bytes = reader.read_bytes(LENGTH)?;
                    let mut array = [0u8; LENGTH];
                    array.copy_from_slice(bytes);
                    Ok(<$ty>::from_le_bytes(array))
                }

                fn byte_length(&self) -> u32 {
                    <$ty as ConstByteLength>::const_byte_length()
                }
            }

            impl ConstByteLength for $ty {
                fn const_byte_length() -> u32 {
                    std::mem::size_of::<$ty>() as u32
                }
            }
        )*
    };
}

impl_serde_number!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

// Booleans

impl Serde for bool {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        writer.write_byte(u8::from(*self));
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        match reader.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(SerdeErr),
        }
    }

    fn byte_length(&self) -> u32 {
        1
    }
}

impl ConstByteLength for bool {
    fn const_byte_length() -> u32 {
        1
    }
}

// Strings are UTF-8, prefixed with their byte length

impl Serde for String {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::from(self.len()).ser(writer);
        writer.write_bytes(self.as_bytes());
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = UnsignedVariableInteger::de(reader)?.to_usize()?;
        let bytes = reader.read_bytes(length)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| SerdeErr)
    }

    fn byte_length(&self) -> u32 {
        UnsignedVariableInteger::from(self.len()).byte_length() + self.len() as u32
    }
}

// Sequences are prefixed with their element count.
// For `Vec<u8>` this is a length-prefixed raw byte block.

impl<T: Serde> Serde for Vec<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        UnsignedVariableInteger::from(self.len()).ser(writer);
        for item in self {
            item.ser(writer);
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        let length = UnsignedVariableInteger::de(reader)?.to_usize()?;
        // every element takes at least one byte, so a length past what
        // remains can only come from a malformed packet
        if length > reader.bytes_remaining() {
            return Err(SerdeErr);
        }
        let mut output = Vec::with_capacity(length);
        for _ in 0..length {
            output.push(T::de(reader)?);
        }
        Ok(output)
    }

    fn byte_length(&self) -> u32 {
        let mut output = UnsignedVariableInteger::from(self.len()).byte_length();
        for item in self {
            output += item.byte_length();
        }
        output
    }
}

// Options are a presence flag followed by the value, if any

impl<T: Serde> Serde for Option<T> {
    fn ser(&self, writer: &mut dyn ByteWrite) {
        match self {
            Some(value) => {
                true.ser(writer);
                value.ser(writer);
            }
            None => false.ser(writer),
        }
    }

    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr> {
        if bool::de(reader)? {
            Ok(Some(T::de(reader)?))
        } else {
            Ok(None)
        }
    }

    fn byte_length(&self) -> u32 {
        1 + self.as_ref().map_or(0, |value| value.byte_length())
    }
}
