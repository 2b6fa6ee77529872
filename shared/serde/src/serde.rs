use crate::{byte_reader::ByteReader, byte_writer::ByteWrite, error::SerdeErr};

/// A type that can be written to and read back from a positional byte stream
pub trait Serde: Sized + Clone {
    /// Writes the value into the given writer
    fn ser(&self, writer: &mut dyn ByteWrite);

    /// Reads a value of this type from the current position of the reader
    fn de(reader: &mut ByteReader) -> Result<Self, SerdeErr>;

    /// Number of bytes [`Serde::ser`] will produce for this value
    fn byte_length(&self) -> u32;
}

/// Implemented by types whose encoding always has the same length
pub trait ConstByteLength {
    fn const_byte_length() -> u32;
}
