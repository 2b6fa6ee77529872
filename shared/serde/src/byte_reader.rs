use crate::error::SerdeErr;

/// Reads positional values from a borrowed byte buffer
pub struct ByteReader<'b> {
    buffer: &'b [u8],
    cursor: usize,
}

impl<'b> ByteReader<'b> {
    pub fn new(buffer: &'b [u8]) -> Self {
        Self { buffer, cursor: 0 }
    }

    pub fn read_byte(&mut self) -> Result<u8, SerdeErr> {
        let Some(byte) = self.buffer.get(self.cursor) else {
            return Err(SerdeErr);
        };
        self.cursor += 1;
        Ok(*byte)
    }

    pub fn read_bytes(&mut self, length: usize) -> Result<&'b [u8], SerdeErr> {
        let end = self.cursor.checked_add(length).ok_or(SerdeErr)?;
        if end > self.buffer.len() {
            return Err(SerdeErr);
        }
        let bytes = &self.buffer[self.cursor..end];
        self.cursor = end;
        Ok(bytes)
    }

    /// Consumes and returns everything after the cursor
    pub fn read_remaining(&mut self) -> &'b [u8] {
        let bytes = &self.buffer[self.cursor..];
        self.cursor = self.buffer.len();
        bytes
    }

    pub fn bytes_remaining(&self) -> usize {
        self.buffer.len() - self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.buffer.len()
    }

    pub fn to_owned(&self) -> OwnedByteReader {
        OwnedByteReader {
            buffer: self.buffer.into(),
            cursor: self.cursor,
        }
    }
}

/// Owns its buffer, so a partially read packet can be stored and resumed later
pub struct OwnedByteReader {
    buffer: Box<[u8]>,
    cursor: usize,
}

impl OwnedByteReader {
    pub fn new(buffer: &[u8]) -> Self {
        Self {
            buffer: buffer.into(),
            cursor: 0,
        }
    }

    pub fn borrow(&self) -> ByteReader {
        ByteReader {
            buffer: &self.buffer,
            cursor: self.cursor,
        }
    }

    pub fn take_buffer(self) -> Box<[u8]> {
        self.buffer
    }
}
