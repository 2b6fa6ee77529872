use log::debug;

use crate::catalog::{error::CatalogError, string_dictionary::StringDictionary};

/// Client-side mirror of the server catalog, filled while the
/// `StringsData` and `AssetsData` streams arrive.
///
/// Blob bytes are tracked one by one, so redelivered or overlapping chunks
/// never count twice towards readiness.
/// Largest asset blob a client agrees to mirror
pub const MAX_BLOB_SIZE: u32 = 64 * 1024 * 1024;

#[derive(Debug, Default)]
pub struct CatalogReceiver {
    strings: StringDictionary,
    expected_strings: Option<u32>,
    blob: Vec<u8>,
    blob_length: Option<u32>,
    filled: Vec<bool>,
    blob_received: u32,
}

impl CatalogReceiver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_strings(&mut self, count: u32) {
        self.expected_strings = Some(count);
    }

    pub fn receive_string(&mut self, index: u32, name: &str) -> Result<(), CatalogError> {
        if !self.strings.insert(index, name)? {
            debug!("Ignoring duplicate catalog string {}", index);
        }
        Ok(())
    }

    /// Pre-sizes the blob buffer. A length of 0 means there is no blob to wait for.
    pub fn begin_blob(&mut self, length: u32) -> Result<(), CatalogError> {
        if length > MAX_BLOB_SIZE {
            return Err(CatalogError::BlobTooLarge {
                length,
                max: MAX_BLOB_SIZE,
            });
        }
        self.blob = vec![0; length as usize];
        self.filled = vec![false; length as usize];
        self.blob_length = Some(length);
        self.blob_received = 0;
        Ok(())
    }

    /// Writes the bytes of a chunk that were not filled yet
    pub fn receive_chunk(&mut self, offset: u32, bytes: &[u8]) -> Result<(), CatalogError> {
        let Some(total) = self.blob_length else {
            return Err(CatalogError::BlobNotStarted { offset });
        };
        if bytes.is_empty() {
            return Err(CatalogError::EmptyChunk { offset });
        }
        let length = u32::try_from(bytes.len()).unwrap_or(u32::MAX);
        let end = offset.checked_add(length).filter(|end| *end <= total);
        if end.is_none() {
            return Err(CatalogError::ChunkOutOfBounds {
                offset,
                length,
                total,
            });
        }

        let start = offset as usize;
        let mut fresh = 0;
        for (index, byte) in bytes.iter().enumerate() {
            let position = start + index;
            if !self.filled[position] {
                self.filled[position] = true;
                self.blob[position] = *byte;
                fresh += 1;
            }
        }
        if fresh == 0 {
            debug!("Ignoring duplicate asset chunk at offset {}", offset);
        }
        self.blob_received += fresh;
        Ok(())
    }

    pub fn strings_ready(&self) -> bool {
        self.expected_strings
            .is_some_and(|count| self.strings.len() as u32 >= count)
    }

    pub fn blob_ready(&self) -> bool {
        self.blob_length
            .is_some_and(|length| self.blob_received == length)
    }

    /// True once every announced string and blob byte has arrived
    pub fn is_ready(&self) -> bool {
        self.strings_ready() && self.blob_ready()
    }

    pub fn strings(&self) -> &StringDictionary {
        &self.strings
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }

    pub fn blob_progress(&self) -> (u32, u32) {
        (self.blob_received, self.blob_length.unwrap_or(0))
    }
}
