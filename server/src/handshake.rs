use std::time::{Duration, Instant};

use brisk_shared::{BlobChunk, NetMessage, PacedTransfer, StringEntry};

/// Catalog streams in flight to one client.
///
/// Each stream is started by the client's request and paced at one item
/// per round trip. A repeated request restarts that stream from the top.
pub(crate) struct CatalogUpload {
    strings: Option<PacedTransfer<StringEntry>>,
    blob: Option<PacedTransfer<BlobChunk>>,
}

impl CatalogUpload {
    pub fn new() -> Self {
        Self {
            strings: None,
            blob: None,
        }
    }

    pub fn start_strings(&mut self, transfer: PacedTransfer<StringEntry>) {
        self.strings = Some(transfer);
    }

    pub fn start_blob(&mut self, transfer: PacedTransfer<BlobChunk>) {
        self.blob = Some(transfer);
    }

    pub fn is_active(&self) -> bool {
        self.strings.is_some() || self.blob.is_some()
    }

    /// Messages due at `now`. Finished streams are dropped.
    pub fn poll(&mut self, now: &Instant, interval: Duration) -> Vec<NetMessage> {
        let mut output = Vec::new();

        if let Some(strings) = &mut self.strings {
            strings.set_interval(interval);
            while let Some(StringEntry { index, name }) = strings.poll(now) {
                output.push(NetMessage::StringsData { index, name });
            }
            if strings.is_finished() {
                self.strings = None;
            }
        }

        if let Some(blob) = &mut self.blob {
            blob.set_interval(interval);
            while let Some(BlobChunk { offset, bytes }) = blob.poll(now) {
                output.push(NetMessage::AssetsData { offset, bytes });
            }
            if blob.is_finished() {
                self.blob = None;
            }
        }

        output
    }
}
