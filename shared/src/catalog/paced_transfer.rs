use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::catalog::{asset_catalog::AssetCatalog, string_dictionary::StringDictionary};
use crate::types::Platform;

/// One `StringsData` entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringEntry {
    pub index: u32,
    pub name: String,
}

/// One `AssetsData` chunk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlobChunk {
    pub offset: u32,
    pub bytes: Vec<u8>,
}

/// A finite sequence handed out at most one item per interval.
///
/// The sequence only moves forward. A transfer that was interrupted is
/// replaced by a new one that starts from the first item.
pub struct PacedTransfer<T> {
    items: VecDeque<T>,
    total: usize,
    interval: Duration,
    last_emit: Option<Instant>,
}

impl<T> PacedTransfer<T> {
    pub fn new(items: Vec<T>, interval: Duration) -> Self {
        Self {
            total: items.len(),
            items: items.into(),
            interval,
            last_emit: None,
        }
    }

    /// Next item, if one is due at `now`.
    /// With a zero interval every call yields an item until the sequence ends.
    pub fn poll(&mut self, now: &Instant) -> Option<T> {
        if let Some(last_emit) = self.last_emit {
            if now.saturating_duration_since(last_emit) < self.interval {
                return None;
            }
        }
        let item = self.items.pop_front()?;
        self.last_emit = Some(*now);
        Some(item)
    }

    /// Follows a changing round-trip estimate
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_finished(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

impl PacedTransfer<StringEntry> {
    /// Every `(id, name)` pair of the dictionary, in id order
    pub fn strings(dictionary: &StringDictionary, interval: Duration) -> Self {
        let items = dictionary
            .iter()
            .map(|(index, name)| StringEntry {
                index,
                name: name.to_string(),
            })
            .collect();
        Self::new(items, interval)
    }
}

impl PacedTransfer<BlobChunk> {
    /// The platform blob split into chunks of at most `max_chunk_size` bytes.
    /// Empty when the catalog has no blob for `platform`.
    pub fn blob(
        catalog: &AssetCatalog,
        platform: Platform,
        max_chunk_size: usize,
        interval: Duration,
    ) -> Self {
        let chunk_size = max_chunk_size.max(1);
        let items = catalog
            .blob(platform)
            .unwrap_or_default()
            .chunks(chunk_size)
            .enumerate()
            .map(|(index, bytes)| BlobChunk {
                offset: (index * chunk_size) as u32,
                bytes: bytes.to_vec(),
            })
            .collect();
        Self::new(items, interval)
    }
}
