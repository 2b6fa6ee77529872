use std::collections::{BTreeMap, HashMap};

use brisk_serde::{ByteReader, ByteWriter, Serde};

use crate::catalog::error::CatalogError;

/// Stable two-way mapping between names and 1-based ids.
/// Id 0 and the empty string both mean "absent".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringDictionary {
    names: BTreeMap<u32, String>,
    ids: HashMap<String, u32>,
    next_id: u32,
}

impl StringDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id of `name`, assigning the next free one if it is new
    pub fn register(&mut self, name: &str) -> u32 {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.names.insert(id, name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Stores a mapping decided elsewhere, as a mirror does while receiving.
    /// Returns false when the exact mapping was already present.
    pub fn insert(&mut self, id: u32, name: &str) -> Result<bool, CatalogError> {
        if id == 0 {
            return Err(CatalogError::ReservedId {
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.names.get(&id) {
            if existing == name {
                return Ok(false);
            }
            return Err(CatalogError::IdConflict {
                id,
                existing: existing.clone(),
                name: name.to_string(),
            });
        }
        if let Some(existing) = self.ids.get(name) {
            return Err(CatalogError::NameConflict {
                name: name.to_string(),
                existing: *existing,
                id,
            });
        }

        self.names.insert(id, name.to_string());
        self.ids.insert(name.to_string(), id);
        self.next_id = self.next_id.max(id);
        Ok(true)
    }

    /// Name for `id`, or "" when there is none
    pub fn name(&self, id: u32) -> &str {
        self.names.get(&id).map_or("", String::as_str)
    }

    /// Id for `name`, or 0 when there is none
    pub fn id(&self, name: &str) -> u32 {
        self.ids.get(name).copied().unwrap_or(0)
    }

    pub fn contains_id(&self, id: u32) -> bool {
        self.names.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Entries in id order
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names.iter().map(|(id, name)| (*id, name.as_str()))
    }

    /// Flat encoding served by the `/strings` endpoint:
    /// a count, then `(id, name)` pairs in id order
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        (self.names.len() as u32).ser(&mut writer);
        for (id, name) in &self.names {
            id.ser(&mut writer);
            name.ser(&mut writer);
        }
        writer.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CatalogError> {
        let mut reader = ByteReader::new(bytes);
        let count = u32::de(&mut reader).map_err(|_| CatalogError::Malformed)?;
        let mut dictionary = Self::new();
        for _ in 0..count {
            let id = u32::de(&mut reader).map_err(|_| CatalogError::Malformed)?;
            let name = String::de(&mut reader).map_err(|_| CatalogError::Malformed)?;
            dictionary.insert(id, &name)?;
        }
        if !reader.is_exhausted() {
            return Err(CatalogError::Malformed);
        }
        Ok(dictionary)
    }
}
