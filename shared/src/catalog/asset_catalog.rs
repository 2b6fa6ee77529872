use std::collections::HashMap;

use crate::{
    catalog::string_dictionary::StringDictionary,
    types::{AssetId, Platform},
};

/// Path the raw asset blob is served on
pub const ASSETS_ENDPOINT: &str = "/assets";
/// Path the serialized string dictionary is served on
pub const STRINGS_ENDPOINT: &str = "/strings";

/// Everything a client must hold before it can resolve replicated entities:
/// the prototype names and, per platform, the packed asset blob.
#[derive(Clone, Debug, Default)]
pub struct AssetCatalog {
    strings: StringDictionary,
    blobs: HashMap<Platform, Vec<u8>>,
}

impl AssetCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(strings: StringDictionary, blobs: HashMap<Platform, Vec<u8>>) -> Self {
        Self { strings, blobs }
    }

    pub fn register_asset(&mut self, name: &str) -> AssetId {
        AssetId::new(self.strings.register(name))
    }

    pub fn asset_id(&self, name: &str) -> AssetId {
        AssetId::new(self.strings.id(name))
    }

    pub fn asset_name(&self, asset_id: AssetId) -> &str {
        self.strings.name(asset_id.value())
    }

    pub fn strings(&self) -> &StringDictionary {
        &self.strings
    }

    pub fn set_blob(&mut self, platform: Platform, blob: Vec<u8>) {
        self.blobs.insert(platform, blob);
    }

    pub fn blob(&self, platform: Platform) -> Option<&[u8]> {
        self.blobs.get(&platform).map(Vec::as_slice)
    }

    /// Size announced in `AssetsStart`; 0 when there is nothing to send
    pub fn blob_size(&self, platform: Platform) -> u32 {
        self.blob(platform).map_or(0, |blob| blob.len() as u32)
    }

    pub fn endpoints() -> Vec<String> {
        vec![ASSETS_ENDPOINT.to_string(), STRINGS_ENDPOINT.to_string()]
    }

    /// Bytes an out-of-band download of `path` would return
    pub fn endpoint_bytes(&self, path: &str, platform: Platform) -> Option<Vec<u8>> {
        match path {
            ASSETS_ENDPOINT => self.blob(platform).map(<[u8]>::to_vec),
            STRINGS_ENDPOINT => Some(self.strings.to_bytes()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_size_is_zero_without_blob() {
        let mut catalog = AssetCatalog::new();
        catalog.set_blob(Platform::LINUX, vec![0; 300]);

        assert_eq!(catalog.blob_size(Platform::LINUX), 300);
        assert_eq!(catalog.blob_size(Platform::WINDOWS), 0);
    }

    #[test]
    fn endpoints_serve_catalog_bytes() {
        let mut catalog = AssetCatalog::new();
        catalog.register_asset("Alien");
        catalog.set_blob(Platform::MACOS, vec![1, 2, 3]);

        assert_eq!(
            catalog.endpoint_bytes(ASSETS_ENDPOINT, Platform::MACOS),
            Some(vec![1, 2, 3])
        );
        assert_eq!(
            catalog.endpoint_bytes(STRINGS_ENDPOINT, Platform::MACOS),
            Some(catalog.strings().to_bytes())
        );
        assert_eq!(catalog.endpoint_bytes("/other", Platform::MACOS), None);
    }
}
